use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::backend::QueueBackend;
use crate::{Job, JobId, JobStatus, QueueError, QueueResult, Topic};

/// Relational backend. Claim and ack both run inside a transaction that
/// locks the candidate row with `SELECT ... FOR UPDATE`, so two consumers
/// racing the same job serialize on the database rather than in process
/// memory the way `MemoryBackend` does.
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn connect(dsn: &str) -> QueueResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(dsn)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `topics` and `jobs` tables if they do not already exist.
    pub async fn migrate(&self) -> QueueResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                name        TEXT PRIMARY KEY,
                description TEXT,
                created_at  TIMESTAMPTZ NOT NULL,
                updated_at  TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id           BIGSERIAL PRIMARY KEY,
                topic        TEXT NOT NULL REFERENCES topics(name),
                payload      BYTEA NOT NULL,
                priority     INTEGER NOT NULL,
                status       TEXT NOT NULL,
                claimed_at   TIMESTAMPTZ,
                claimed_by   TEXT,
                completed_at TIMESTAMPTZ,
                created_at   TIMESTAMPTZ NOT NULL,
                updated_at   TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS jobs_topic_status_idx ON jobs (topic, status, priority DESC, updated_at ASC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn status_from_str(s: &str) -> QueueResult<JobStatus> {
    match s {
        "pending" => Ok(JobStatus::Pending),
        "claimed" => Ok(JobStatus::Claimed),
        "completed" => Ok(JobStatus::Completed),
        other => Err(QueueError::General(format!("unknown job status: {other}"))),
    }
}

fn job_from_row(row: &sqlx::postgres::PgRow) -> QueueResult<Job> {
    let status: String = row.try_get("status")?;
    Ok(Job {
        id: JobId(row.try_get("id")?),
        topic: row.try_get("topic")?,
        payload: row.try_get("payload")?,
        priority: row.try_get("priority")?,
        status: status_from_str(&status)?,
        claimed_at: row.try_get("claimed_at")?,
        claimed_by: row.try_get("claimed_by")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl QueueBackend for PostgresBackend {
    async fn register_topic(&self, name: &str, description: Option<String>) -> QueueResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO topics (name, description, created_at, updated_at) VALUES ($1, $2, $3, $4) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    async fn get_topics(&self) -> QueueResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM topics")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| r.try_get::<String, _>("name"))
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_topic(&self, name: &str) -> QueueResult<Option<Topic>> {
        let row = sqlx::query("SELECT name, description, created_at, updated_at FROM topics WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(Topic {
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            }),
            None => None,
        })
    }

    async fn enqueue(&self, topic: &str, priority: i32, payload: Vec<u8>) -> QueueResult<JobId> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO jobs (topic, payload, priority, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', $4, $4)
            RETURNING id
            "#,
        )
        .bind(topic)
        .bind(payload)
        .bind(priority)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.constraint() == Some("jobs_topic_fkey") => {
                QueueError::UnknownTopic(topic.to_string())
            }
            other => other.into(),
        })?;

        Ok(JobId(row.try_get("id")?))
    }

    async fn dequeue(&self, topic: &str, consumer: &str) -> QueueResult<Option<Job>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, topic, payload, priority, status, claimed_at, claimed_by, completed_at, created_at, updated_at
            FROM jobs
            WHERE topic = $1 AND status = 'pending'
            ORDER BY priority DESC, updated_at ASC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(topic)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await.ok();
            return Ok(None);
        };

        let mut job = job_from_row(&row)?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE jobs SET status = 'claimed', claimed_at = $1, claimed_by = $2, updated_at = $1 WHERE id = $3 AND status = 'pending'",
        )
        .bind(now)
        .bind(consumer)
        .bind(job.id.0)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(QueueError::NotAcquired(job.id.0));
        }

        tx.commit().await?;

        job.status = JobStatus::Claimed;
        job.claimed_at = Some(now);
        job.claimed_by = Some(consumer.to_string());
        job.updated_at = now;

        Ok(Some(job))
    }

    async fn ack(&self, topic: &str, job_id: JobId, consumer: &str) -> QueueResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT status, claimed_by FROM jobs WHERE id = $1 AND topic = $2 FOR UPDATE",
        )
        .bind(job_id.0)
        .bind(topic)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await.ok();
            return Err(QueueError::NotPresent(job_id.0));
        };

        let status = status_from_str(&row.try_get::<String, _>("status")?)?;
        let claimed_by: Option<String> = row.try_get("claimed_by")?;

        match status {
            JobStatus::Completed => {
                tx.rollback().await.ok();
                return Err(QueueError::AlreadyAcked(job_id.0));
            }
            JobStatus::Pending => {
                tx.rollback().await.ok();
                return Err(QueueError::LeaseExceeded(job_id.0));
            }
            JobStatus::Claimed => {}
        }

        if claimed_by.as_deref() != Some(consumer) {
            tx.rollback().await.ok();
            return Err(QueueError::WrongConsumer { job_id: job_id.0 });
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE jobs SET status = 'completed', completed_at = $1, updated_at = $1 WHERE id = $2",
        )
        .bind(now)
        .bind(job_id.0)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(QueueError::General(format!("ack of job {} affected no rows", job_id.0)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn requeue(&self, topic: &str, cutoff: DateTime<Utc>) -> QueueResult<u64> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending', claimed_at = NULL, claimed_by = NULL, updated_at = $1
            WHERE topic = $2 AND status = 'claimed' AND claimed_at < $3
            "#,
        )
        .bind(now)
        .bind(topic)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
