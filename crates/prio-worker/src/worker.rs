use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use prio_coordination::CoordinationClient;
use prio_elector::{Elector, Role, Status};
use prio_queue::{Job, JobId, QueueBackend, QueueEngine, QueueResult};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::WorkerResult;
use crate::paths;

/// Jobs claimed longer than this are eligible for requeue at the next
/// maintenance tick. Hard-coded per the source; see the Open Questions in
/// DESIGN.md for why this stays a constant rather than per-topic config.
pub const LEASE: Duration = Duration::from_secs(10);

/// How often the supervisor loop checks membership-watch fires against the
/// partition document and runs per-topic maintenance.
pub const MAINTENANCE_TICK: Duration = Duration::from_secs(5);

type Assignment = HashMap<String, HashSet<String>>;

/// Process-level coordinator. Holds the queue engine, the coordination
/// client session, and the elector; fronts all three to HTTP callers and
/// to its own maintenance loop. Generic over both seams so tests can run
/// entirely in-process against [`prio_coordination::InMemoryClient`] and
/// [`prio_queue::MemoryBackend`].
pub struct Worker<C: CoordinationClient + 'static, B: QueueBackend + 'static> {
    pub namespace: String,
    pub id: String,
    client: Arc<C>,
    engine: Arc<QueueEngine<B>>,
    elector: Elector<C>,
    role: RwLock<Role>,
    cancel: CancellationToken,
}

impl<C: CoordinationClient + 'static, B: QueueBackend + 'static> Worker<C, B> {
    pub fn new(client: Arc<C>, engine: Arc<QueueEngine<B>>, namespace: impl Into<String>, id: impl Into<String>) -> Arc<Self> {
        let namespace = namespace.into();
        let election_root = paths::election_root(&namespace);
        Arc::new(Self {
            elector: Elector::new(client.clone(), election_root),
            namespace,
            id: id.into(),
            client,
            engine,
            role: RwLock::new(Role::Follower),
            cancel: CancellationToken::new(),
        })
    }

    /// Ensures the namespace skeleton exists, registers this worker's
    /// ephemeral membership node, starts the elector, and spawns the
    /// supervisor loop. Returns its join handle; cancel with [`Self::shutdown`].
    #[instrument(skip(self), fields(namespace = %self.namespace, id = %self.id))]
    pub async fn start(self: &Arc<Self>) -> WorkerResult<JoinHandle<()>> {
        self.client.ensure_persistent(&paths::namespace_root(&self.namespace)).await?;
        self.client.ensure_persistent(&paths::election_root(&self.namespace)).await?;
        self.client.ensure_persistent(&paths::members_root(&self.namespace)).await?;
        self.client.ensure_persistent(&paths::partition_path(&self.namespace)).await?;

        self.client
            .create_ephemeral(&paths::member_path(&self.namespace, &self.id), vec![])
            .await?;

        let (_elect_handle, status_rx) = self.elector.elect(self.id.clone());

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.supervise(status_rx).await;
        });

        Ok(handle)
    }

    /// Signals the supervisor loop and the elector to tear down. The
    /// ephemeral member node disappears when the coordination client's
    /// session closes.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.elector.resign();
    }

    pub async fn is_leader(&self) -> bool {
        *self.role.read().await == Role::Leader
    }

    // ---- API façade, unchanged by role ----

    pub async fn register_topic(&self, name: &str, description: Option<String>) -> QueueResult<()> {
        self.engine.register_topic(name, description).await
    }

    pub async fn enqueue(&self, topic: &str, priority: i32, payload: Vec<u8>) -> QueueResult<JobId> {
        self.engine.enqueue(topic, priority, payload).await
    }

    pub async fn dequeue(&self, topic: &str, consumer: &str) -> QueueResult<Option<Job>> {
        self.engine.dequeue(topic, consumer).await
    }

    pub async fn ack(&self, topic: &str, job_id: JobId, consumer: &str) -> QueueResult<()> {
        self.engine.ack(topic, job_id, consumer).await
    }

    // ---- supervisor loop ----

    async fn supervise(self: Arc<Self>, mut status_rx: prio_elector::StatusReceiver) {
        let mut members_watch: Option<prio_coordination::WatchOnce> = None;
        let mut tick = tokio::time::interval(MAINTENANCE_TICK);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let watch_armed = members_watch.is_some();
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(namespace = %self.namespace, id = %self.id, "supervisor: cancellation received, shutting down");
                    return;
                }

                status = status_rx.recv() => {
                    let Some(status) = status else {
                        warn!("supervisor: elector status channel closed");
                        return;
                    };
                    self.handle_status(status, &mut members_watch).await;
                    if self.cancel.is_cancelled() {
                        return;
                    }
                }

                result = async { members_watch.as_mut().expect("guarded by watch_armed").await }, if watch_armed => {
                    members_watch = None;
                    if result.is_ok() && self.is_leader().await {
                        if let Err(err) = self.rebalance().await {
                            error!(%err, "supervisor: rebalance failed");
                        }
                        members_watch = self.rearm_members_watch().await;
                    }
                }

                _ = tick.tick() => {
                    self.run_maintenance().await;
                }
            }
        }
    }

    async fn handle_status(&self, status: Status, members_watch: &mut Option<prio_coordination::WatchOnce>) {
        if let Some(err) = status.err {
            error!(candidate_id = %status.candidate_id, %err, "supervisor: elector reported a terminal error, exiting process");
            std::process::exit(1);
        }

        let mut role = self.role.write().await;
        let was_leader = *role == Role::Leader;
        *role = status.role;
        drop(role);

        match status.role {
            Role::Leader => {
                info!(namespace = %self.namespace, id = %self.id, "supervisor: elected leader, running leader setup");
                if let Err(err) = self.rebalance().await {
                    error!(%err, "supervisor: initial rebalance failed");
                }
                *members_watch = self.rearm_members_watch().await;
            }
            Role::Follower => {
                if was_leader {
                    info!(namespace = %self.namespace, id = %self.id, "supervisor: demoted to follower, tearing down members watch");
                    *members_watch = None;
                }
            }
        }
    }

    async fn rearm_members_watch(&self) -> Option<prio_coordination::WatchOnce> {
        match self.client.children_watch(&paths::members_root(&self.namespace)).await {
            Ok((_children, watch)) => Some(watch),
            Err(err) => {
                error!(%err, "supervisor: failed to arm members watch");
                None
            }
        }
    }

    /// Leader-only: reads current members and topics, computes the
    /// partition, and overwrites the partition document.
    async fn rebalance(&self) -> WorkerResult<()> {
        let mut members = self.client.children(&paths::members_root(&self.namespace)).await?;
        members.sort();

        let mut topics = self.engine.get_topics().await?;
        topics.sort();

        let assignment: Assignment = prio_partition::partition(&topics, &members);
        info!(members = members.len(), topics = topics.len(), "supervisor: rebalancing partition");

        let data = serde_json::to_vec(&assignment)?;
        self.client.set(&paths::partition_path(&self.namespace), data).await?;
        Ok(())
    }

    /// Reads the partition document and spawns one independent requeue
    /// task per topic assigned to this worker. A missing assignment for
    /// this worker is not an error.
    async fn run_maintenance(self: &Arc<Self>) {
        let data = match self.client.get(&paths::partition_path(&self.namespace)).await {
            Ok(data) => data,
            Err(err) => {
                warn!(%err, "supervisor: partition document unreadable this tick");
                return;
            }
        };

        if data.is_empty() {
            return;
        }

        let assignment: Assignment = match serde_json::from_slice(&data) {
            Ok(assignment) => assignment,
            Err(err) => {
                warn!(%err, "supervisor: malformed partition document");
                return;
            }
        };

        let Some(topics) = assignment.get(&self.id) else {
            return;
        };

        for topic in topics.clone() {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let cutoff = Utc::now() - chrono::Duration::from_std(LEASE).expect("LEASE fits in chrono::Duration");
                match this.engine.requeue(&topic, cutoff).await {
                    Ok(count) if count > 0 => info!(topic, count, "supervisor: requeued expired leases"),
                    Ok(_) => {}
                    Err(err) => error!(topic, %err, "supervisor: requeue failed, will retry next tick"),
                }
            });
        }
    }
}
