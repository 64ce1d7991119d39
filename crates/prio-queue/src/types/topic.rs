use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniquely named container for jobs. Never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}
