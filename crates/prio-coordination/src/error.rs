use thiserror::Error;

pub type CoordResult<T> = Result<T, CoordError>;

/// Errors surfaced by a [`crate::CoordinationClient`] implementation.
#[derive(Error, Debug, Clone)]
pub enum CoordError {
    #[error("node does not exist: {0}")]
    NoNode(String),

    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("coordination session lost")]
    SessionLost,

    #[error("coordination backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "zookeeper")]
impl From<zookeeper_client::Error> for CoordError {
    fn from(err: zookeeper_client::Error) -> Self {
        use zookeeper_client::Error as ZkError;
        match err {
            ZkError::NoNode => Self::NoNode("unspecified".to_string()),
            ZkError::NodeExists => Self::NodeExists("unspecified".to_string()),
            ZkError::SessionExpired | ZkError::ConnectionLoss => Self::SessionLost,
            other => Self::Backend(other.to_string()),
        }
    }
}
