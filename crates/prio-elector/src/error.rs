use prio_coordination::CoordError;
use thiserror::Error;

pub type ElectResult<T> = Result<T, ElectError>;

#[derive(Error, Debug, Clone)]
pub enum ElectError {
    #[error("coordination error: {0}")]
    Coordination(#[from] CoordError),

    #[error("coordination session lost, own election node vanished")]
    CoordinationLost,

    #[error("election root {0} has no children")]
    NoChildren(String),

    #[error("own election node {0} missing from children listing")]
    NodeMissing(String),
}
