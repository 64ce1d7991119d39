//! Ephemeral-sequential leader election on top of [`prio_coordination::CoordinationClient`].

mod elector;
mod error;
mod status;

pub use elector::{Elector, StatusReceiver};
pub use error::{ElectError, ElectResult};
pub use status::{Role, Status};
