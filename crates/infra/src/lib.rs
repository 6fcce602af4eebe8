//! Infrastructure layer: collaborator ports and adapters, state tables,
//! configuration, and the `ScmService` facade.

pub mod config;
pub mod error;
pub mod providers;
pub mod service;
pub mod tables;


pub use config::ScmConfig;
pub use error::ScmError;
pub use service::{Collaborators, ScmService};
