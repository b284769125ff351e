//! # Services
//!
//! Units of work that span the lifecycle core and the repositories.

pub mod lifecycle;

pub use lifecycle::{LifecycleService, ServiceError};
