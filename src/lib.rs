//! # Kontena Library
//!
//! Asset and procurement lifecycle service: the status registry, transition
//! validation and cross-entity enforcement, persistence, and the HTTP API
//! built on top of them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod repositories;
pub mod server;
pub mod services;
pub mod telemetry;
pub use migration;
