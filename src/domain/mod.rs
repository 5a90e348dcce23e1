//! Domain layer for the playtest engine
//!
//! Models, collaborator ports and the error taxonomy. Nothing in here talks
//! to a browser, a model backend or a store directly.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
