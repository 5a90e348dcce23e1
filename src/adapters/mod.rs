//! Adapters implementing the domain ports.
//!
//! - `memory`: in-process session and knowledge stores
//! - `judges`: judge variant registry
//! - `scripted`: deterministic collaborators for tests and dry runs

pub mod judges;
pub mod memory;
pub mod scripted;
