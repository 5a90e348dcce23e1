//! Playtest - test orchestration and validation engine for web puzzle games
//!
//! Playtest takes a game URL through analysis, test generation, ranking,
//! repeat-validated execution and reporting. Browser automation, model
//! backends and the knowledge store are consumed through port traits.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, port traits and errors
//! - **Service Layer** (`services`): session state machine and pipeline components
//! - **Adapters** (`adapters`): in-memory stores, judge registry and scripted collaborators
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, rate limiting
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use playtest::services::{Collaborators, SessionService};
//!
//! async fn run(service: SessionService) -> playtest::domain::errors::DomainResult<()> {
//!     let session = service.run_pipeline("https://example.test/sudoku").await?;
//!     let report = service.get_report(&session.id).await?;
//!     println!("{}", report.summary.overall_status);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, Report, Session, SessionStage, StageInput, TestCase, TestCategory, TestVerdict,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Collaborators, SessionService};
