//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces for every collaborator the
//! engine consumes:
//! - SessionRepository: session storage with create/get/expire lifecycle
//! - GameInspector: turns a URL into a game analysis
//! - GenerationBackend: proposes raw test cases
//! - BrowserDriver: executes action plans and captures artifacts
//! - VerdictJudge: judges captured evidence
//! - KnowledgeStore: similarity lookup and upsert of prior knowledge

pub mod browser_driver;
pub mod errors;
pub mod game_inspector;
pub mod generation_backend;
pub mod knowledge_store;
pub mod null_knowledge;
pub mod session_repository;
pub mod verdict_judge;

pub use browser_driver::BrowserDriver;
pub use errors::{DriverError, GenerationError, InspectionError, JudgeError, KnowledgeStoreError};
pub use game_inspector::GameInspector;
pub use generation_backend::{GenerationBackend, GenerationRequest};
pub use knowledge_store::KnowledgeStore;
pub use null_knowledge::NullKnowledgeStore;
pub use session_repository::SessionRepository;
pub use verdict_judge::VerdictJudge;
