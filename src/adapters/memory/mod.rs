//! In-memory adapters: the default session store and a knowledge store.

pub mod knowledge_store;
pub mod session_repository;

pub use knowledge_store::InMemoryKnowledgeStore;
pub use session_repository::InMemorySessionRepository;
