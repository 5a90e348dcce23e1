//! Verdict judge wiring.

pub mod registry;

pub use registry::JudgeRegistry;
