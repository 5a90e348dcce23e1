//! Scripted collaborators.
//!
//! Deterministic implementations of the browser, judge, inspector and
//! generation ports. Used by the test suites and for offline dry runs.

pub mod browser;
pub mod generation;
pub mod inspector;
pub mod judge;

pub use browser::{DriverResponse, ScriptedBrowserDriver};
pub use generation::{balanced_pool, ScriptedGenerationBackend};
pub use inspector::StaticInspector;
pub use judge::ScriptedJudge;
