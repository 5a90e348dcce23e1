pub mod execution_coordinator;
pub mod report_builder;
pub mod session_service;
pub mod test_generator;
pub mod test_ranker;
pub mod validation;

pub use execution_coordinator::{ExecutionCoordinator, CANCELLED_REASON};
pub use report_builder::ReportBuilder;
pub use session_service::{Collaborators, SessionService};
pub use test_generator::TestGenerator;
pub use test_ranker::TestRanker;
pub use validation::{NextRun, ValidationProtocol};
