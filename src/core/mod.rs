pub mod problem;
pub mod types;
pub mod verdict;

pub use problem::CodingProblem;
pub use types::{ExecutionReport, ExecutionRequest, TestCase, TestResult};
pub use verdict::Verdict;
