//! Hosts for the ATS engine: the stateless HTTP service and the execution
//! router that prefers the in-process sandbox and falls back to that service.

pub mod config;
pub mod errors;
pub mod evaluation;
pub mod execution;
pub mod routes;
pub mod state;

pub use config::Config;
pub use execution::{EvaluationError, ExecutionRouter, RouterState};
pub use routes::build_router;
pub use state::AppState;
