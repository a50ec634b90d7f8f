mod dispatch;
mod models;
#[cfg(feature = "cli")]
mod printer;
mod runner;

pub use dispatch::{dispatch, PreparedBody, PreparedRequest};
pub use models::{
    BodyType, ExecuteRequest, ExecutionResult, RequestSnapshot, RequestSpec, ResponseSnapshot,
};
#[cfg(feature = "cli")]
pub use printer::{print_execution_result, print_history_entry};
pub use runner::{execute, execute_saved_request, resolve_url, EnvSelection};
