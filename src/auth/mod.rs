//! Request authentication: the stored auth configuration, how it is applied to
//! an outgoing request, and how it is masked before being written to history.

mod model;
mod resolver;

pub use model::{ApiKeyLocation, AuthConfig, SECRET_MASK};
pub use resolver::{apply_auth, redact_auth};
