use thiserror::Error;

/// Transport-level failure of an outbound call.
#[derive(Debug, Error)]
#[error("{method} {url} failed: {cause}")]
pub struct DispatchError {
    pub method: String,
    pub url: String,
    pub cause: String,
}

impl DispatchError {
    pub fn new(method: &str, url: &str, cause: impl ToString) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            cause: cause.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Error::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
