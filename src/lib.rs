use std::collections::BTreeMap;

pub mod assertions;
pub mod auth;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod secrets;
pub mod store;

pub use error::{DispatchError, Error, Result};

/// Header and query parameter tables.
pub type StringMap = BTreeMap<String, String>;
