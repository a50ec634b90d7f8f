use crate::error::Result;

use super::records::{
    Collection, CollectionUpdate, Environment, EnvironmentUpdate, HistoryEntry, NewCollection,
    NewEnvironment, NewHistoryEntry, NewRequest, RequestUpdate, StoredRequest,
};

pub trait EnvironmentStore: Send + Sync {
    fn get_environment(&self, id: u64) -> Result<Environment>;
    /// Ordered by id.
    fn list_environments(&self) -> Result<Vec<Environment>>;
    fn active_environment(&self) -> Result<Option<Environment>>;
    /// Marks `id` active and every other environment inactive in one step.
    fn set_active(&self, id: u64) -> Result<Environment>;
    fn create_environment(&self, new: NewEnvironment) -> Result<Environment>;
    fn update_environment(&self, id: u64, update: EnvironmentUpdate) -> Result<Environment>;
    fn delete_environment(&self, id: u64) -> Result<()>;
}

/// Append-only log of executions. Entries are never modified once written.
pub trait HistoryStore: Send + Sync {
    fn append_history(&self, entry: NewHistoryEntry) -> Result<u64>;
    /// Most recent first.
    fn list_history(&self) -> Result<Vec<HistoryEntry>>;
    fn get_history(&self, id: u64) -> Result<HistoryEntry>;
    fn delete_history(&self, id: u64) -> Result<()>;
}

pub trait CollectionStore: Send + Sync {
    fn get_collection(&self, id: u64) -> Result<Collection>;
    fn list_collections(&self) -> Result<Vec<Collection>>;
    fn create_collection(&self, new: NewCollection) -> Result<Collection>;
    fn update_collection(&self, id: u64, update: CollectionUpdate) -> Result<Collection>;
    /// Requests that belonged to the collection are kept and detached.
    fn delete_collection(&self, id: u64) -> Result<()>;
}

pub trait RequestStore: Send + Sync {
    fn get_request(&self, id: u64) -> Result<StoredRequest>;
    fn list_requests(&self, collection_id: Option<u64>) -> Result<Vec<StoredRequest>>;
    fn create_request(&self, new: NewRequest) -> Result<StoredRequest>;
    fn update_request(&self, id: u64, update: RequestUpdate) -> Result<StoredRequest>;
    fn delete_request(&self, id: u64) -> Result<()>;
}
