//! Record storage for collections, environments, saved requests and
//! execution history.

mod file;
mod records;
mod traits;

pub use file::Store;
pub use records::{
    Collection, CollectionUpdate, Environment, EnvironmentUpdate, HistoryEntry, NewCollection,
    NewEnvironment, NewHistoryEntry, NewRequest, RequestUpdate, StoredRequest,
};
pub use traits::{CollectionStore, EnvironmentStore, HistoryStore, RequestStore};
