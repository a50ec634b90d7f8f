use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::secrets::{PlainCipher, SecretCipher};

use super::records::{
    validate_collection, validate_environment, validate_request, Collection, CollectionUpdate,
    Environment, EnvironmentUpdate, HistoryEntry, NewCollection, NewEnvironment, NewHistoryEntry,
    NewRequest, RequestUpdate, StoredRequest,
};
use super::traits::{CollectionStore, EnvironmentStore, HistoryStore, RequestStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct NextIds {
    collection: u64,
    environment: u64,
    request: u64,
    history: u64,
}

impl NextIds {
    fn take(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoreData {
    next_ids: NextIds,
    collections: Vec<Collection>,
    environments: Vec<Environment>,
    requests: Vec<StoredRequest>,
    history: Vec<HistoryEntry>,
}

/// Record store kept in memory and, when opened on a path, mirrored to a
/// single JSON file after every change.
///
/// Each mutation runs against a copy of the data under one lock; the copy only
/// replaces the live state once it has been written out, so a failed write
/// leaves both memory and disk untouched. History appends skip the copy and
/// undo the push if the write fails.
pub struct Store {
    path: Option<PathBuf>,
    cipher: Box<dyn SecretCipher>,
    data: Mutex<StoreData>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            cipher: Box::new(PlainCipher),
            data: Mutex::new(StoreData::default()),
        }
    }

    /// Opens the store file at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            StoreData::default()
        };
        tracing::debug!(path = %path.display(), "store opened");

        Ok(Self {
            path: Some(path.to_path_buf()),
            cipher: Box::new(PlainCipher),
            data: Mutex::new(data),
        })
    }

    pub fn with_cipher(mut self, cipher: impl SecretCipher + 'static) -> Self {
        self.cipher = Box::new(cipher);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreData>> {
        self.data
            .lock()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))
    }

    fn read<T>(&self, f: impl FnOnce(&StoreData) -> Result<T>) -> Result<T> {
        let guard = self.lock()?;
        f(&guard)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        let out = f(&mut working)?;
        self.persist(&working)?;
        *guard = working;
        Ok(out)
    }

    fn persist(&self, data: &StoreData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn seal(&self, mut request: StoredRequest) -> StoredRequest {
        request.spec.auth = request.spec.auth.map_secrets(|s| self.cipher.encrypt(s));
        request
    }

    fn unseal(&self, mut request: StoredRequest) -> StoredRequest {
        request.spec.auth = request.spec.auth.map_secrets(|s| self.cipher.decrypt(s));
        request
    }
}

fn find<'a, T>(
    items: &'a mut [T],
    id: u64,
    entity: &'static str,
    id_of: impl Fn(&T) -> u64,
) -> Result<&'a mut T> {
    items
        .iter_mut()
        .find(|item| id_of(item) == id)
        .ok_or_else(|| Error::not_found(entity, id))
}

fn remove<T>(
    items: &mut Vec<T>,
    id: u64,
    entity: &'static str,
    id_of: impl Fn(&T) -> u64,
) -> Result<T> {
    let index = items
        .iter()
        .position(|item| id_of(item) == id)
        .ok_or_else(|| Error::not_found(entity, id))?;
    Ok(items.remove(index))
}

fn ensure_unique_name<'a>(
    mut names: impl Iterator<Item = (u64, &'a str)>,
    name: &str,
    skip_id: Option<u64>,
    entity: &str,
) -> Result<()> {
    if names.any(|(id, existing)| Some(id) != skip_id && existing == name) {
        return Err(Error::validation(format!(
            "{entity} named {name:?} already exists"
        )));
    }
    Ok(())
}

impl EnvironmentStore for Store {
    fn get_environment(&self, id: u64) -> Result<Environment> {
        self.read(|data| {
            data.environments
                .iter()
                .find(|env| env.id == id)
                .cloned()
                .ok_or_else(|| Error::not_found("environment", id))
        })
    }

    fn list_environments(&self) -> Result<Vec<Environment>> {
        self.read(|data| Ok(data.environments.clone()))
    }

    fn active_environment(&self) -> Result<Option<Environment>> {
        self.read(|data| Ok(data.environments.iter().find(|env| env.is_active).cloned()))
    }

    fn set_active(&self, id: u64) -> Result<Environment> {
        self.mutate(|data| {
            if !data.environments.iter().any(|env| env.id == id) {
                return Err(Error::not_found("environment", id));
            }
            for env in &mut data.environments {
                env.is_active = env.id == id;
            }
            let active = find(&mut data.environments, id, "environment", |env| env.id)?;
            tracing::info!(env_id = id, name = %active.name, "environment activated");
            Ok(active.clone())
        })
    }

    fn create_environment(&self, new: NewEnvironment) -> Result<Environment> {
        validate_environment(&new.name, &new.base_url)?;
        self.mutate(|data| {
            ensure_unique_name(
                data.environments.iter().map(|env| (env.id, env.name.as_str())),
                &new.name,
                None,
                "environment",
            )?;
            let environment = Environment {
                id: NextIds::take(&mut data.next_ids.environment),
                name: new.name,
                base_url: new.base_url,
                variables: new.variables,
                is_active: false,
                created_at: Utc::now(),
            };
            data.environments.push(environment.clone());
            Ok(environment)
        })
    }

    fn update_environment(&self, id: u64, update: EnvironmentUpdate) -> Result<Environment> {
        self.mutate(|data| {
            if let Some(name) = &update.name {
                ensure_unique_name(
                    data.environments.iter().map(|env| (env.id, env.name.as_str())),
                    name,
                    Some(id),
                    "environment",
                )?;
            }
            let env = find(&mut data.environments, id, "environment", |env| env.id)?;
            if let Some(name) = update.name {
                env.name = name;
            }
            if let Some(base_url) = update.base_url {
                env.base_url = base_url;
            }
            if let Some(variables) = update.variables {
                env.variables = variables;
            }
            validate_environment(&env.name, &env.base_url)?;
            Ok(env.clone())
        })
    }

    fn delete_environment(&self, id: u64) -> Result<()> {
        self.mutate(|data| remove(&mut data.environments, id, "environment", |env| env.id).map(drop))
    }
}

impl HistoryStore for Store {
    fn append_history(&self, entry: NewHistoryEntry) -> Result<u64> {
        // History only grows, so append in place and roll back on a failed
        // write instead of copying the whole store.
        let mut guard = self.lock()?;
        let id = guard.next_ids.history + 1;
        guard.history.push(HistoryEntry {
            id,
            request_snapshot: entry.request_snapshot,
            response_snapshot: entry.response_snapshot,
            duration_ms: entry.duration_ms,
            created_at: Utc::now(),
        });
        guard.next_ids.history = id;
        if let Err(err) = self.persist(&guard) {
            guard.history.pop();
            guard.next_ids.history = id - 1;
            return Err(err);
        }
        Ok(id)
    }

    fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        self.read(|data| Ok(data.history.iter().rev().cloned().collect()))
    }

    fn get_history(&self, id: u64) -> Result<HistoryEntry> {
        self.read(|data| {
            data.history
                .iter()
                .find(|entry| entry.id == id)
                .cloned()
                .ok_or_else(|| Error::not_found("history", id))
        })
    }

    fn delete_history(&self, id: u64) -> Result<()> {
        self.mutate(|data| remove(&mut data.history, id, "history", |entry| entry.id).map(drop))
    }
}

impl CollectionStore for Store {
    fn get_collection(&self, id: u64) -> Result<Collection> {
        self.read(|data| {
            data.collections
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| Error::not_found("collection", id))
        })
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        self.read(|data| Ok(data.collections.clone()))
    }

    fn create_collection(&self, new: NewCollection) -> Result<Collection> {
        validate_collection(&new.name, &new.description)?;
        self.mutate(|data| {
            ensure_unique_name(
                data.collections.iter().map(|c| (c.id, c.name.as_str())),
                &new.name,
                None,
                "collection",
            )?;
            let collection = Collection {
                id: NextIds::take(&mut data.next_ids.collection),
                name: new.name,
                description: new.description,
                created_at: Utc::now(),
            };
            data.collections.push(collection.clone());
            Ok(collection)
        })
    }

    fn update_collection(&self, id: u64, update: CollectionUpdate) -> Result<Collection> {
        self.mutate(|data| {
            if let Some(name) = &update.name {
                ensure_unique_name(
                    data.collections.iter().map(|c| (c.id, c.name.as_str())),
                    name,
                    Some(id),
                    "collection",
                )?;
            }
            let collection = find(&mut data.collections, id, "collection", |c| c.id)?;
            if let Some(name) = update.name {
                collection.name = name;
            }
            if let Some(description) = update.description {
                collection.description = description;
            }
            validate_collection(&collection.name, &collection.description)?;
            Ok(collection.clone())
        })
    }

    fn delete_collection(&self, id: u64) -> Result<()> {
        self.mutate(|data| {
            remove(&mut data.collections, id, "collection", |c| c.id)?;
            for request in &mut data.requests {
                if request.collection_id == Some(id) {
                    request.collection_id = None;
                }
            }
            Ok(())
        })
    }
}

impl RequestStore for Store {
    fn get_request(&self, id: u64) -> Result<StoredRequest> {
        let sealed = self.read(|data| {
            data.requests
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| Error::not_found("request", id))
        })?;
        Ok(self.unseal(sealed))
    }

    fn list_requests(&self, collection_id: Option<u64>) -> Result<Vec<StoredRequest>> {
        let sealed = self.read(|data| {
            Ok(data
                .requests
                .iter()
                .filter(|r| collection_id.is_none() || r.collection_id == collection_id)
                .cloned()
                .collect::<Vec<_>>())
        })?;
        Ok(sealed.into_iter().map(|r| self.unseal(r)).collect())
    }

    fn create_request(&self, new: NewRequest) -> Result<StoredRequest> {
        validate_request(&new.name, &new.spec)?;
        self.mutate(|data| {
            if let Some(collection_id) = new.collection_id {
                if !data.collections.iter().any(|c| c.id == collection_id) {
                    return Err(Error::not_found("collection", collection_id));
                }
            }
            let request = StoredRequest {
                id: NextIds::take(&mut data.next_ids.request),
                name: new.name,
                collection_id: new.collection_id,
                spec: new.spec,
                created_at: Utc::now(),
            };
            data.requests.push(self.seal(request.clone()));
            Ok(request)
        })
    }

    fn update_request(&self, id: u64, update: RequestUpdate) -> Result<StoredRequest> {
        self.mutate(|data| {
            if let Some(Some(collection_id)) = update.collection_id {
                if !data.collections.iter().any(|c| c.id == collection_id) {
                    return Err(Error::not_found("collection", collection_id));
                }
            }
            let slot = find(&mut data.requests, id, "request", |r| r.id)?;
            let mut request = self.unseal(slot.clone());
            update.apply(&mut request);
            validate_request(&request.name, &request.spec)?;
            *slot = self.seal(request.clone());
            Ok(request)
        })
    }

    fn delete_request(&self, id: u64) -> Result<()> {
        self.mutate(|data| remove(&mut data.requests, id, "request", |r| r.id).map(drop))
    }
}
