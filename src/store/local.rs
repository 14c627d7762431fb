//! Local key-value mirror of users and analyses.
//!
//! Backed by a fjall partition when a data directory is available, with an
//! in-memory fallback otherwise (and for tests). Every read treats corrupt
//! or absent data as "no data" and every write failure is logged and
//! swallowed: the local tier must never surface an error to the gateway.

use crate::core::model::{AnalysisData, User};
use crate::store::AnalysisStore;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

const USER_KEY: &str = "current-user";
const ANALYSES_PREFIX: &str = "analyses";

enum Backing {
    Disk {
        // Keyspace must outlive the partition handle.
        _keyspace: Keyspace,
        partition: PartitionHandle,
    },
    Memory(Mutex<HashMap<String, Vec<u8>>>),
}

pub struct LocalStore {
    backing: Backing,
}

impl LocalStore {
    /// Opens the persistent store at `path`, degrading to an in-memory map
    /// when the directory cannot be opened.
    pub fn open(path: &Path) -> Self {
        let disk = fjall::Config::new(path).open().ok().and_then(|keyspace| {
            keyspace
                .open_partition("revrec", PartitionCreateOptions::default())
                .ok()
                .map(|partition| Backing::Disk {
                    _keyspace: keyspace,
                    partition,
                })
        });

        match disk {
            Some(backing) => Self { backing },
            None => {
                warn!(
                    path = %path.display(),
                    "could not open local store, caching in memory only"
                );
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory(Mutex::new(HashMap::new())),
        }
    }

    fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        match &self.backing {
            Backing::Disk { partition, .. } => match partition.get(key) {
                Ok(value) => value.map(|v| v.to_vec()),
                Err(e) => {
                    debug!(key, error = %e, "local store read failed");
                    None
                }
            },
            Backing::Memory(map) => map.lock().unwrap().get(key).cloned(),
        }
    }

    fn put_raw(&self, key: &str, value: Vec<u8>) {
        match &self.backing {
            Backing::Disk { partition, .. } => {
                if let Err(e) = partition.insert(key, value) {
                    debug!(key, error = %e, "local store write failed");
                }
            }
            Backing::Memory(map) => {
                map.lock().unwrap().insert(key.to_string(), value);
            }
        }
    }

    fn remove_raw(&self, key: &str) {
        match &self.backing {
            Backing::Disk { partition, .. } => {
                if let Err(e) = partition.remove(key) {
                    debug!(key, error = %e, "local store remove failed");
                }
            }
            Backing::Memory(map) => {
                map.lock().unwrap().remove(key);
            }
        }
    }

    fn analyses_key(tenant_id: &str) -> String {
        format!("{ANALYSES_PREFIX}-{tenant_id}")
    }

    /// Returns the cached user, if one exists and carries both an id and a
    /// tenant. Anything else reads as "nobody cached".
    pub fn cached_user(&self) -> Option<User> {
        let bytes = self.get_raw(USER_KEY)?;
        match serde_json::from_slice::<User>(&bytes) {
            Ok(user) if !user.id.is_empty() && !user.tenant_id.is_empty() => Some(user),
            Ok(_) => {
                debug!("cached user is missing id or tenant, ignoring");
                None
            }
            Err(e) => {
                debug!(error = %e, "cached user is corrupt, ignoring");
                None
            }
        }
    }

    pub fn put_user(&self, user: &User) {
        match serde_json::to_vec(user) {
            Ok(bytes) => self.put_raw(USER_KEY, bytes),
            Err(e) => debug!(error = %e, "could not serialize user for cache"),
        }
    }

    pub fn clear_user(&self) {
        self.remove_raw(USER_KEY);
    }

    /// Reads the tenant-scoped analysis list. Corrupt or absent data yields
    /// an empty list.
    pub fn analyses(&self, tenant_id: &str) -> Vec<AnalysisData> {
        let Some(bytes) = self.get_raw(&Self::analyses_key(tenant_id)) else {
            return Vec::new();
        };
        match serde_json::from_slice(&bytes) {
            Ok(list) => list,
            Err(e) => {
                debug!(tenant_id, error = %e, "cached analyses are corrupt, ignoring");
                Vec::new()
            }
        }
    }

    pub fn put_analyses(&self, tenant_id: &str, analyses: &[AnalysisData]) {
        match serde_json::to_vec(analyses) {
            Ok(bytes) => self.put_raw(&Self::analyses_key(tenant_id), bytes),
            Err(e) => debug!(tenant_id, error = %e, "could not serialize analyses for cache"),
        }
    }

    pub fn append_analysis(&self, analysis: &AnalysisData) {
        let mut list = self.analyses(&analysis.tenant_id);
        list.push(analysis.clone());
        self.put_analyses(&analysis.tenant_id, &list);
    }

    pub fn remove_analysis(&self, id: &str, tenant_id: &str) {
        let mut list = self.analyses(tenant_id);
        list.retain(|a| a.id != id);
        self.put_analyses(tenant_id, &list);
    }
}

#[async_trait]
impl AnalysisStore for LocalStore {
    async fn insert(&self, analysis: &AnalysisData) -> Result<()> {
        self.append_analysis(analysis);
        Ok(())
    }

    async fn upsert_many(&self, analyses: &[AnalysisData]) -> Result<()> {
        let Some(tenant_id) = analyses.first().map(|a| a.tenant_id.clone()) else {
            return Ok(());
        };
        let mut list = self.analyses(&tenant_id);
        for incoming in analyses {
            match list.iter_mut().find(|a| a.id == incoming.id) {
                Some(existing) => *existing = incoming.clone(),
                None => list.push(incoming.clone()),
            }
        }
        self.put_analyses(&tenant_id, &list);
        Ok(())
    }

    async fn list(&self, tenant_id: &str) -> Result<Vec<AnalysisData>> {
        Ok(self.analyses(tenant_id))
    }

    async fn delete(&self, id: &str, tenant_id: &str) -> Result<()> {
        self.remove_analysis(id, tenant_id);
        Ok(())
    }
}
