//! Persistence gateway: availability-checked two-tier storage.
//!
//! Every operation attempts the remote store first and falls back to the
//! local mirror on any failure. Successful remote writes are additionally
//! mirrored locally (write-through on success only; the fallback path has
//! already written locally). No operation ever surfaces a connectivity
//! error: failures are logged and degrade to the local tier.

use crate::config::AppConfig;
use crate::core::model::{AnalysisData, User};
use crate::store::AnalysisStore;
use crate::store::local::LocalStore;
use crate::store::remote::RemoteStore;
use anyhow::Result;
use tracing::{debug, warn};

pub struct Gateway {
    remote: Option<RemoteStore>,
    local: LocalStore,
}

impl Gateway {
    pub fn new(remote: Option<RemoteStore>, local: LocalStore) -> Self {
        Self { remote, local }
    }

    /// Builds the gateway from configuration: the remote tier only exists
    /// when both a service URL and an access credential are present.
    pub fn from_config(config: &AppConfig) -> Self {
        let remote = if config.remote_available() {
            config
                .remote
                .as_ref()
                .map(|r| RemoteStore::new(&r.base_url, &r.api_key, r.access_token.as_deref()))
        } else {
            debug!("remote backend not configured, running local-only");
            None
        };

        let local = match AppConfig::default_data_path() {
            Ok(path) => LocalStore::open(&path.join("cache")),
            Err(e) => {
                warn!(error = %e, "no data directory available, caching in memory only");
                LocalStore::in_memory()
            }
        };

        Self::new(remote, local)
    }

    pub fn remote(&self) -> Option<&RemoteStore> {
        self.remote.as_ref()
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Resolves the active user: remote session + profile lookup, mirrored
    /// into the local cache on success; otherwise the validated cached user.
    pub async fn current_user(&self) -> Option<User> {
        if let Some(remote) = &self.remote {
            match Self::remote_user(remote).await {
                Ok(Some(user)) => {
                    self.local.put_user(&user);
                    return Some(user);
                }
                Ok(None) => debug!("no active remote session, checking local cache"),
                Err(e) => {
                    warn!(error = %e, "remote user lookup failed, falling back to local cache");
                }
            }
        }
        self.local.cached_user()
    }

    async fn remote_user(remote: &RemoteStore) -> Result<Option<User>> {
        let session = remote.current_session().await?;
        remote.fetch_profile(&session.id).await
    }

    /// Upserts the user's full record remotely, mirroring locally on
    /// success; writes straight to the local cache on failure.
    pub async fn save_user(&self, user: &User) {
        if let Some(remote) = &self.remote {
            match remote.upsert_profile(user).await {
                Ok(()) => {
                    self.local.put_user(user);
                    return;
                }
                Err(e) => warn!(error = %e, "remote profile upsert failed, caching locally only"),
            }
        }
        self.local.put_user(user);
    }

    /// Best-effort remote session invalidation, then always clears the
    /// local cached user.
    pub async fn logout(&self) {
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.sign_out().await {
                warn!(error = %e, "remote sign-out failed, clearing local session anyway");
            }
        }
        self.local.clear_user();
    }

    /// Persists a new analysis. Analyses are append-only, so the remote path
    /// is a plain insert, never an upsert.
    pub async fn save_analysis(&self, analysis: &AnalysisData) {
        if let Some(remote) = &self.remote {
            match remote.insert(analysis).await {
                Ok(()) => {
                    self.local.append_analysis(analysis);
                    return;
                }
                Err(e) => warn!(error = %e, "remote analysis insert failed, saving locally"),
            }
        }
        self.local.append_analysis(analysis);
    }

    /// Lists a tenant's analyses, newest first. The remote store orders by
    /// timestamp; the local fallback is sorted the same way so both tiers
    /// present an identical ordering.
    pub async fn load_analyses(&self, tenant_id: &str) -> Vec<AnalysisData> {
        if let Some(remote) = &self.remote {
            match remote.list(tenant_id).await {
                Ok(list) if !list.is_empty() => return list,
                Ok(_) => debug!("no remote analyses, checking local cache"),
                Err(e) => warn!(error = %e, "remote analysis query failed, falling back to local"),
            }
        }
        let mut list = self.local.analyses(tenant_id);
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        list
    }

    /// Deletes an analysis matched by both id and tenant. Idempotent on
    /// either tier.
    pub async fn delete_analysis(&self, id: &str, tenant_id: &str) {
        if let Some(remote) = &self.remote {
            match remote.delete(id, tenant_id).await {
                Ok(()) => {
                    self.local.remove_analysis(id, tenant_id);
                    return;
                }
                Err(e) => warn!(error = %e, "remote analysis delete failed, removing locally"),
            }
        }
        self.local.remove_analysis(id, tenant_id);
    }

    /// Filters a tenant's analyses by a substring of the reporting period.
    pub async fn analyses_by_period(&self, tenant_id: &str, needle: &str) -> Vec<AnalysisData> {
        self.load_analyses(tenant_id)
            .await
            .into_iter()
            .filter(|a| a.form_data.periodo.contains(needle))
            .collect()
    }

    /// Lists one user's analyses within a tenant, newest first. On remote
    /// failure this scans the full local tenant list and filters client-side
    /// in a single attempt; there is no partial-success retry.
    pub async fn analyses_by_user(&self, user_id: &str, tenant_id: &str) -> Vec<AnalysisData> {
        if let Some(remote) = &self.remote {
            match remote.list_by_user(user_id, tenant_id).await {
                Ok(list) => return list,
                Err(e) => warn!(error = %e, "remote user query failed, scanning local cache"),
            }
        }
        let mut list = self.local.analyses(tenant_id);
        list.retain(|a| a.user_id == user_id);
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        list
    }
}
