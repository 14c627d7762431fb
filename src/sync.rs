//! One-directional migration of locally-cached analyses into the remote
//! store. Local copies are retained after a successful push.

use crate::gateway::Gateway;
use crate::store::AnalysisStore;
use anyhow::{Context, Result};
use tracing::{info, warn};

#[derive(Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    RemoteUnavailable,
    NothingToSync,
    Synced(usize),
}

/// Pushes every locally-cached analysis for `tenant_id` to the remote store
/// in one batch upsert keyed by analysis id, so re-running with unchanged
/// local data creates no duplicates.
pub async fn sync_local_to_remote(gateway: &Gateway, tenant_id: &str) -> Result<SyncOutcome> {
    let Some(remote) = gateway.remote() else {
        warn!("remote backend unavailable, skipping sync");
        return Ok(SyncOutcome::RemoteUnavailable);
    };

    let pending = gateway.local().analyses(tenant_id);
    if pending.is_empty() {
        info!(tenant_id, "no local analyses to sync");
        return Ok(SyncOutcome::NothingToSync);
    }

    remote
        .upsert_many(&pending)
        .await
        .context("failed to push local analyses to the remote store")?;

    info!(tenant_id, count = pending.len(), "synced local analyses to remote");
    Ok(SyncOutcome::Synced(pending.len()))
}
