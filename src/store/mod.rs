pub mod local;
pub mod remote;

use crate::core::model::AnalysisData;
use anyhow::Result;
use async_trait::async_trait;

/// Capability interface shared by the remote and local analysis backends.
///
/// The gateway composes the two implementations as "try remote, fall back to
/// local"; the sync utility pushes through the same interface.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Appends a new analysis. Analyses are append-only; this is never an
    /// upsert.
    async fn insert(&self, analysis: &AnalysisData) -> Result<()>;

    /// Upserts a batch keyed by analysis id. Re-running with the same batch
    /// must not create duplicates.
    async fn upsert_many(&self, analyses: &[AnalysisData]) -> Result<()>;

    /// Lists all analyses for one tenant.
    async fn list(&self, tenant_id: &str) -> Result<Vec<AnalysisData>>;

    /// Deletes an analysis matched by both id and tenant.
    async fn delete(&self, id: &str, tenant_id: &str) -> Result<()>;
}
