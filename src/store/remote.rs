//! Remote structured-record store (PostgREST-style API).
//!
//! Two logical tables: `profiles` and `analyses`. Columns are snake_case on
//! the wire while the domain speaks camelCase; the row structs below are the
//! single place where that mapping lives.

use crate::core::model::{AnalysisData, DerivedMetrics, FormInput, User};
use crate::store::AnalysisStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=minimal";

pub struct RemoteStore {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

/// Minimal shape of the authenticated session record.
#[derive(Debug, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

// Wire rows: snake_case columns, mapped to/from the camelCase domain types.

#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    tenant_id: String,
    role: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            tenant_id: row.tenant_id,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        UserRow {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            tenant_id: user.tenant_id.clone(),
            role: user.role.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AnalysisRow {
    id: String,
    user_id: String,
    tenant_id: String,
    // JSON columns keep the domain's camelCase payload convention.
    form_data: FormInput,
    calculated_data: DerivedMetrics,
    timestamp: String,
}

impl From<AnalysisRow> for AnalysisData {
    fn from(row: AnalysisRow) -> Self {
        AnalysisData {
            id: row.id,
            user_id: row.user_id,
            tenant_id: row.tenant_id,
            form_data: row.form_data,
            calculated_data: row.calculated_data,
            timestamp: row.timestamp,
        }
    }
}

impl From<&AnalysisData> for AnalysisRow {
    fn from(a: &AnalysisData) -> Self {
        AnalysisRow {
            id: a.id.clone(),
            user_id: a.user_id.clone(),
            tenant_id: a.tenant_id.clone(),
            form_data: a.form_data.clone(),
            calculated_data: a.calculated_data.clone(),
            timestamp: a.timestamp.clone(),
        }
    }
}

impl RemoteStore {
    pub fn new(base_url: &str, api_key: &str, access_token: Option<&str>) -> Self {
        RemoteStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: access_token.map(str::to_string),
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for {}", response.status(), what));
        }
        Ok(response)
    }

    /// Resolves the active session, if any.
    pub async fn current_session(&self) -> Result<SessionUser> {
        let response = self
            .request(reqwest::Method::GET, "/auth/v1/user")
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for session lookup"))?;
        let response = Self::check(response, "session lookup").await?;
        Ok(response.json::<SessionUser>().await?)
    }

    /// Invalidates the remote session. Callers treat failure as non-fatal.
    pub async fn sign_out(&self) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/auth/v1/logout")
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for sign-out"))?;
        Self::check(response, "sign-out").await?;
        Ok(())
    }

    /// Fetches the profile row matching `id`.
    #[instrument(name = "RemoteProfileFetch", skip(self), fields(id = %id))]
    pub async fn fetch_profile(&self, id: &str) -> Result<Option<User>> {
        let path = format!("/rest/v1/profiles?id=eq.{id}&select=*&limit=1");
        debug!("Requesting profile from {}", path);

        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for profile: {id}"))?;
        let response = Self::check(response, "profile fetch").await?;

        let rows = response.json::<Vec<UserRow>>().await?;
        Ok(rows.into_iter().next().map(User::from))
    }

    /// Insert-or-replace of the full profile record, keyed on `id`.
    pub async fn upsert_profile(&self, user: &User) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/rest/v1/profiles?on_conflict=id")
            .header("Prefer", MERGE_DUPLICATES)
            .json(&[UserRow::from(user)])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for profile upsert: {}", user.id))?;
        Self::check(response, "profile upsert").await?;
        Ok(())
    }

    /// Lists one user's analyses within a tenant, newest first.
    pub async fn list_by_user(&self, user_id: &str, tenant_id: &str) -> Result<Vec<AnalysisData>> {
        let path = format!(
            "/rest/v1/analyses?user_id=eq.{user_id}&tenant_id=eq.{tenant_id}&select=*&order=timestamp.desc"
        );
        self.fetch_analyses(&path).await
    }

    async fn fetch_analyses(&self, path: &str) -> Result<Vec<AnalysisData>> {
        debug!("Requesting analyses from {}", path);
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for analysis query"))?;
        let response = Self::check(response, "analysis query").await?;

        let rows = response.json::<Vec<AnalysisRow>>().await?;
        Ok(rows.into_iter().map(AnalysisData::from).collect())
    }
}

#[async_trait]
impl AnalysisStore for RemoteStore {
    async fn insert(&self, analysis: &AnalysisData) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/rest/v1/analyses")
            .header("Prefer", "return=minimal")
            .json(&[AnalysisRow::from(analysis)])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for analysis insert: {}", analysis.id))?;
        Self::check(response, "analysis insert").await?;
        Ok(())
    }

    async fn upsert_many(&self, analyses: &[AnalysisData]) -> Result<()> {
        if analyses.is_empty() {
            return Ok(());
        }
        let rows: Vec<AnalysisRow> = analyses.iter().map(AnalysisRow::from).collect();
        let response = self
            .request(reqwest::Method::POST, "/rest/v1/analyses?on_conflict=id")
            .header("Prefer", MERGE_DUPLICATES)
            .json(&rows)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for analysis batch upsert"))?;
        Self::check(response, "analysis batch upsert").await?;
        Ok(())
    }

    #[instrument(name = "RemoteAnalysisList", skip(self), fields(tenant_id = %tenant_id))]
    async fn list(&self, tenant_id: &str) -> Result<Vec<AnalysisData>> {
        let path =
            format!("/rest/v1/analyses?tenant_id=eq.{tenant_id}&select=*&order=timestamp.desc");
        self.fetch_analyses(&path).await
    }

    async fn delete(&self, id: &str, tenant_id: &str) -> Result<()> {
        let path = format!("/rest/v1/analyses?id=eq.{id}&tenant_id=eq.{tenant_id}");
        let response = self
            .request(reqwest::Method::DELETE, &path)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {e} for analysis delete: {id}"))?;
        Self::check(response, "analysis delete").await?;
        Ok(())
    }
}
