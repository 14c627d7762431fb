//! Domain entities shared by the metrics engine and the persistence gateway.
//!
//! All entities serialize with camelCase field names, the convention the
//! upstream form layer and the local cache both speak. The remote store keeps
//! its own snake_case row structs and maps at its boundary.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Profile record owned by the authentication subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub tenant_id: String,
    pub role: String,
    pub created_at: String,
}

/// Raw figures entered from one settlement report period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    /// Gross billed value.
    #[serde(default)]
    pub vbv: f64,
    /// Deductions already paid by the client.
    #[serde(default)]
    pub valores_pagos_cliente: f64,
    /// Net settlement component.
    #[serde(default)]
    pub vrl: f64,
    /// Net settlement component (adjustments).
    #[serde(default)]
    pub vrlj: f64,
    #[serde(default)]
    pub additional_values: HashMap<String, f64>,
    #[serde(default)]
    pub periodo: String,
    pub tenant_id: String,
}

/// Profitability metrics derived from a [`FormInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub rbr: f64,
    pub rol: f64,
    pub rentabilidade_liquida: f64,
    pub retencao_ifood_percentual: f64,
    pub valor_retido_ifood: f64,
}

/// One persisted analysis: the entered figures plus the metrics computed
/// from them, append-only after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub form_data: FormInput,
    pub calculated_data: DerivedMetrics,
    pub timestamp: String,
}

impl AnalysisData {
    /// Builds a new analysis from a form, computing the derived metrics.
    ///
    /// This is the only constructor, which keeps `calculated_data` exactly
    /// what the metrics engine produces for `form_data`.
    pub fn new(user_id: &str, form: FormInput) -> Self {
        let calculated_data = crate::core::metrics::calculate_metrics(&form);
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            tenant_id: form.tenant_id.clone(),
            form_data: form,
            calculated_data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
