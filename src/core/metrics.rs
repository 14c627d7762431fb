//! Pure profitability calculations over settlement figures.

use crate::core::model::{DerivedMetrics, FormInput};

/// Validation outcome for a settlement form. Warnings never block.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn coerce(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Computes the derived profitability metrics for one reporting period.
///
/// Pure and total: non-finite inputs are coerced to zero and a non-positive
/// gross revenue guards the percentage against division by zero.
pub fn calculate_metrics(form: &FormInput) -> DerivedMetrics {
    let vbv = coerce(form.vbv);
    let pagos_cliente = coerce(form.valores_pagos_cliente);
    let vrl = coerce(form.vrl);
    let vrlj = coerce(form.vrlj);

    let rbr = vbv - pagos_cliente;
    let rol = vrl + vrlj;
    let rentabilidade_liquida = if rbr > 0.0 { (rol / rbr) * 100.0 } else { 0.0 };

    DerivedMetrics {
        rbr,
        rol,
        rentabilidade_liquida,
        retencao_ifood_percentual: 100.0 - rentabilidade_liquida,
        valor_retido_ifood: rbr - rol,
    }
}

/// Checks whether a form holds enough consistent data to analyze.
pub fn validate_form_data(form: &FormInput) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let vbv = coerce(form.vbv);
    let pagos_cliente = coerce(form.valores_pagos_cliente);

    if vbv <= 0.0 {
        errors.push(FieldError {
            field: "vbv".to_string(),
            message: "Gross billed value must be greater than zero".to_string(),
        });
    }
    if pagos_cliente < 0.0 {
        errors.push(FieldError {
            field: "valoresPagosCliente".to_string(),
            message: "Client-paid deductions cannot be negative".to_string(),
        });
    }

    let metrics = calculate_metrics(form);
    if metrics.rbr <= 0.0 {
        errors.push(FieldError {
            field: "geral".to_string(),
            message: "Gross real revenue (RBR) must be greater than zero".to_string(),
        });
    }
    if metrics.rol > metrics.rbr {
        warnings.push(
            "Net operating revenue (ROL) exceeds gross real revenue (RBR); check the entered figures".to_string(),
        );
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
