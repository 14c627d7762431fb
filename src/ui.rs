//! Terminal presentation for analyses and validation results.

use crate::core::metrics::ValidationResult;
use crate::core::model::{AnalysisData, DerivedMetrics};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

/// Formats a value in Brazilian currency notation ("1.234,56").
pub fn format_brl(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{frac:02}")
}

fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn money_cell(value: f64) -> Cell {
    Cell::new(format!("R$ {}", format_brl(value))).set_alignment(CellAlignment::Right)
}

fn percent_cell(value: f64) -> Cell {
    let text = format!("{value:.2}%");
    let color = if value >= 0.0 { Color::Green } else { Color::Red };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

/// Renders a tenant's analysis history as a table, newest first.
pub fn analyses_table(analyses: &[AnalysisData]) -> Table {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Período"),
        header_cell("VBV"),
        header_cell("RBR"),
        header_cell("ROL"),
        header_cell("Rent. Líq."),
        header_cell("Retenção"),
        header_cell("Data"),
    ]);

    for analysis in analyses {
        let short_id: String = analysis.id.chars().take(8).collect();
        let date: String = analysis.timestamp.chars().take(10).collect();
        table.add_row(vec![
            Cell::new(short_id).fg(Color::DarkGrey),
            Cell::new(&analysis.form_data.periodo),
            money_cell(analysis.form_data.vbv),
            money_cell(analysis.calculated_data.rbr),
            money_cell(analysis.calculated_data.rol),
            percent_cell(analysis.calculated_data.rentabilidade_liquida),
            percent_cell(analysis.calculated_data.retencao_ifood_percentual),
            Cell::new(date),
        ]);
    }
    table
}

/// Prints the computed metrics block for one analysis.
pub fn print_metrics(metrics: &DerivedMetrics) {
    println!("{}", style("Derived metrics").bold().underlined());
    println!(
        "  {} R$ {}",
        style("Gross real revenue (RBR):").bold(),
        format_brl(metrics.rbr)
    );
    println!(
        "  {} R$ {}",
        style("Net operating revenue (ROL):").bold(),
        format_brl(metrics.rol)
    );
    println!(
        "  {} {}",
        style("Net profitability:").bold(),
        style(format!("{:.2}%", metrics.rentabilidade_liquida)).green().bold()
    );
    println!(
        "  {} {:.2}%",
        style("Platform retention:").bold(),
        metrics.retencao_ifood_percentual
    );
    println!(
        "  {} R$ {}",
        style("Amount retained:").bold(),
        format_brl(metrics.valor_retido_ifood)
    );
}

/// Prints validation errors and warnings; returns whether the form is valid.
pub fn print_validation(result: &ValidationResult) -> bool {
    for error in &result.errors {
        eprintln!(
            "{} [{}] {}",
            style("error:").red().bold(),
            error.field,
            error.message
        );
    }
    for warning in &result.warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }
    result.is_valid
}
