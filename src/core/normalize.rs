//! Locale-aware normalization of monetary input.
//!
//! Settlement reports mix Brazilian formatting ("50.889,20") with plain
//! decimals ("123.45"), and users paste values with currency symbols and
//! stray whitespace. `normalize` turns any of those into a canonical `f64`
//! without ever failing.

/// Parses a locale-formatted monetary string into a plain number.
///
/// The function is total: malformed input yields `0.0`, never a panic or a
/// non-finite value.
pub fn normalize(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    // Keep digits, separators and sign; drop currency symbols and the rest.
    let filtered: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();

    let has_comma = filtered.contains(',');
    let dot_count = filtered.matches('.').count();

    let cleaned = if has_comma && dot_count > 0 {
        // "1.234.567,89": dots are thousands separators, comma is decimal.
        filtered.replace('.', "").replace(',', ".")
    } else if has_comma {
        // "123,45": comma is the decimal separator.
        filtered.replace(',', ".")
    } else if dot_count > 1 {
        // "1.234.567": every dot is a thousands separator.
        filtered.replace('.', "")
    } else if dot_count == 1 {
        // Ambiguous single dot. "1.000" reads as one thousand in pt-BR,
        // while "123.45" is already a plain decimal.
        let fraction = filtered.rsplit('.').next().unwrap_or("");
        if fraction.len() == 3 && fraction.chars().all(|c| c.is_ascii_digit()) {
            filtered.replace('.', "")
        } else {
            filtered
        }
    } else {
        filtered
    };

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Normalizes the string-or-number union produced by the upstream form layer.
pub fn normalize_value(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => {
            let v = n.as_f64().unwrap_or(0.0);
            if v.is_finite() { v } else { 0.0 }
        }
        serde_json::Value::String(s) => normalize(s),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_thousands_and_decimal() {
        assert_eq!(normalize("50.889,20"), 50889.20);
        assert_eq!(normalize("1.234.567,89"), 1234567.89);
    }

    #[test]
    fn test_comma_only_is_decimal() {
        assert_eq!(normalize("123,45"), 123.45);
        assert_eq!(normalize("0,5"), 0.5);
    }

    #[test]
    fn test_plain_number() {
        assert_eq!(normalize("1234"), 1234.0);
        assert_eq!(normalize("-42"), -42.0);
    }

    #[test]
    fn test_single_dot_disambiguation() {
        // Three fractional digits reads as a thousands separator.
        assert_eq!(normalize("1.000"), 1000.0);
        // Anything else is a plain decimal point.
        assert_eq!(normalize("123.45"), 123.45);
        assert_eq!(normalize("0.5"), 0.5);
    }

    #[test]
    fn test_multiple_dots_are_thousands() {
        assert_eq!(normalize("1.234.567"), 1234567.0);
    }

    #[test]
    fn test_currency_symbols_and_whitespace() {
        assert_eq!(normalize("R$ 1.500,00"), 1500.0);
        assert_eq!(normalize("  R$50,00  "), 50.0);
    }

    #[test]
    fn test_total_on_garbage() {
        for input in ["", "   ", "abc", "R$", "--", "1,2,3.4.5,,", ".", ",", "+-"] {
            let result = normalize(input);
            assert!(result.is_finite(), "normalize({input:?}) must stay finite");
        }
        assert_eq!(normalize("abc"), 0.0);
        assert_eq!(normalize(""), 0.0);
    }

    #[test]
    fn test_normalize_value_union() {
        use serde_json::json;
        assert_eq!(normalize_value(&json!(42.5)), 42.5);
        assert_eq!(normalize_value(&json!("1.500,75")), 1500.75);
        assert_eq!(normalize_value(&json!(null)), 0.0);
        assert_eq!(normalize_value(&json!(true)), 0.0);
    }
}
