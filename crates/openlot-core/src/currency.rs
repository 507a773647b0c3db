//! Currency conversion and display formatting.
//!
//! Conversion goes through a fixed base-currency (USD) rate table in two
//! hops: amount -> base -> target. The pair of functions here is pure and
//! side-effect free.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Rendered when a price is absent rather than erroring out of display.
pub const MISSING_PRICE_PLACEHOLDER: &str = "TBD";

/// Value of one unit of each supported currency in USD.
static RATES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("USD", 1.0),
        ("EUR", 1.09),
        ("GBP", 1.27),
        ("CAD", 0.74),
        ("AUD", 0.66),
        ("CHF", 1.13),
        ("JPY", 0.0067),
        ("CNY", 0.14),
        ("INR", 0.012),
        ("AED", 0.2723),
        ("SAR", 0.2666),
    ])
});

static SYMBOLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("USD", "$"),
        ("EUR", "€"),
        ("GBP", "£"),
        ("CAD", "CA$"),
        ("AUD", "A$"),
        ("CHF", "CHF "),
        ("JPY", "¥"),
        ("CNY", "CN¥"),
        ("INR", "₹"),
        ("AED", "AED "),
        ("SAR", "SAR "),
    ])
});

/// Rate for a code, falling back to 1.0 (base-equivalent) for unknown
/// codes so display degrades instead of failing.
fn rate(code: &str) -> f64 {
    RATES.get(code).copied().unwrap_or(1.0)
}

/// Converts `amount` from one currency code to another.
///
/// Identical codes short-circuit to the identity, which also avoids
/// floating-point drift on the common case.
pub fn convert(amount: f64, from: &str, to: &str) -> f64 {
    if from == to {
        return amount;
    }
    let in_base = amount * rate(from);
    in_base / rate(to)
}

/// Renders a price for display in the given currency.
///
/// An absent amount renders the `"TBD"` sentinel rather than panicking;
/// present amounts are rounded to whole units and grouped by thousands.
pub fn format(amount: Option<f64>, code: &str) -> String {
    let Some(amount) = amount else {
        return MISSING_PRICE_PLACEHOLDER.to_string();
    };
    let symbol = SYMBOLS.get(code).copied().unwrap_or("");
    if symbol.is_empty() {
        format!("{} {}", group_thousands(amount), code)
    } else {
        format!("{}{}", symbol, group_thousands(amount))
    }
}

fn group_thousands(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion_is_exact() {
        for code in ["USD", "EUR", "JPY", "XXX"] {
            for amount in [0.0, 1.0, 18_500.0, 0.333] {
                assert_eq!(convert(amount, code, code), amount);
            }
        }
    }

    #[test]
    fn round_trip_is_within_tolerance() {
        let codes = ["USD", "EUR", "GBP", "JPY", "AED"];
        for from in codes {
            for to in codes {
                for amount in [1.0, 999.99, 250_000.0] {
                    let back = convert(convert(amount, from, to), to, from);
                    assert!(
                        (back - amount).abs() < 1e-6 * amount.max(1.0),
                        "{from}->{to} drifted: {amount} vs {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn unknown_code_falls_back_to_base() {
        assert_eq!(convert(100.0, "XYZ", "USD"), 100.0);
        assert_eq!(convert(100.0, "USD", "XYZ"), 100.0);
    }

    #[test]
    fn conversion_goes_through_base() {
        // 100 EUR -> USD -> GBP
        let expected = 100.0 * 1.09 / 1.27;
        assert!((convert(100.0, "EUR", "GBP") - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_amount_renders_placeholder() {
        assert_eq!(format(None, "USD"), "TBD");
    }

    #[test]
    fn amounts_are_symbol_prefixed_and_grouped() {
        assert_eq!(format(Some(18_500.0), "USD"), "$18,500");
        assert_eq!(format(Some(1_234_567.0), "EUR"), "€1,234,567");
        assert_eq!(format(Some(950.0), "GBP"), "£950");
    }

    #[test]
    fn unknown_code_renders_code_suffix() {
        assert_eq!(format(Some(1_000.0), "XYZ"), "1,000 XYZ");
    }
}
