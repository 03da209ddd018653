//! Display helpers for metric values.
//!
//! Disclosure figures are reported in lakhs and use Indian digit grouping
//! (`12,34,567`); these helpers render values the same way for terminal
//! summaries.

use crate::models::ValueKind;

/// Format a floating-point number with Indian digit grouping and a fixed
/// number of decimal places.
///
/// # Examples
///
/// ```
/// use holdings_core::formatting::format_indian;
///
/// assert_eq!(format_indian(1234.5, 1), "1,234.5");
/// assert_eq!(format_indian(1234567.0, 0), "12,34,567");
/// assert_eq!(format_indian(0.0, 2), "0.00");
/// assert_eq!(format_indian(-98765.5, 1), "-98,765.5");
/// ```
pub fn format_indian(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a tiny epsilon so exact midpoints round away from zero.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_indian(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.25" → ".25"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a share of net assets already expressed in percent.
///
/// # Examples
///
/// ```
/// use holdings_core::formatting::format_percent;
///
/// assert_eq!(format_percent(1.2), "1.20%");
/// assert_eq!(format_percent(0.0), "0.00%");
/// ```
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_indian(value, 2))
}

/// Render `value` according to its column's [`ValueKind`].
pub fn format_value(kind: ValueKind, value: f64) -> String {
    match kind {
        ValueKind::Count => format_indian(value, 0),
        ValueKind::Currency => format_indian(value, 2),
        ValueKind::Percentage => format_percent(value),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Group an integer string Indian-style: the last three digits, then pairs.
fn group_indian(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let (head, tail) = s.split_at(s.len() - 3);
    let chars: Vec<char> = head.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 2);
    let remainder = chars.len() % 2;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 2 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result.push(',');
    result.push_str(tail);
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
