//! Engineering units, SI prefixes and coefficient formatting.

/// Parse a component value with an optional SI suffix.
///
/// Supported suffixes (case-insensitive): T, G, MEG, K, M (milli), U, N, P, F.
/// A trailing unit name after the suffix is ignored (`4.7kOhm`, `10uF`).
pub fn parse_value(s: &str) -> Option<f64> {
    let s = s.trim().to_uppercase();

    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+' && c != 'E')
        .unwrap_or(s.len());

    if num_end == 0 {
        return None;
    }

    let (num_str, suffix) = s.split_at(num_end);
    let value: f64 = num_str.parse().ok()?;

    let (multiplier, rest) = if let Some(rest) = suffix.strip_prefix("MEG") {
        (1e6, rest)
    } else {
        let mut chars = suffix.chars();
        let multiplier = match chars.next() {
            Some('T') => 1e12,
            Some('G') => 1e9,
            Some('K') => 1e3,
            Some('M') => 1e-3,
            Some('U') => 1e-6,
            Some('N') => 1e-9,
            Some('P') => 1e-12,
            Some('F') => 1e-15,
            _ => return None,
        };
        (multiplier, chars.as_str())
    };

    if !rest.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(value * multiplier)
}

/// Format a value with an SI prefix.
pub fn format_value(value: f64) -> String {
    let abs_value = value.abs();

    let (scaled, suffix) = if abs_value >= 1e12 {
        (value / 1e12, "T")
    } else if abs_value >= 1e9 {
        (value / 1e9, "G")
    } else if abs_value >= 1e6 {
        (value / 1e6, "M")
    } else if abs_value >= 1e3 {
        (value / 1e3, "k")
    } else if abs_value >= 1.0 || abs_value == 0.0 {
        (value, "")
    } else if abs_value >= 1e-3 {
        (value * 1e3, "m")
    } else if abs_value >= 1e-6 {
        (value * 1e6, "u")
    } else if abs_value >= 1e-9 {
        (value * 1e9, "n")
    } else if abs_value >= 1e-12 {
        (value * 1e12, "p")
    } else if abs_value >= 1e-15 {
        (value * 1e15, "f")
    } else {
        (value, "")
    };

    format!("{}{}", format_coefficient(scaled), suffix)
}

/// Compact decimal rendering used in symbolic expressions.
///
/// Integers print without a fractional part, other values with up to six
/// decimals (trailing zeros dropped), very large or small magnitudes in
/// exponent form.
pub fn format_coefficient(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let abs_value = value.abs();
    if abs_value == 0.0 {
        return "0".to_string();
    }
    if abs_value >= 1e9 || abs_value < 1e-4 {
        let formatted = format!("{:.6e}", value);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
            return format!("{mantissa}e{exponent}");
        }
        return formatted;
    }
    let rounded = format!("{:.6}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|v| (v - b).abs() < b.abs() * 1e-10 + 1e-20)
    }

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_value("1.5"), Some(1.5));
        assert_eq!(parse_value("-2.5"), Some(-2.5));
        assert_eq!(parse_value("1e-3"), Some(1e-3));
    }

    #[test]
    fn test_parse_with_suffix() {
        assert!(approx_eq(parse_value("1k"), 1e3));
        assert!(approx_eq(parse_value("4.7K"), 4.7e3));
        assert!(approx_eq(parse_value("10M"), 10e-3));
        assert!(approx_eq(parse_value("10MEG"), 10e6));
        assert!(approx_eq(parse_value("100n"), 100e-9));
        assert!(approx_eq(parse_value("1u"), 1e-6));
        assert!(approx_eq(parse_value("10p"), 10e-12));
        assert!(approx_eq(parse_value("10uF"), 10e-6));
        assert!(approx_eq(parse_value("2kOhm"), 2e3));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("1k2"), None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1000.0), "1k");
        assert_eq!(format_value(0.001), "1m");
        assert_eq!(format_value(4.7e-9), "4.7n");
        assert_eq!(format_value(0.0), "0");
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(10.0), "10");
        assert_eq!(format_coefficient(-2.5), "-2.5");
        assert_eq!(format_coefficient(0.1), "0.1");
        assert_eq!(format_coefficient(1.0 / 3.0), "0.333333");
        assert_eq!(format_coefficient(10.000000000000002), "10");
        assert_eq!(format_coefficient(2e-6), "2e-6");
        assert_eq!(format_coefficient(-1e-13), "-1e-13");
    }
}
