/// Human-readable number formatting
///
/// Used for coin balances and leaderboard scores shown in the dashboard.
///
/// # Rules
///
/// - Values below 1000 are shown as-is, with at most two decimals
/// - Larger values are abbreviated to one decimal with a `K`, `M`, `B` or `T` suffix
/// - A trailing `.0` is dropped (`2M`, not `2.0M`)
///
/// # Example
///
/// ```
/// use mythicaldash_shared::format::format_number;
///
/// assert_eq!(format_number(999.0), "999");
/// assert_eq!(format_number(1500.0), "1.5K");
/// assert_eq!(format_number(2_000_000.0), "2M");
/// ```

const SUFFIXES: [(f64, &str); 4] = [(1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];

/// Formats a number into an abbreviated string
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    // Branch on the displayed value, so 999.996 becomes 1K rather than 1000
    let cents = (value * 100.0).round() / 100.0;
    if cents == 0.0 {
        return "0".to_string();
    }
    if cents.abs() < 1e3 {
        return trim_decimals(format!("{:.2}", cents));
    }

    let abs = value.abs();

    // Pick the largest suffix not exceeding the value, then promote when
    // rounding pushes it to 1000 of that unit (999_950 -> 1M, not 1000K).
    let mut index = SUFFIXES
        .iter()
        .rposition(|(divisor, _)| abs >= *divisor)
        .unwrap_or(0);

    let mut scaled = round_one(value / SUFFIXES[index].0);
    if scaled.abs() >= 1e3 && index + 1 < SUFFIXES.len() {
        index += 1;
        scaled = round_one(value / SUFFIXES[index].0);
    }

    format!("{}{}", trim_decimals(format!("{:.1}", scaled)), SUFFIXES[index].1)
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn trim_decimals(formatted: String) -> String {
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(3.14159), "3.14");
    }

    #[test]
    fn test_abbreviated_values() {
        assert_eq!(format_number(1000.0), "1K");
        assert_eq!(format_number(1500.0), "1.5K");
        assert_eq!(format_number(2_000_000.0), "2M");
        assert_eq!(format_number(1_240_000_000.0), "1.2B");
        assert_eq!(format_number(7_000_000_000_000.0), "7T");
    }

    #[test]
    fn test_rounding_promotes_suffix() {
        assert_eq!(format_number(999_960.0), "1M");
        assert_eq!(format_number(999.996), "1K");
        assert_eq!(format_number(-999.999), "-1K");
        assert_eq!(format_number(999.994), "999.99");
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(format_number(-1500.0), "-1.5K");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(-0.001), "0");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_number(f64::NAN), "0");
        assert_eq!(format_number(f64::INFINITY), "0");
    }
}
