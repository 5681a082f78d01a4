//! Denomination helpers: decimal strings <-> minimal units.
//!
//! The native asset uses 18 decimal places (wei). Tokens carry their own
//! decimal count on the selected asset.

/// Decimal places of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest decimal count a `u128` amount can represent a unit of.
const MAX_DECIMALS: u8 = 38;

/// Returns true when `input` is a plain non-negative decimal number:
/// digits with at most one `.`, and at least one digit overall.
/// Accepts "1", "1.5", ".5" and "1.".
#[must_use]
pub fn is_decimal(input: &str) -> bool {
    let input = input.trim();
    !input.is_empty()
        && input.chars().all(|c| c.is_ascii_digit() || c == '.')
        && input.matches('.').count() <= 1
        && input.chars().any(|c| c.is_ascii_digit())
}

/// Parse a human-readable decimal amount into minimal units.
/// Examples with 18 decimals: "1" -> 10^18, "0.5" -> 5 * 10^17.
#[must_use = "parsing result should be checked"]
pub fn to_minimal_unit(input: &str, decimals: u8) -> Result<u128, String> {
    let input = input.trim();

    if input.is_empty() {
        return Err("Amount cannot be empty".to_string());
    }
    if input.starts_with('-') {
        return Err("Amount must be positive".to_string());
    }
    if !is_decimal(input) {
        return Err(format!("Invalid amount '{input}'"));
    }
    if decimals > MAX_DECIMALS {
        return Err(format!("Unsupported decimal count {decimals}"));
    }

    let (whole_str, frac_str) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    let whole: u128 = if whole_str.is_empty() {
        0
    } else {
        whole_str
            .parse()
            .map_err(|_| format!("Invalid whole part: '{whole_str}'"))?
    };

    if frac_str.len() > decimals as usize {
        return Err(format!(
            "Too many decimal places. This asset supports up to {decimals}."
        ));
    }

    let frac: u128 = if frac_str.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac_str, width = decimals as usize);
        padded
            .parse()
            .map_err(|_| format!("Invalid fractional part: '{frac_str}'"))?
    };

    let unit = 10u128.pow(decimals as u32);
    whole
        .checked_mul(unit)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| "Amount too large".to_string())
}

/// Convert minimal units into the shortest decimal string.
/// Examples with 18 decimals: 10^18 -> "1", 999999979000000000 -> "0.999999979", 0 -> "0".
#[must_use]
pub fn from_minimal_unit(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let decimals = decimals.min(MAX_DECIMALS);
    let unit = 10u128.pow(decimals as u32);
    let whole = amount / unit;
    let frac = amount % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Format an amount with its symbol for display, e.g. "1.5 ETH".
#[must_use]
pub fn format_amount(amount: u128, decimals: u8, symbol: &str) -> String {
    format!("{} {symbol}", from_minimal_unit(amount, decimals))
}

/// Return `data` with a canonical lowercase `0x` prefix.
#[must_use]
pub fn add_hex_prefix(data: &str) -> String {
    let data = data.trim();
    match data.strip_prefix("0x").or_else(|| data.strip_prefix("0X")) {
        Some(rest) => format!("0x{rest}"),
        None => format!("0x{data}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_ETH: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn decimal_accepts_plain_numbers() {
        assert!(is_decimal("1"));
        assert!(is_decimal("1.5"));
        assert!(is_decimal(".5"));
        assert!(is_decimal("1."));
        assert!(is_decimal(" 0.001 "));
    }

    #[test]
    fn decimal_rejects_garbage() {
        assert!(!is_decimal(""));
        assert!(!is_decimal("."));
        assert!(!is_decimal("abc"));
        assert!(!is_decimal("1.2.3"));
        assert!(!is_decimal("-1"));
        assert!(!is_decimal("1e18"));
    }

    #[test]
    fn parse_whole_number() {
        assert_eq!(to_minimal_unit("1", NATIVE_DECIMALS).unwrap(), ONE_ETH);
    }

    #[test]
    fn parse_decimal() {
        assert_eq!(to_minimal_unit("1.5", NATIVE_DECIMALS).unwrap(), ONE_ETH * 3 / 2);
    }

    #[test]
    fn parse_leading_dot() {
        assert_eq!(to_minimal_unit(".25", 2).unwrap(), 25);
    }

    #[test]
    fn parse_trailing_dot() {
        assert_eq!(to_minimal_unit("7.", 6).unwrap(), 7_000_000);
    }

    #[test]
    fn parse_token_decimals() {
        assert_eq!(to_minimal_unit("12.345678", 6).unwrap(), 12_345_678);
        assert_eq!(to_minimal_unit("3", 0).unwrap(), 3);
    }

    #[test]
    fn parse_too_many_decimals() {
        assert!(to_minimal_unit("1.1234567", 6).is_err());
        assert!(to_minimal_unit("1.5", 0).is_err());
    }

    #[test]
    fn parse_negative_fails() {
        assert!(to_minimal_unit("-0.5", NATIVE_DECIMALS).is_err());
    }

    #[test]
    fn parse_overflow_fails() {
        let huge = "1".repeat(30);
        assert!(to_minimal_unit(&huge, NATIVE_DECIMALS).is_err());
    }

    #[test]
    fn parse_empty_fails() {
        assert!(to_minimal_unit("  ", NATIVE_DECIMALS).is_err());
    }

    #[test]
    fn readable_whole() {
        assert_eq!(from_minimal_unit(ONE_ETH, NATIVE_DECIMALS), "1");
        assert_eq!(from_minimal_unit(0, NATIVE_DECIMALS), "0");
    }

    #[test]
    fn readable_fraction_is_trimmed() {
        assert_eq!(
            from_minimal_unit(999_999_979_000_000_000, NATIVE_DECIMALS),
            "0.999999979"
        );
        assert_eq!(from_minimal_unit(1, NATIVE_DECIMALS), "0.000000000000000001");
        assert_eq!(from_minimal_unit(12_500_000, 6), "12.5");
    }

    #[test]
    fn readable_zero_decimals() {
        assert_eq!(from_minimal_unit(42, 0), "42");
    }

    #[test]
    fn format_amount_with_symbol() {
        assert_eq!(format_amount(ONE_ETH / 2, NATIVE_DECIMALS, "ETH"), "0.5 ETH");
    }

    #[test]
    fn hex_prefix_added_once() {
        assert_eq!(add_hex_prefix("abcd"), "0xabcd");
        assert_eq!(add_hex_prefix("0xabcd"), "0xabcd");
        assert_eq!(add_hex_prefix("0Xabcd"), "0xabcd");
        assert_eq!(add_hex_prefix(""), "0x");
    }
}
