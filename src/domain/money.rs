use std::fmt;

/// Hourly rates and accrued costs are plain currency units.
/// Rates are real numbers (e.g. 37.5 per hour), so unlike whole-cent ledgers
/// the arithmetic stays in floating point and only display is rounded.
pub type Rate = f64;

/// Format an amount as a human-readable currency string with two decimals.
/// Example: 30.0 -> "30.00", 12.345 -> "12.35"
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Parse a decimal string into an hourly rate.
/// Example: "50" -> 50.0, "12.5" -> 12.5, " 7.25 " -> 7.25
///
/// Negative values parse successfully; whether they are usable is a roster
/// decision, not a parsing one.
pub fn parse_rate(input: &str) -> Result<Rate, ParseRateError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseRateError::Empty);
    }

    let rate: f64 = input.parse().map_err(|_| ParseRateError::InvalidFormat)?;
    if !rate.is_finite() {
        return Err(ParseRateError::InvalidFormat);
    }
    Ok(rate)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseRateError {
    Empty,
    InvalidFormat,
}

impl fmt::Display for ParseRateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRateError::Empty => write!(f, "rate is empty"),
            ParseRateError::InvalidFormat => write!(f, "invalid rate format"),
        }
    }
}

impl std::error::Error for ParseRateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(30.0), "30.00");
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(12.345), "12.35");
        assert_eq!(format_amount(1234.5), "1234.50");
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("50"), Ok(50.0));
        assert_eq!(parse_rate("12.5"), Ok(12.5));
        assert_eq!(parse_rate(" 7.25 "), Ok(7.25));
        assert_eq!(parse_rate("0"), Ok(0.0));
        assert_eq!(parse_rate("-10"), Ok(-10.0));
    }

    #[test]
    fn test_parse_rate_invalid() {
        assert_eq!(parse_rate(""), Err(ParseRateError::Empty));
        assert_eq!(parse_rate("   "), Err(ParseRateError::Empty));
        assert_eq!(parse_rate("abc"), Err(ParseRateError::InvalidFormat));
        assert_eq!(parse_rate("inf"), Err(ParseRateError::InvalidFormat));
        assert_eq!(parse_rate("NaN"), Err(ParseRateError::InvalidFormat));
    }
}
