use std::{fmt, str::FromStr};

use crate::EngineError;

/// Signed amount of Kenyan shillings represented as **integer cents**.
///
/// Backend records carry prices and balances as `*_minor` integers; this type
/// only adds parsing of user input and display.
///
/// ```rust
/// use engine::Money;
///
/// let price = Money::new(125_050);
/// assert_eq!(price.to_string(), "KES 1,250.50");
/// assert_eq!("12,5".parse::<Money>().unwrap().minor(), 1250);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Whole shillings, as used by mobile-money requests.
    #[must_use]
    pub fn from_whole(shillings: u64) -> Self {
        Self(i64::try_from(shillings).unwrap_or(i64::MAX / 100).saturating_mul(100))
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = group_thousands(abs / 100);
        let cents = abs % 100;
        write!(f, "{sign}KES {whole}.{cents:02}")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a non-negative decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and at most 2 fractional
    /// digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::validation("Enter a valid amount.");

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::validation("Enter an amount."));
        }

        let normalized = trimmed.replace(',', ".");
        let mut parts = normalized.split('.');
        let whole_str = parts.next().ok_or_else(invalid)?;
        let cents_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }
        if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: i64 = whole_str.parse().map_err(|_| invalid())?;

        let cents: i64 = match cents_str {
            None | Some("") => 0,
            Some(frac) if !frac.chars().all(|c| c.is_ascii_digit()) => return Err(invalid()),
            Some(frac) if frac.len() == 1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            Some(frac) if frac.len() == 2 => frac.parse::<i64>().map_err(|_| invalid())?,
            Some(_) => return Err(EngineError::validation("Use at most two decimals.")),
        };

        whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Money)
            .ok_or_else(|| EngineError::validation("Amount is too large."))
    }
}

/// Parses a whole-shilling amount (mobile money does not move cents).
pub fn parse_whole(input: &str) -> Result<u64, EngineError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation("Enter an amount."));
    }
    let amount: u64 = trimmed
        .parse()
        .map_err(|_| EngineError::validation("Enter a whole number of shillings."))?;
    if amount == 0 {
        return Err(EngineError::validation("Amount must be greater than zero."));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_kes() {
        assert_eq!(Money::new(0).to_string(), "KES 0.00");
        assert_eq!(Money::new(5).to_string(), "KES 0.05");
        assert_eq!(Money::new(100_000).to_string(), "KES 1,000.00");
        assert_eq!(Money::new(123_456_789).to_string(), "KES 1,234,567.89");
        assert_eq!(Money::new(-1050).to_string(), "-KES 10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_signs_and_extra_decimals() {
        assert!("-1".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn whole_amounts() {
        assert_eq!(parse_whole(" 500 ").unwrap(), 500);
        assert!(parse_whole("0").is_err());
        assert!(parse_whole("12.5").is_err());
        assert_eq!(Money::from_whole(500).minor(), 50_000);
    }
}
