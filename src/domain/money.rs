use std::fmt;

use serde::{Deserialize, Serialize};

/// Money is represented as integer cents (paise) to avoid floating-point precision issues.
/// ₹50.00 = 5000 cents.
pub type Cents = i64;

/// Symbol used on rendered documents.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Highest GST slab accepted for a catalog item, in basis points (28%).
pub const MAX_TAX_RATE_BPS: u32 = 2800;

/// Format cents as a plain decimal string, the way ledger cells store it.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Format cents for display on documents, with currency symbol and thousands separators.
/// Example: 123450 -> "₹1,234.50"
pub fn format_money(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = (abs_cents / 100).to_string();
    let remainder = abs_cents % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}.{:02}", sign, CURRENCY_SYMBOL, grouped, remainder)
}

/// Sum amounts, clamping at the bounds of [`Cents`] instead of overflowing.
pub fn sum_cents(amounts: impl IntoIterator<Item = Cents>) -> Cents {
    amounts.into_iter().fold(0, Cents::saturating_add)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            // No decimal point, treat as whole units
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParseCentsError::InvalidFormat)?;
            let cents = units
                .checked_mul(100)
                .ok_or(ParseCentsError::OutOfRange)?;
            Ok(if negative { -cents } else { cents })
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?
            };

            let decimal_str = parts[1];
            if !decimal_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParseCentsError::InvalidFormat);
            }
            let decimal_cents: i64 = match decimal_str.len() {
                0 => 0,
                // Single digit like "5" means 50 cents
                1 => decimal_str
                    .parse::<i64>()
                    .map_err(|_| ParseCentsError::InvalidFormat)?
                    * 10,
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
                // More than 2 decimal places - truncate
                _ => decimal_str[..2]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
            };

            let cents = units
                .checked_mul(100)
                .and_then(|c| c.checked_add(decimal_cents))
                .ok_or(ParseCentsError::OutOfRange)?;
            Ok(if negative { -cents } else { cents })
        }
        _ => Err(ParseCentsError::InvalidFormat),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    OutOfRange,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid number format"),
            ParseCentsError::OutOfRange => write!(f, "value out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

/// GST rate represented in basis points (1 bps = 0.01%), so 1800 = 18%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    pub const fn zero() -> Self {
        TaxRate(0)
    }

    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Parse a percentage such as "18", "18.0" or "12.5".
    pub fn parse_percent(input: &str) -> Result<Self, ParseCentsError> {
        let hundredths = parse_cents(input)?;
        u32::try_from(hundredths)
            .map(TaxRate)
            .map_err(|_| ParseCentsError::OutOfRange)
    }

    /// Whether the rate falls inside the accepted GST slabs (0% to 28%).
    pub fn is_valid_gst(&self) -> bool {
        self.0 <= MAX_TAX_RATE_BPS
    }

    /// Tax owed on `amount`, rounded half up to the nearest cent.
    pub fn tax_on(&self, amount: Cents) -> Cents {
        let scaled = amount as i128 * self.0 as i128;
        let tax = (scaled + 5_000).div_euclid(10_000);
        Cents::try_from(tax).unwrap_or(if tax < 0 { Cents::MIN } else { Cents::MAX })
    }

    /// `amount` with tax added: `amount * (1 + rate / 100)`.
    pub fn apply(&self, amount: Cents) -> Cents {
        amount.saturating_add(self.tax_on(amount))
    }

    /// Plain percentage as stored in ledger cells, e.g. "18.00".
    pub fn to_cell(&self) -> String {
        format_cents(self.0 as Cents)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}
