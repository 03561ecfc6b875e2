use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Cents, TaxRate};

pub type CatalogId = u64;

/// A billable service or item with its base price and GST rate.
/// Items are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogId,
    pub name: String,
    /// Price before GST
    pub unit_price: Cents,
    pub tax_rate: TaxRate,
}

impl CatalogItem {
    pub fn new(id: CatalogId, name: impl Into<String>, unit_price: Cents, tax_rate: TaxRate) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            tax_rate,
        }
    }

    /// Price including GST.
    pub fn line_total(&self) -> Cents {
        self.tax_rate.apply(self.unit_price)
    }
}

/// Check the fields of a catalog item before it is stored.
pub fn validate_new_item(
    name: &str,
    unit_price: Cents,
    tax_rate: TaxRate,
) -> Result<(), ItemValidationError> {
    if name.trim().is_empty() {
        return Err(ItemValidationError::EmptyName);
    }
    if unit_price < 0 {
        return Err(ItemValidationError::NegativePrice(unit_price));
    }
    if !tax_rate.is_valid_gst() {
        return Err(ItemValidationError::TaxRateOutOfRange(tax_rate));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyName,
    NegativePrice(Cents),
    TaxRateOutOfRange(TaxRate),
}

impl fmt::Display for ItemValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValidationError::EmptyName => write!(f, "item name is required"),
            ItemValidationError::NegativePrice(price) => {
                write!(f, "price cannot be negative ({})", super::format_cents(*price))
            }
            ItemValidationError::TaxRateOutOfRange(rate) => {
                write!(f, "GST rate {} is outside 0% to 28%", rate)
            }
        }
    }
}

impl std::error::Error for ItemValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_includes_gst() {
        let item = CatalogItem::new(1, "Haircut", 10000, TaxRate::from_bps(1800));
        assert_eq!(item.line_total(), 11800);
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        assert!(validate_new_item("Facial", 0, TaxRate::zero()).is_ok());
        assert!(validate_new_item("Facial", 150000, TaxRate::from_bps(2800)).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert_eq!(
            validate_new_item("   ", 100, TaxRate::zero()),
            Err(ItemValidationError::EmptyName)
        );
        assert_eq!(
            validate_new_item("Wax", -1, TaxRate::zero()),
            Err(ItemValidationError::NegativePrice(-1))
        );
        assert!(matches!(
            validate_new_item("Wax", 100, TaxRate::from_bps(3000)),
            Err(ItemValidationError::TaxRateOutOfRange(_))
        ));
    }
}
