use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{parse_ledger_date, Cents};

/// Date format used for expense rows written by this crate.
pub const EXPENSE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A business expense. Expense rows come from outside the billing flow
/// (hand-edited ledger or CSV import).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Stored date text, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    pub description: String,
    pub amount: Cents,
}

impl ExpenseRecord {
    pub fn new(date: impl Into<String>, description: impl Into<String>, amount: Cents) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
        }
    }

    pub fn expense_date(&self) -> Option<NaiveDate> {
        parse_ledger_date(&self.date)
    }
}
