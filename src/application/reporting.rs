use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{BalanceSheet, Cents, DailyTotal, SalesRecord, ServiceCount, Summary};

/// Everything shown for one reporting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialReport {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub summary: Summary,
    pub daily_trend: Vec<DailyTotal>,
    pub top_services: Vec<ServiceCount>,
    pub sales: Vec<SaleLine>,
}

/// One row of the detailed sales listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    /// Empty when the ledger cell held no usable number
    pub invoice_number: String,
    pub date: String,
    pub customer: String,
    pub service: String,
    pub total: Cents,
}

impl From<&SalesRecord> for SaleLine {
    fn from(record: &SalesRecord) -> Self {
        Self {
            invoice_number: record
                .invoice_number
                .map(|n| n.to_string())
                .unwrap_or_default(),
            date: record.date.clone(),
            customer: record.customer.clone(),
            service: record.service.clone(),
            total: record.line_total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    pub as_of: NaiveDate,
    pub sheet: BalanceSheet,
}
