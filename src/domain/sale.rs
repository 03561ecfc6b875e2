use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{parse_ledger_date, sum_cents, CartLine, CartTotals, Cents, TaxRate};

pub type InvoiceNumber = u64;

/// Number given to the first invoice of an empty ledger.
pub const FIRST_INVOICE_NUMBER: InvoiceNumber = 1001;

/// Timestamp format written to the sales ledger (second precision).
pub const SALE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One billed line of an invoice as stored in the sales ledger.
/// An invoice with N items is N records sharing `invoice_number` and `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// `None` when the stored cell is not a number (legacy rows)
    pub invoice_number: Option<InvoiceNumber>,
    /// Stored timestamp text, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`
    pub date: String,
    pub customer: String,
    pub service: String,
    pub unit_price: Cents,
    pub tax_rate: TaxRate,
    pub line_total: Cents,
}

impl SalesRecord {
    pub fn from_cart_line(
        invoice_number: InvoiceNumber,
        timestamp: NaiveDateTime,
        customer: &str,
        line: &CartLine,
    ) -> Self {
        Self {
            invoice_number: Some(invoice_number),
            date: timestamp.format(SALE_TIMESTAMP_FORMAT).to_string(),
            customer: customer.to_string(),
            service: line.name.clone(),
            unit_price: line.unit_price,
            tax_rate: line.tax_rate,
            line_total: line.line_total,
        }
    }

    /// Calendar date of the sale, ignoring time of day.
    pub fn sale_date(&self) -> Option<NaiveDate> {
        parse_ledger_date(&self.date)
    }

    pub fn tax_amount(&self) -> Cents {
        self.line_total.saturating_sub(self.unit_price)
    }
}

/// Next invoice number: one past the highest number on record, or
/// [`FIRST_INVOICE_NUMBER`] when no record carries a usable number.
/// `None` when the highest number on record cannot be incremented.
pub fn next_invoice_number<'a>(
    records: impl IntoIterator<Item = &'a SalesRecord>,
) -> Option<InvoiceNumber> {
    match records.into_iter().filter_map(|r| r.invoice_number).max() {
        Some(max) => max.checked_add(1),
        None => Some(FIRST_INVOICE_NUMBER),
    }
}

/// Parse an invoice number cell. Accepts "1001" as well as "1001.0",
/// which spreadsheet tools write when the column holds blanks.
pub fn parse_invoice_number(cell: &str) -> Option<InvoiceNumber> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<InvoiceNumber>() {
        return (n > 0).then_some(n);
    }
    let (whole, frac) = cell.split_once('.')?;
    if frac.is_empty() || !frac.chars().all(|c| c == '0') {
        return None;
    }
    whole.parse::<InvoiceNumber>().ok().filter(|n| *n > 0)
}

/// A committed invoice: its number, shared timestamp, customer details and rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub number: InvoiceNumber,
    pub timestamp: String,
    pub customer: String,
    pub address: String,
    pub contact: String,
    pub lines: Vec<SalesRecord>,
    pub totals: CartTotals,
}

impl Invoice {
    /// Rebuild an invoice from its ledger rows. Address and contact are not
    /// kept in the ledger and come back empty.
    pub fn from_records(number: InvoiceNumber, lines: Vec<SalesRecord>) -> Option<Self> {
        let first = lines.first()?;
        let timestamp = first.date.clone();
        let customer = first.customer.clone();
        let totals = totals_of(&lines);
        Some(Self {
            number,
            timestamp,
            customer,
            address: String::new(),
            contact: String::new(),
            lines,
            totals,
        })
    }
}

pub(crate) fn totals_of(lines: &[SalesRecord]) -> CartTotals {
    let subtotal = sum_cents(lines.iter().map(|l| l.unit_price));
    let grand_total = sum_cents(lines.iter().map(|l| l.line_total));
    CartTotals {
        subtotal,
        tax_total: grand_total.saturating_sub(subtotal),
        grand_total,
    }
}
