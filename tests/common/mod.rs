// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;
use tillbook::application::LedgerService;
use tillbook::config::DataPaths;
use tillbook::domain::{CatalogItem, TaxRate};

pub const SALES_HEADER: &str = "invoice_no,date,customer,service,price,gst,total\n";
pub const EXPENSES_HEADER: &str = "date,description,amount\n";

/// Helper to create a test service over empty ledgers in a temporary directory
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::open(DataPaths::new(temp_dir.path())).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn day(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to parse a `YYYY-MM-DD HH:MM:SS` string into NaiveDateTime
pub fn at(timestamp: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Replace the sales ledger with the given data rows (header added)
pub fn write_sales(service: &LedgerService, rows: &str) -> Result<()> {
    std::fs::write(service.paths().sales_file(), format!("{SALES_HEADER}{rows}"))?;
    Ok(())
}

/// Replace the expense ledger with the given data rows (header added)
pub fn write_expenses(service: &LedgerService, rows: &str) -> Result<()> {
    std::fs::write(
        service.paths().expenses_file(),
        format!("{EXPENSES_HEADER}{rows}"),
    )?;
    Ok(())
}

/// Test fixture: a small salon catalog
pub struct StandardCatalog;

impl StandardCatalog {
    /// Haircut ₹100 @ 18%, Facial ₹500 @ 18%, Manicure ₹50 @ 12%
    pub async fn create(service: &LedgerService) -> Result<Vec<CatalogItem>> {
        let rate = |bps| TaxRate::from_bps(bps);
        Ok(vec![
            service.add_item("Haircut", 10000, rate(1800)).await?,
            service.add_item("Facial", 50000, rate(1800)).await?,
            service.add_item("Manicure", 5000, rate(1200)).await?,
        ])
    }
}
