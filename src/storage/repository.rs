use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::{ByteRecord, StringRecord};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::DataPaths;
use crate::domain::{
    format_cents, next_invoice_number, parse_cents, parse_invoice_number, CatalogId, CatalogItem,
    Cents, ExpenseRecord, InvoiceNumber, SalesRecord, TaxRate,
};

use super::{CATALOG_COLUMNS, EXPENSE_COLUMNS, SALES_COLUMNS};

/// Raw catalog row, column order `id,name,price,gst`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CatalogRow {
    id: String,
    name: String,
    price: String,
    gst: String,
}

/// Raw sales row, column order `invoice_no,date,customer,service,price,gst,total`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct SalesRow {
    invoice_no: String,
    date: String,
    customer: String,
    service: String,
    price: String,
    gst: String,
    total: String,
}

/// Raw expense row, column order `date,description,amount`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ExpenseRow {
    date: String,
    description: String,
    amount: String,
}

impl CatalogRow {
    fn to_item(&self, line: usize) -> Option<CatalogItem> {
        let id = parse_catalog_id(&self.id);
        let price = parse_cents(&self.price).ok();
        let rate = TaxRate::parse_percent(&self.gst).ok();

        match (id, price, rate) {
            (Some(id), Some(price), Some(rate)) => {
                Some(CatalogItem::new(id, self.name.clone(), price, rate))
            }
            _ => {
                tracing::warn!(line, id = %self.id, "skipping unreadable catalog row");
                None
            }
        }
    }
}

impl From<&CatalogItem> for CatalogRow {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            price: format_cents(item.unit_price),
            gst: item.tax_rate.to_cell(),
        }
    }
}

impl SalesRow {
    fn to_record(&self, line: usize) -> SalesRecord {
        SalesRecord {
            invoice_number: parse_invoice_number(&self.invoice_no),
            date: self.date.clone(),
            customer: self.customer.clone(),
            service: self.service.clone(),
            unit_price: cents_or_zero(&self.price, "price", line),
            tax_rate: TaxRate::parse_percent(&self.gst).unwrap_or_else(|_| {
                tracing::warn!(line, value = %self.gst, "unreadable gst cell, using 0");
                TaxRate::zero()
            }),
            line_total: cents_or_zero(&self.total, "total", line),
        }
    }
}

impl From<&SalesRecord> for SalesRow {
    fn from(record: &SalesRecord) -> Self {
        Self {
            invoice_no: record
                .invoice_number
                .map(|n| n.to_string())
                .unwrap_or_default(),
            date: record.date.clone(),
            customer: record.customer.clone(),
            service: record.service.clone(),
            price: format_cents(record.unit_price),
            gst: record.tax_rate.to_cell(),
            total: format_cents(record.line_total),
        }
    }
}

impl ExpenseRow {
    fn to_record(&self, line: usize) -> ExpenseRecord {
        ExpenseRecord {
            date: self.date.clone(),
            description: self.description.clone(),
            amount: cents_or_zero(&self.amount, "amount", line),
        }
    }
}

impl From<&ExpenseRecord> for ExpenseRow {
    fn from(record: &ExpenseRecord) -> Self {
        Self {
            date: record.date.clone(),
            description: record.description.clone(),
            amount: format_cents(record.amount),
        }
    }
}

/// Catalog ids follow the same cell rules as invoice numbers.
fn parse_catalog_id(cell: &str) -> Option<CatalogId> {
    parse_invoice_number(cell)
}

fn cents_or_zero(cell: &str, column: &str, line: usize) -> Cents {
    parse_cents(cell).unwrap_or_else(|_| {
        tracing::warn!(line, column, value = %cell, "unreadable amount cell, using 0");
        0
    })
}

/// Ledger store over the catalog, sales and expense CSV files.
///
/// Each ledger is guarded by its own lock so that read-modify-write cycles
/// within this process never interleave. Writes replace the whole file via a
/// temporary file and rename. Nothing guards against a second process writing
/// the same files.
pub struct Repository {
    paths: DataPaths,
    catalog_lock: Mutex<()>,
    sales_lock: Mutex<()>,
    expenses_lock: Mutex<()>,
}

impl Repository {
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            catalog_lock: Mutex::new(()),
            sales_lock: Mutex::new(()),
            expenses_lock: Mutex::new(()),
        }
    }

    /// Create the directory layout and header-only ledgers where missing.
    pub async fn init(paths: DataPaths) -> Result<Self> {
        for dir in [paths.data_dir(), paths.documents_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        ensure_ledger::<CatalogRow>(&paths.products_file(), &CATALOG_COLUMNS).await?;
        ensure_ledger::<SalesRow>(&paths.sales_file(), &SALES_COLUMNS).await?;
        ensure_ledger::<ExpenseRow>(&paths.expenses_file(), &EXPENSE_COLUMNS).await?;

        Ok(Self::new(paths))
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    // ========================
    // Catalog operations
    // ========================

    /// List catalog items in file order.
    pub async fn list_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        let rows: Vec<LedgerRow<CatalogRow>> =
            read_rows(&self.paths.products_file(), &CATALOG_COLUMNS).await?;
        let items: Vec<CatalogItem> = rows
            .iter()
            .filter_map(|r| r.row.to_item(r.line))
            .collect();
        tracing::debug!(items = items.len(), "loaded catalog");
        Ok(items)
    }

    pub async fn get_catalog_item(&self, id: CatalogId) -> Result<Option<CatalogItem>> {
        Ok(self
            .list_catalog_items()
            .await?
            .into_iter()
            .find(|item| item.id == id))
    }

    /// Append a catalog item under a freshly allocated id.
    pub async fn save_catalog_item(
        &self,
        name: &str,
        unit_price: Cents,
        tax_rate: TaxRate,
    ) -> Result<CatalogItem> {
        let _guard = self.catalog_lock.lock().await;

        let catalog_path = self.paths.products_file();
        let sequence_path = self.paths.catalog_sequence_file();

        let rows: Vec<LedgerRow<CatalogRow>> = read_rows(&catalog_path, &CATALOG_COLUMNS).await?;
        let max_in_file = rows
            .iter()
            .filter_map(|r| parse_catalog_id(&r.row.id))
            .max()
            .unwrap_or(0);
        let last_issued = read_sequence(&sequence_path).await?;
        let highest = max_in_file.max(last_issued);
        let id = highest
            .checked_add(1)
            .ok_or_else(|| anyhow!("Catalog ids exhausted: highest id in use is {}", highest))?;

        let item = CatalogItem::new(id, name, unit_price, tax_rate);
        write_rows(
            &catalog_path,
            &CATALOG_COLUMNS,
            &raw_records(&rows),
            &[CatalogRow::from(&item)],
        )
        .await?;
        write_atomic(&sequence_path, id.to_string().as_bytes()).await?;

        tracing::info!(id, name = %item.name, "added catalog item");
        Ok(item)
    }

    // ========================
    // Sales operations
    // ========================

    pub async fn list_sales(&self) -> Result<Vec<SalesRecord>> {
        let rows: Vec<LedgerRow<SalesRow>> =
            read_rows(&self.paths.sales_file(), &SALES_COLUMNS).await?;
        tracing::debug!(rows = rows.len(), "loaded sales ledger");
        Ok(sales_records(&rows))
    }

    pub async fn list_sales_for_invoice(&self, number: InvoiceNumber) -> Result<Vec<SalesRecord>> {
        Ok(self
            .list_sales()
            .await?
            .into_iter()
            .filter(|r| r.invoice_number == Some(number))
            .collect())
    }

    /// Allocate the next invoice number and append the rows produced by
    /// `build` in one write. Allocation and append share the ledger lock.
    pub async fn save_invoice<F>(&self, build: F) -> Result<Vec<SalesRecord>>
    where
        F: FnOnce(InvoiceNumber) -> Vec<SalesRecord>,
    {
        let _guard = self.sales_lock.lock().await;

        let path = self.paths.sales_file();
        let rows: Vec<LedgerRow<SalesRow>> = read_rows(&path, &SALES_COLUMNS).await?;
        let existing = sales_records(&rows);
        let number = next_invoice_number(&existing).ok_or_else(|| {
            anyhow!("Invoice numbers exhausted: {} already holds the highest number", path.display())
        })?;

        let records = build(number);
        let appended: Vec<SalesRow> = records.iter().map(SalesRow::from).collect();
        write_rows(&path, &SALES_COLUMNS, &raw_records(&rows), &appended).await?;

        tracing::info!(invoice = number, rows = records.len(), "saved invoice");
        Ok(records)
    }

    /// Remove every row of an invoice. Returns the number of rows removed.
    pub async fn delete_invoice(&self, number: InvoiceNumber) -> Result<usize> {
        let _guard = self.sales_lock.lock().await;

        let path = self.paths.sales_file();
        let mut rows: Vec<LedgerRow<SalesRow>> = read_rows(&path, &SALES_COLUMNS).await?;
        let before = rows.len();
        rows.retain(|r| parse_invoice_number(&r.row.invoice_no) != Some(number));
        let removed = before - rows.len();

        if removed > 0 {
            write_rows::<SalesRow>(&path, &SALES_COLUMNS, &raw_records(&rows), &[]).await?;
            tracing::info!(invoice = number, rows = removed, "deleted invoice");
        }
        Ok(removed)
    }

    // ========================
    // Expense operations
    // ========================

    pub async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>> {
        let rows: Vec<LedgerRow<ExpenseRow>> =
            read_rows(&self.paths.expenses_file(), &EXPENSE_COLUMNS).await?;
        tracing::debug!(rows = rows.len(), "loaded expense ledger");
        Ok(rows.iter().map(|r| r.row.to_record(r.line)).collect())
    }

    pub async fn append_expenses(&self, expenses: &[ExpenseRecord]) -> Result<usize> {
        if expenses.is_empty() {
            return Ok(0);
        }
        let _guard = self.expenses_lock.lock().await;

        let path = self.paths.expenses_file();
        let rows: Vec<LedgerRow<ExpenseRow>> = read_rows(&path, &EXPENSE_COLUMNS).await?;
        let appended: Vec<ExpenseRow> = expenses.iter().map(ExpenseRow::from).collect();
        write_rows(&path, &EXPENSE_COLUMNS, &raw_records(&rows), &appended).await?;

        tracing::info!(rows = expenses.len(), "appended expenses");
        Ok(expenses.len())
    }
}

/// A ledger row as read from disk: its cells in canonical column order,
/// byte for byte, and the text view used for typed conversion.
struct LedgerRow<T> {
    line: usize,
    raw: ByteRecord,
    row: T,
}

fn raw_records<T>(rows: &[LedgerRow<T>]) -> Vec<ByteRecord> {
    rows.iter().map(|r| r.raw.clone()).collect()
}

fn sales_records(rows: &[LedgerRow<SalesRow>]) -> Vec<SalesRecord> {
    rows.iter().map(|r| r.row.to_record(r.line)).collect()
}

/// Read all rows of a ledger. A missing file reads as empty.
///
/// Cells are matched to `columns` by header name. Cells that are not valid
/// UTF-8 are read lossily for the text view; the raw bytes are kept so a
/// rewrite leaves them untouched.
async fn read_rows<T: DeserializeOwned>(path: &Path, columns: &[&str]) -> Result<Vec<LedgerRow<T>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let file_header = reader
        .byte_headers()
        .with_context(|| format!("Malformed header in {}", path.display()))?
        .clone();
    let positions: Vec<Option<usize>> = columns
        .iter()
        .map(|column| file_header.iter().position(|h| h == column.as_bytes()))
        .collect();
    let header = StringRecord::from(columns.to_vec());

    let mut rows = Vec::new();
    for (i, result) in reader.byte_records().enumerate() {
        let line = i + 2;
        let record =
            result.with_context(|| format!("Malformed row {} in {}", line, path.display()))?;

        let raw: ByteRecord = positions
            .iter()
            .map(|pos| pos.and_then(|p| record.get(p)).unwrap_or_default())
            .collect();
        if raw.iter().any(|cell| std::str::from_utf8(cell).is_err()) {
            tracing::warn!(line, path = %path.display(), "row is not valid UTF-8, reading lossily");
        }

        let text: StringRecord = raw
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect();
        let row: T = text
            .deserialize(Some(&header))
            .with_context(|| format!("Malformed row {} in {}", line, path.display()))?;
        rows.push(LedgerRow { line, raw, row });
    }
    Ok(rows)
}

/// Replace a ledger with `header`, the `existing` rows as stored, then `appended`.
async fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    existing: &[ByteRecord],
    appended: &[T],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for record in existing {
        writer.write_byte_record(record)?;
    }
    for row in appended {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to encode {}: {}", path.display(), e.error()))?;

    write_atomic(path, &bytes).await
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Write a header-only ledger when the file is missing or zero-length.
async fn ensure_ledger<T: Serialize>(path: &Path, header: &[&str]) -> Result<()> {
    let needs_header = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect {}", path.display()));
        }
    };

    if needs_header {
        write_rows::<T>(path, header, &[], &[]).await?;
        tracing::debug!(path = %path.display(), "created ledger");
    }
    Ok(())
}

async fn read_sequence(path: &Path) -> Result<CatalogId> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => content
            .trim()
            .parse()
            .with_context(|| format!("Corrupt id sequence in {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
