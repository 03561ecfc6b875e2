use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::config::DataPaths;
use crate::domain::{
    balance_sheet, daily_trend, filter_by_date_range, parse_cents, summarize, top_services,
    validate_new_item, BillingSession, CartLine, CartTotals, CatalogId, CatalogItem, Cents,
    ExpenseRecord, Invoice, InvoiceNumber, SalesRecord, TaxRate, TOP_SERVICES_LIMIT,
};
use crate::storage::Repository;

use super::{AppError, BalanceSheetReport, FinancialReport, SaleLine};

/// Application service providing catalog, billing and reporting operations.
/// This is the single entry point for any front end (CLI, TUI, web).
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the ledgers under `paths`, creating empty ones where missing.
    pub async fn open(paths: DataPaths) -> Result<Self, AppError> {
        let repo = Repository::init(paths).await?;
        Ok(Self::new(repo))
    }

    pub fn paths(&self) -> &DataPaths {
        self.repo.paths()
    }

    // ========================
    // Catalog operations
    // ========================

    /// Add a service to the catalog.
    pub async fn add_item(
        &self,
        name: &str,
        unit_price: Cents,
        tax_rate: TaxRate,
    ) -> Result<CatalogItem, AppError> {
        validate_new_item(name, unit_price, tax_rate)?;
        Ok(self
            .repo
            .save_catalog_item(name.trim(), unit_price, tax_rate)
            .await?)
    }

    /// List the catalog in insertion order.
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, AppError> {
        Ok(self.repo.list_catalog_items().await?)
    }

    pub async fn get_item(&self, id: CatalogId) -> Result<CatalogItem, AppError> {
        self.repo
            .get_catalog_item(id)
            .await?
            .ok_or(AppError::CatalogItemNotFound(id))
    }

    // ========================
    // Billing operations
    // ========================

    pub fn new_session(&self) -> BillingSession {
        BillingSession::new()
    }

    /// Add one unit of a catalog item to the cart.
    pub async fn add_to_cart(
        &self,
        session: &mut BillingSession,
        item_id: CatalogId,
    ) -> Result<CartLine, AppError> {
        let item = self.get_item(item_id).await?;
        let line = CartLine::from_item(&item);
        session.push(line.clone());
        tracing::debug!(session = %session.id(), item = item_id, "added to cart");
        Ok(line)
    }

    /// Remove the cart line at `index` (zero-based).
    pub fn remove_from_cart(
        &self,
        session: &mut BillingSession,
        index: usize,
    ) -> Result<CartLine, AppError> {
        session
            .remove(index)
            .ok_or(AppError::CartLineNotFound(index))
    }

    pub fn clear_cart(&self, session: &mut BillingSession) {
        session.clear();
    }

    pub fn compute_totals(&self, session: &BillingSession) -> CartTotals {
        session.totals()
    }

    /// Persist the cart as one invoice stamped with the current local time.
    pub async fn commit(
        &self,
        session: &mut BillingSession,
        customer: &str,
        address: &str,
        contact: &str,
    ) -> Result<Invoice, AppError> {
        let now = Local::now().naive_local();
        self.commit_at(session, customer, address, contact, now)
            .await
    }

    /// Persist the cart as one invoice with the given timestamp.
    ///
    /// The cart is emptied only once the rows are written; on failure it is
    /// left untouched so the commit can be retried.
    pub async fn commit_at(
        &self,
        session: &mut BillingSession,
        customer: &str,
        address: &str,
        contact: &str,
        timestamp: NaiveDateTime,
    ) -> Result<Invoice, AppError> {
        if session.is_empty() {
            return Err(AppError::EmptyCart);
        }
        let customer = customer.trim();
        if customer.is_empty() {
            return Err(AppError::MissingCustomerName);
        }

        let totals = session.totals();
        let lines = session.lines().to_vec();
        let records = self
            .repo
            .save_invoice(|number| {
                lines
                    .iter()
                    .map(|line| SalesRecord::from_cart_line(number, timestamp, customer, line))
                    .collect()
            })
            .await?;

        let Some(first) = records.first() else {
            return Err(AppError::EmptyCart);
        };
        let number = first.invoice_number.ok_or(AppError::EmptyCart)?;
        let invoice = Invoice {
            number,
            timestamp: first.date.clone(),
            customer: customer.to_string(),
            address: address.trim().to_string(),
            contact: contact.trim().to_string(),
            lines: records,
            totals,
        };

        session.mark_committed();
        tracing::info!(
            invoice = invoice.number,
            lines = invoice.lines.len(),
            total = invoice.totals.grand_total,
            "committed invoice"
        );
        Ok(invoice)
    }

    /// Rebuild a committed invoice from the sales ledger.
    pub async fn find_invoice(&self, number: InvoiceNumber) -> Result<Invoice, AppError> {
        let records = self.repo.list_sales_for_invoice(number).await?;
        Invoice::from_records(number, records).ok_or(AppError::InvoiceNotFound(number))
    }

    /// Delete every sales row of an invoice. Returns the number of rows removed.
    pub async fn delete_invoice(&self, number: InvoiceNumber) -> Result<usize, AppError> {
        let removed = self.repo.delete_invoice(number).await?;
        if removed == 0 {
            return Err(AppError::InvoiceNotFound(number));
        }
        Ok(removed)
    }

    pub async fn list_sales(&self) -> Result<Vec<SalesRecord>, AppError> {
        Ok(self.repo.list_sales().await?)
    }

    // ========================
    // Expense operations
    // ========================

    pub async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>, AppError> {
        Ok(self.repo.list_expenses().await?)
    }

    /// Append externally sourced expenses to the expense ledger.
    pub async fn record_expenses(&self, expenses: &[ExpenseRecord]) -> Result<usize, AppError> {
        Ok(self.repo.append_expenses(expenses).await?)
    }

    // ========================
    // Reporting operations
    // ========================

    /// Sales, GST and expense figures for `from..=to` (calendar dates).
    pub async fn financial_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<FinancialReport, AppError> {
        let sales = self.repo.list_sales().await?;
        let expenses = self.repo.list_expenses().await?;
        let (sales, expenses) = filter_by_date_range(&sales, &expenses, from, to);

        Ok(FinancialReport {
            from_date: from,
            to_date: to,
            summary: summarize(&sales, &expenses),
            daily_trend: daily_trend(&sales),
            top_services: top_services(&sales, TOP_SERVICES_LIMIT),
            sales: sales.iter().map(SaleLine::from).collect(),
        })
    }

    /// Balance sheet over the entire history, dated today.
    pub async fn balance_sheet(&self) -> Result<BalanceSheetReport, AppError> {
        let sales = self.repo.list_sales().await?;
        let expenses = self.repo.list_expenses().await?;

        Ok(BalanceSheetReport {
            as_of: Local::now().date_naive(),
            sheet: balance_sheet(&sales, &expenses),
        })
    }
}

// ========================
// Operator input parsing
// ========================

/// Parse a money amount typed by the operator, e.g. "150" or "99.50".
pub fn parse_amount(input: &str) -> Result<Cents, AppError> {
    parse_cents(input).map_err(|e| AppError::Parse(format!("invalid amount '{}': {}", input, e)))
}

/// Parse a GST percentage typed by the operator, e.g. "18" or "12.5".
pub fn parse_rate(input: &str) -> Result<TaxRate, AppError> {
    TaxRate::parse_percent(input)
        .map_err(|e| AppError::Parse(format!("invalid GST rate '{}': {}", input, e)))
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_day(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Parse(format!("invalid date '{}': use YYYY-MM-DD", input)))
}
