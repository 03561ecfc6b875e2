//! Document export: turns invoices, period reports and balance sheets into
//! files an operator can print or send.
//!
//! Front ends build one of the document structs below from a service result
//! and hand it to a [`DocumentRenderer`]. Renderers only lay out what they are
//! given; every figure is computed before it reaches them.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::application::{AppError, BalanceSheetReport, FinancialReport};
use crate::config::{AppConfig, BusinessProfile, DataPaths, DocumentFormat};
use crate::domain::{format_money, parse_ledger_date, Cents, Invoice, InvoiceNumber};

/// Location of a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLineRow {
    pub service: String,
    pub unit_price: String,
    pub tax: String,
    pub total: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDocument {
    pub invoice_number: InvoiceNumber,
    pub date: String,
    pub customer: String,
    pub address: String,
    pub contact: String,
    pub lines: Vec<InvoiceLineRow>,
    pub subtotal: Cents,
    pub tax_amount: Cents,
    pub grand_total: Cents,
}

impl InvoiceDocument {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        let date = parse_ledger_date(&invoice.timestamp)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| invoice.timestamp.clone());

        Self {
            invoice_number: invoice.number,
            date,
            customer: invoice.customer.clone(),
            address: invoice.address.clone(),
            contact: invoice.contact.clone(),
            lines: invoice
                .lines
                .iter()
                .map(|line| InvoiceLineRow {
                    service: line.service.clone(),
                    unit_price: format_money(line.unit_price),
                    tax: line.tax_rate.to_string(),
                    total: format_money(line.line_total),
                })
                .collect(),
            subtotal: invoice.totals.subtotal,
            tax_amount: invoice.totals.tax_total,
            grand_total: invoice.totals.grand_total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSalesRow {
    pub invoice_number: String,
    pub date: String,
    pub customer: String,
    pub service: String,
    pub total: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialReportDocument {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub summary_rows: Vec<SummaryRow>,
    pub sales_rows: Vec<ReportSalesRow>,
}

impl FinancialReportDocument {
    pub fn from_report(report: &FinancialReport) -> Self {
        let s = &report.summary;
        let summary_rows = [
            ("Total Sales (Incl. GST)", s.total_sales),
            ("Total Revenue (Excl. GST)", s.revenue_ex_gst),
            ("GST Collected", s.gst_collected),
            ("Total Expenses", s.total_expenses),
            ("NET PROFIT/LOSS", s.net_profit),
        ]
        .into_iter()
        .map(|(label, value)| SummaryRow {
            label: label.to_string(),
            value: format_money(value),
        })
        .collect();

        let sales_rows = report
            .sales
            .iter()
            .map(|sale| ReportSalesRow {
                invoice_number: sale.invoice_number.clone(),
                date: sale.date.clone(),
                customer: sale.customer.clone(),
                service: sale.service.clone(),
                total: format_money(sale.total),
            })
            .collect();

        Self {
            period_start: report.from_date,
            period_end: report.to_date,
            summary_rows,
            sales_rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheetDocument {
    pub as_of: NaiveDate,
    pub cash: Cents,
    pub gst_payable: Cents,
    pub retained_earnings: Cents,
}

impl BalanceSheetDocument {
    pub fn from_report(report: &BalanceSheetReport) -> Self {
        Self {
            as_of: report.as_of,
            cash: report.sheet.cash_balance,
            gst_payable: report.sheet.gst_payable,
            retained_earnings: report.sheet.retained_earnings,
        }
    }

    pub fn total_assets(&self) -> Cents {
        self.cash
    }

    pub fn total_liabilities_and_equity(&self) -> Cents {
        self.gst_payable + self.retained_earnings
    }
}

/// Renders documents to files.
pub trait DocumentRenderer {
    fn render_invoice(&self, doc: &InvoiceDocument) -> Result<DocumentHandle, AppError>;

    fn render_financial_report(
        &self,
        doc: &FinancialReportDocument,
    ) -> Result<DocumentHandle, AppError>;

    fn render_balance_sheet(&self, doc: &BalanceSheetDocument) -> Result<DocumentHandle, AppError>;

    /// Delete the rendered document of an invoice. Returns whether one existed.
    fn remove_invoice(&self, number: InvoiceNumber) -> Result<bool, AppError>;
}

/// Pick the renderer configured for this installation.
pub fn renderer_for(config: &AppConfig, paths: &DataPaths) -> Box<dyn DocumentRenderer> {
    let dir = paths.documents_dir();
    match config.documents.format {
        DocumentFormat::Text => Box::new(TextRenderer::new(dir, config.business.clone())),
        DocumentFormat::Json => Box::new(JsonRenderer::new(dir)),
    }
}

fn invoice_path(dir: &Path, number: InvoiceNumber, format: DocumentFormat) -> PathBuf {
    dir.join(format!("Invoice_{}.{}", number, format.extension()))
}

fn report_path(dir: &Path, doc: &FinancialReportDocument, format: DocumentFormat) -> PathBuf {
    dir.join(format!(
        "Financial_Report_{}_to_{}.{}",
        doc.period_start,
        doc.period_end,
        format.extension()
    ))
}

fn balance_sheet_path(dir: &Path, doc: &BalanceSheetDocument, format: DocumentFormat) -> PathBuf {
    dir.join(format!("Balance_Sheet_{}.{}", doc.as_of, format.extension()))
}

fn write_document(path: PathBuf, content: &str) -> Result<DocumentHandle, AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Export(format!("{}: {}", parent.display(), e)))?;
    }
    std::fs::write(&path, content)
        .map_err(|e| AppError::Export(format!("{}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), "wrote document");
    Ok(DocumentHandle { path })
}

fn remove_document(path: &Path) -> Result<bool, AppError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::Export(format!("{}: {}", path.display(), e))),
    }
}

fn layout_error(_: std::fmt::Error) -> AppError {
    AppError::Export("failed to lay out document".to_string())
}

const RULE_WIDTH: usize = 72;

/// Plain-text documents laid out for an 80-column printer.
pub struct TextRenderer {
    dir: PathBuf,
    profile: BusinessProfile,
}

impl TextRenderer {
    pub fn new(dir: impl Into<PathBuf>, profile: BusinessProfile) -> Self {
        Self {
            dir: dir.into(),
            profile,
        }
    }

    fn write_header(&self, out: &mut String, title: &str) -> std::fmt::Result {
        writeln!(out, "{:<48}{:>24}", self.profile.name, title)?;
        if !self.profile.address.is_empty() {
            writeln!(out, "{}", self.profile.address)?;
        }
        if !self.profile.phone.is_empty() {
            writeln!(out, "Phone: {}", self.profile.phone)?;
        }
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))
    }

    pub fn format_invoice(&self, doc: &InvoiceDocument) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        self.write_header(&mut out, "INVOICE")?;

        let address = if doc.address.is_empty() {
            "No Address Provided"
        } else {
            doc.address.as_str()
        };
        let contact = if doc.contact.is_empty() {
            "Not Provided"
        } else {
            doc.contact.as_str()
        };
        let invoice_number = doc.invoice_number.to_string();

        writeln!(out, "{:<44}{:<14}{:>14}", "BILL TO:", "Invoice #", invoice_number)?;
        writeln!(out, "{:<44}{:<14}{:>14}", doc.customer, "Invoice Date", doc.date)?;
        writeln!(out, "{:<44}{:<14}{:>14}", address, "Due Date", doc.date)?;
        writeln!(out, "Contact: {}", contact)?;
        writeln!(out)?;

        writeln!(
            out,
            "{:<28}{:>12}{:>8}{:>10}{:>14}",
            "Service Description", "Unit Price", "GST %", "Quantity", "Amount"
        )?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        for line in &doc.lines {
            writeln!(
                out,
                "{:<28}{:>12}{:>8}{:>10}{:>14}",
                truncate(&line.service, 27),
                line.unit_price,
                line.tax,
                "1.00",
                line.total
            )?;
        }
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

        for (label, value) in [
            ("Subtotal (Base)", format_money(doc.subtotal)),
            ("GST Amount", format_money(doc.tax_amount)),
            ("Total", format_money(doc.grand_total)),
            ("Amount Paid", format_money(0)),
            ("Balance Due", format_money(doc.grand_total)),
        ] {
            writeln!(out, "{:>52}{:>20}", label, value)?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "NOTES: Thank you for your business. Taxes are included in the final total."
        )?;
        Ok(out)
    }

    pub fn format_financial_report(
        &self,
        doc: &FinancialReportDocument,
    ) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        self.write_header(&mut out, "FINANCIAL REPORT")?;
        writeln!(out, "Period: {} to {}", doc.period_start, doc.period_end)?;
        writeln!(
            out,
            "Generated On: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out)?;

        writeln!(out, "Financial Summary")?;
        writeln!(out, "{:<36}{:>20}", "Metric", "Value")?;
        writeln!(out, "{}", "-".repeat(56))?;
        for row in &doc.summary_rows {
            writeln!(out, "{:<36}{:>20}", row.label, row.value)?;
        }
        writeln!(out)?;

        writeln!(out, "Detailed Sales History")?;
        writeln!(
            out,
            "{:<10}{:<21}{:<16}{:<14}{:>11}",
            "Invoice #", "Date", "Customer", "Item", "Total"
        )?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        if doc.sales_rows.is_empty() {
            writeln!(out, "No sales in selected range.")?;
        }
        for row in &doc.sales_rows {
            writeln!(
                out,
                "{:<10}{:<21}{:<16}{:<14}{:>11}",
                row.invoice_number,
                truncate(&row.date, 20),
                truncate(&row.customer, 15),
                truncate(&row.service, 13),
                row.total
            )?;
        }
        Ok(out)
    }

    pub fn format_balance_sheet(&self, doc: &BalanceSheetDocument) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        self.write_header(&mut out, "BALANCE SHEET")?;
        writeln!(out, "As of: {}", doc.as_of)?;
        writeln!(out)?;

        let cash = format_money(doc.cash);
        let gst = format_money(doc.gst_payable);
        let equity = format_money(doc.retained_earnings);
        let rows: [(&str, &str, &str, &str); 6] = [
            ("ASSETS", "", "LIABILITIES & EQUITY", ""),
            ("Current Assets", "", "Liabilities", ""),
            ("  Cash & Bank Balance", &cash, "  GST Payable", &gst),
            ("", "", "Equity", ""),
            ("", "", "  Retained Earnings", &equity),
            ("", "", "", ""),
        ];
        for (left, left_value, right, right_value) in rows {
            writeln!(
                out,
                "{:<22}{:>13} | {:<22}{:>13}",
                left, left_value, right, right_value
            )?;
        }
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(
            out,
            "{:<22}{:>13} | {:<22}{:>13}",
            "TOTAL ASSETS",
            format_money(doc.total_assets()),
            "TOTAL LIAB. & EQUITY",
            format_money(doc.total_liabilities_and_equity())
        )?;
        writeln!(out)?;
        writeln!(out, "This is a computer-generated financial statement.")?;
        Ok(out)
    }
}

impl DocumentRenderer for TextRenderer {
    fn render_invoice(&self, doc: &InvoiceDocument) -> Result<DocumentHandle, AppError> {
        let content = self.format_invoice(doc).map_err(layout_error)?;
        let path = invoice_path(&self.dir, doc.invoice_number, DocumentFormat::Text);
        write_document(path, &content)
    }

    fn render_financial_report(
        &self,
        doc: &FinancialReportDocument,
    ) -> Result<DocumentHandle, AppError> {
        let content = self.format_financial_report(doc).map_err(layout_error)?;
        write_document(report_path(&self.dir, doc, DocumentFormat::Text), &content)
    }

    fn render_balance_sheet(&self, doc: &BalanceSheetDocument) -> Result<DocumentHandle, AppError> {
        let content = self.format_balance_sheet(doc).map_err(layout_error)?;
        write_document(balance_sheet_path(&self.dir, doc, DocumentFormat::Text), &content)
    }

    fn remove_invoice(&self, number: InvoiceNumber) -> Result<bool, AppError> {
        remove_document(&invoice_path(&self.dir, number, DocumentFormat::Text))
    }
}

/// Machine-readable documents, one pretty-printed JSON file each.
pub struct JsonRenderer {
    dir: PathBuf,
}

impl JsonRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_json<T: Serialize>(&self, path: PathBuf, doc: &T) -> Result<DocumentHandle, AppError> {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| AppError::Export(format!("failed to encode document: {}", e)))?;
        write_document(path, &json)
    }
}

impl DocumentRenderer for JsonRenderer {
    fn render_invoice(&self, doc: &InvoiceDocument) -> Result<DocumentHandle, AppError> {
        self.write_json(
            invoice_path(&self.dir, doc.invoice_number, DocumentFormat::Json),
            doc,
        )
    }

    fn render_financial_report(
        &self,
        doc: &FinancialReportDocument,
    ) -> Result<DocumentHandle, AppError> {
        self.write_json(report_path(&self.dir, doc, DocumentFormat::Json), doc)
    }

    fn render_balance_sheet(&self, doc: &BalanceSheetDocument) -> Result<DocumentHandle, AppError> {
        self.write_json(balance_sheet_path(&self.dir, doc, DocumentFormat::Json), doc)
    }

    fn remove_invoice(&self, number: InvoiceNumber) -> Result<bool, AppError> {
        remove_document(&invoice_path(&self.dir, number, DocumentFormat::Json))
    }
}

/// Shorten `s` to at most `max_chars` characters, marking the cut with "...".
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CartTotals, SalesRecord, TaxRate};
    use tempfile::TempDir;

    fn sample_invoice() -> Invoice {
        let line = |service: &str, price: Cents, total: Cents| SalesRecord {
            invoice_number: Some(1001),
            date: "2024-03-01 10:15:00".into(),
            customer: "Asha".into(),
            service: service.into(),
            unit_price: price,
            tax_rate: TaxRate::from_bps(1800),
            line_total: total,
        };
        Invoice {
            number: 1001,
            timestamp: "2024-03-01 10:15:00".into(),
            customer: "Asha".into(),
            address: "MG Road".into(),
            contact: String::new(),
            lines: vec![line("Haircut", 10000, 11800), line("Facial", 5000, 5900)],
            totals: CartTotals {
                subtotal: 15000,
                tax_total: 2700,
                grand_total: 17700,
            },
        }
    }

    fn profile() -> BusinessProfile {
        BusinessProfile {
            name: "Glow Salon".into(),
            address: "Opp. Post Office".into(),
            phone: "+91 90000 00000".into(),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Haircut", 10), "Haircut");
        assert_eq!(truncate("Bridal makeup package", 10), "Bridal ...");
        assert_eq!(truncate("Café crème brûlée", 8), "Café ...");
    }

    #[test]
    fn test_invoice_document_rows() {
        let doc = InvoiceDocument::from_invoice(&sample_invoice());
        assert_eq!(doc.date, "2024-03-01");
        assert_eq!(
            doc.lines[0],
            InvoiceLineRow {
                service: "Haircut".into(),
                unit_price: "₹100.00".into(),
                tax: "18%".into(),
                total: "₹118.00".into(),
            }
        );
        assert_eq!(doc.grand_total, 17700);
    }

    #[test]
    fn test_text_invoice_layout() {
        let renderer = TextRenderer::new("unused", profile());
        let text = renderer
            .format_invoice(&InvoiceDocument::from_invoice(&sample_invoice()))
            .unwrap();

        assert!(text.contains("Glow Salon"));
        assert!(text.contains("INVOICE"));
        assert!(text.contains("1001"));
        assert!(text.contains("MG Road"));
        assert!(text.contains("Contact: Not Provided"));
        assert!(text.contains("Subtotal (Base)"));
        assert!(text.contains("₹27.00"));
        assert!(text.contains("₹177.00"));
    }

    #[test]
    fn test_render_and_remove_invoice() {
        let dir = TempDir::new().unwrap();
        let renderer = TextRenderer::new(dir.path(), profile());
        let doc = InvoiceDocument::from_invoice(&sample_invoice());

        let handle = renderer.render_invoice(&doc).unwrap();
        assert_eq!(handle.path, dir.path().join("Invoice_1001.txt"));
        assert!(handle.path.exists());

        assert!(renderer.remove_invoice(1001).unwrap());
        assert!(!handle.path.exists());
        assert!(!renderer.remove_invoice(1001).unwrap());
    }

    #[test]
    fn test_balance_sheet_totals() {
        let doc = BalanceSheetDocument {
            as_of: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            cash: 100000,
            gst_payable: 15000,
            retained_earnings: 85000,
        };
        assert_eq!(doc.total_assets(), 100000);
        assert_eq!(doc.total_liabilities_and_equity(), 100000);

        let text = TextRenderer::new("unused", profile())
            .format_balance_sheet(&doc)
            .unwrap();
        assert!(text.contains("As of: 2024-03-31"));
        assert!(text.contains("GST Payable"));
        assert!(text.contains("₹1,000.00"));
    }

    #[test]
    fn test_json_report_document() {
        let dir = TempDir::new().unwrap();
        let doc = FinancialReportDocument {
            period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            summary_rows: vec![SummaryRow {
                label: "GST Collected".into(),
                value: "₹27.00".into(),
            }],
            sales_rows: Vec::new(),
        };

        let handle = JsonRenderer::new(dir.path())
            .render_financial_report(&doc)
            .unwrap();
        assert_eq!(
            handle.path,
            dir.path().join("Financial_Report_2024-03-01_to_2024-03-31.json")
        );

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&handle.path).unwrap()).unwrap();
        assert_eq!(value["summary_rows"][0]["label"], "GST Collected");
        assert_eq!(value["period_start"], "2024-03-01");
    }
}
