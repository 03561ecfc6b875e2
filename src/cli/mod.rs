use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    parse_amount, parse_day, parse_rate, BalanceSheetReport, FinancialReport, LedgerService,
};
use crate::config::{AppConfig, DataPaths};
use crate::domain::{format_money, BillingSession, CatalogId, Invoice, InvoiceNumber};
use crate::io::document::truncate;
use crate::io::{
    renderer_for, BalanceSheetDocument, DocumentRenderer, Exporter, FinancialReportDocument,
    ImportOptions, Importer, InvoiceDocument,
};

/// Tillbook - point of sale and GST bookkeeping
#[derive(Parser)]
#[command(name = "tillbook")]
#[command(about = "Point-of-sale, invoicing and GST bookkeeping for a small service business")]
#[command(version)]
pub struct Cli {
    /// Base directory holding data/, invoices/ and tillbook.toml
    #[arg(long, env = "TILLBOOK_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger files and a default tillbook.toml
    Init,

    /// Service catalog commands
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Billing and invoice commands
    #[command(subcommand)]
    Invoice(InvoiceCommands),

    /// Financial report for a date range
    Report {
        /// First day of the period (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,

        /// Last day of the period (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,

        /// With --format csv, write the per-day totals instead of the sales rows
        #[arg(long)]
        trend: bool,

        /// Also write the report document to the invoices directory
        #[arg(long)]
        export: bool,
    },

    /// Balance sheet over the whole history
    BalanceSheet {
        /// Output format
        #[arg(long, value_enum, default_value_t = SheetFormat::Table)]
        format: SheetFormat,

        /// Also write the balance sheet document to the invoices directory
        #[arg(long)]
        export: bool,
    },

    /// Import externally recorded data
    #[command(subcommand)]
    Import(ImportCommands),
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Add a service to the catalog
    Add {
        /// Service name
        name: String,

        /// Unit price before GST (e.g., "150" or "99.50")
        #[arg(long)]
        price: String,

        /// GST percentage between 0 and 28 (e.g., "18")
        #[arg(long)]
        gst: String,
    },

    /// List catalog services
    List,
}

#[derive(Subcommand)]
pub enum InvoiceCommands {
    /// Show the cart totals for a set of items without recording a sale
    Quote {
        /// Catalog id to add to the cart (repeat for more lines)
        #[arg(long = "item", required = true)]
        items: Vec<CatalogId>,
    },

    /// Bill a cart of catalog items to a customer
    Create {
        /// Customer name
        #[arg(long)]
        customer: String,

        /// Customer address, printed on the invoice only
        #[arg(long, default_value = "")]
        address: String,

        /// Customer phone or email, printed on the invoice only
        #[arg(long, default_value = "")]
        contact: String,

        /// Catalog id to add to the cart (repeat for more lines)
        #[arg(long = "item", required = true)]
        items: Vec<CatalogId>,
    },

    /// Show a recorded invoice
    Show {
        /// Invoice number
        number: InvoiceNumber,

        /// Also (re)write the invoice document
        #[arg(long)]
        export: bool,
    },

    /// Delete every sales row of an invoice and its document
    Delete {
        /// Invoice number
        number: InvoiceNumber,
    },
}

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Import expenses from a date,description,amount CSV
    Expenses {
        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Validate and count rows without writing
        #[arg(long)]
        dry_run: bool,

        /// Skip rows identical to an existing expense
        #[arg(long)]
        skip_duplicates: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetFormat {
    Table,
    Json,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let paths = DataPaths::resolve(self.home)?;
        let config = AppConfig::load(&paths)?;
        let service = LedgerService::open(paths.clone()).await?;
        let renderer = renderer_for(&config, &paths);

        match self.command {
            Commands::Init => {
                let created = config.write_if_missing(&paths)?;
                println!("Ledgers ready in {}", paths.data_dir().display());
                if created {
                    println!("Wrote default config: {}", paths.config_file().display());
                }
            }

            Commands::Catalog(cmd) => run_catalog_command(&service, cmd).await?,

            Commands::Invoice(cmd) => {
                run_invoice_command(&service, renderer.as_ref(), cmd).await?
            }

            Commands::Report {
                from,
                to,
                format,
                trend,
                export,
            } => {
                let today = Local::now().date_naive();
                let from = optional_day(from.as_deref(), today)?;
                let to = optional_day(to.as_deref(), today)?;

                let report = service.financial_report(from, to).await?;
                match format {
                    ReportFormat::Table => print_financial_report(&report),
                    ReportFormat::Json => {
                        Exporter::export_report_json(&report, std::io::stdout().lock())?
                    }
                    ReportFormat::Csv if trend => {
                        Exporter::export_daily_trend_csv(
                            &report.daily_trend,
                            std::io::stdout().lock(),
                        )?;
                    }
                    ReportFormat::Csv => {
                        Exporter::export_sales_csv(&report.sales, std::io::stdout().lock())?;
                    }
                }

                if export {
                    let handle = renderer
                        .render_financial_report(&FinancialReportDocument::from_report(&report))?;
                    eprintln!("Report saved: {}", handle.path.display());
                }
            }

            Commands::BalanceSheet { format, export } => {
                let report = service.balance_sheet().await?;
                match format {
                    SheetFormat::Table => print_balance_sheet(&report),
                    SheetFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                }

                if export {
                    let handle = renderer
                        .render_balance_sheet(&BalanceSheetDocument::from_report(&report))?;
                    eprintln!("Balance sheet saved: {}", handle.path.display());
                }
            }

            Commands::Import(ImportCommands::Expenses {
                input,
                dry_run,
                skip_duplicates,
            }) => {
                run_import_expenses(&service, input, dry_run, skip_duplicates).await?;
            }
        }

        Ok(())
    }
}

async fn run_catalog_command(service: &LedgerService, cmd: CatalogCommands) -> Result<()> {
    match cmd {
        CatalogCommands::Add { name, price, gst } => {
            let unit_price = parse_amount(&price)?;
            let tax_rate = parse_rate(&gst)?;
            let item = service.add_item(&name, unit_price, tax_rate).await?;
            println!(
                "Added service #{}: {} at {} + {} GST ({})",
                item.id,
                item.name,
                format_money(item.unit_price),
                item.tax_rate,
                format_money(item.line_total())
            );
        }

        CatalogCommands::List => {
            let items = service.list_items().await?;
            if items.is_empty() {
                println!("No services in the catalog.");
            } else {
                println!(
                    "{:>5} {:<30} {:>12} {:>7} {:>12}",
                    "ID", "SERVICE", "PRICE", "GST", "TOTAL"
                );
                println!("{}", "-".repeat(70));
                for item in items {
                    println!(
                        "{:>5} {:<30} {:>12} {:>7} {:>12}",
                        item.id,
                        truncate(&item.name, 30),
                        format_money(item.unit_price),
                        item.tax_rate.to_string(),
                        format_money(item.line_total())
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_invoice_command(
    service: &LedgerService,
    renderer: &dyn DocumentRenderer,
    cmd: InvoiceCommands,
) -> Result<()> {
    match cmd {
        InvoiceCommands::Quote { items } => {
            let session = fill_cart(service, &items).await?;
            print_cart(&session);
        }

        InvoiceCommands::Create {
            customer,
            address,
            contact,
            items,
        } => {
            let mut session = fill_cart(service, &items).await?;
            let invoice = service
                .commit(&mut session, &customer, &address, &contact)
                .await?;

            println!(
                "Recorded invoice #{} for {}: {} ({} line{})",
                invoice.number,
                invoice.customer,
                format_money(invoice.totals.grand_total),
                invoice.lines.len(),
                if invoice.lines.len() == 1 { "" } else { "s" }
            );

            let handle = renderer
                .render_invoice(&InvoiceDocument::from_invoice(&invoice))
                .with_context(|| {
                    format!(
                        "Invoice #{} was recorded but its document could not be written",
                        invoice.number
                    )
                })?;
            println!("Invoice saved: {}", handle.path.display());
        }

        InvoiceCommands::Show { number, export } => {
            let invoice = service.find_invoice(number).await?;
            print_invoice(&invoice);

            if export {
                let handle = renderer.render_invoice(&InvoiceDocument::from_invoice(&invoice))?;
                eprintln!("Invoice saved: {}", handle.path.display());
            }
        }

        InvoiceCommands::Delete { number } => {
            let removed = service.delete_invoice(number).await?;
            let document_removed = renderer.remove_invoice(number)?;
            println!(
                "Deleted invoice #{} ({} row{})",
                number,
                removed,
                if removed == 1 { "" } else { "s" }
            );
            if document_removed {
                println!("Removed invoice document");
            }
        }
    }
    Ok(())
}

async fn run_import_expenses(
    service: &LedgerService,
    input: Option<PathBuf>,
    dry_run: bool,
    skip_duplicates: bool,
) -> Result<()> {
    use std::fs::File;
    use std::io::Read;

    let importer = Importer::new(service);

    let reader: Box<dyn Read> = match &input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(std::io::stdin()),
    };

    let options = ImportOptions {
        dry_run,
        skip_duplicates,
    };
    let result = importer.import_expenses_csv(reader, options).await?;

    if dry_run {
        println!("Validation successful");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            let field = error
                .field
                .as_ref()
                .map(|f| format!("{}: ", f))
                .unwrap_or_default();
            println!("  Line {}: {}{}", error.line, field, error.error);
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

async fn fill_cart(service: &LedgerService, items: &[CatalogId]) -> Result<BillingSession> {
    let mut session = service.new_session();
    for &id in items {
        service.add_to_cart(&mut session, id).await?;
    }
    Ok(session)
}

fn optional_day(input: Option<&str>, default: NaiveDate) -> Result<NaiveDate> {
    match input {
        Some(day) => Ok(parse_day(day)?),
        None => Ok(default),
    }
}

fn print_cart(session: &BillingSession) {
    println!(
        "{:>3} {:<30} {:>12} {:>7} {:>12}",
        "#", "SERVICE", "PRICE", "GST", "TOTAL"
    );
    println!("{}", "-".repeat(68));
    for (index, line) in session.lines().iter().enumerate() {
        println!(
            "{:>3} {:<30} {:>12} {:>7} {:>12}",
            index + 1,
            truncate(&line.name, 30),
            format_money(line.unit_price),
            line.tax_rate.to_string(),
            format_money(line.line_total)
        );
    }

    let totals = session.totals();
    println!("{}", "-".repeat(68));
    println!("{:<55}{:>13}", "Subtotal", format_money(totals.subtotal));
    println!("{:<55}{:>13}", "GST", format_money(totals.tax_total));
    println!("{:<55}{:>13}", "Grand Total", format_money(totals.grand_total));
}

fn print_invoice(invoice: &Invoice) {
    println!("Invoice #{}", invoice.number);
    println!("  Date:     {}", invoice.timestamp);
    println!("  Customer: {}", invoice.customer);
    println!();
    println!(
        "{:<30} {:>12} {:>7} {:>12}",
        "SERVICE", "PRICE", "GST", "TOTAL"
    );
    println!("{}", "-".repeat(64));
    for line in &invoice.lines {
        println!(
            "{:<30} {:>12} {:>7} {:>12}",
            truncate(&line.service, 30),
            format_money(line.unit_price),
            line.tax_rate.to_string(),
            format_money(line.line_total)
        );
    }
    println!("{}", "-".repeat(64));
    println!("{:<51}{:>13}", "Subtotal", format_money(invoice.totals.subtotal));
    println!("{:<51}{:>13}", "GST", format_money(invoice.totals.tax_total));
    println!(
        "{:<51}{:>13}",
        "Grand Total",
        format_money(invoice.totals.grand_total)
    );
}

fn print_financial_report(report: &FinancialReport) {
    let summary = &report.summary;

    println!("Financial Report: {} to {}", report.from_date, report.to_date);
    println!();
    println!("{:<28}{:>16}", "Total Sales (Incl. GST)", format_money(summary.total_sales));
    println!("{:<28}{:>16}", "Total Revenue (Excl. GST)", format_money(summary.revenue_ex_gst));
    println!("{:<28}{:>16}", "GST Collected", format_money(summary.gst_collected));
    println!("{:<28}{:>16}", "Total Expenses", format_money(summary.total_expenses));
    println!("{}", "-".repeat(44));
    println!("{:<28}{:>16}", "NET PROFIT/LOSS", format_money(summary.net_profit));

    if !report.top_services.is_empty() {
        println!("\nTop services:");
        for service in &report.top_services {
            println!("  {:<30} {:>5}", truncate(&service.service, 30), service.count);
        }
    }

    if !report.daily_trend.is_empty() {
        println!("\nDaily sales:");
        for day in &report.daily_trend {
            println!("  {}  {:>14}", day.date, format_money(day.total));
        }
    }

    println!();
    if report.sales.is_empty() {
        println!("No sales in this period.");
    } else {
        println!(
            "{:<8} {:<19} {:<20} {:<20} {:>12}",
            "INVOICE", "DATE", "CUSTOMER", "SERVICE", "TOTAL"
        );
        println!("{}", "-".repeat(83));
        for sale in &report.sales {
            println!(
                "{:<8} {:<19} {:<20} {:<20} {:>12}",
                sale.invoice_number,
                truncate(&sale.date, 19),
                truncate(&sale.customer, 20),
                truncate(&sale.service, 20),
                format_money(sale.total)
            );
        }
    }
}

fn print_balance_sheet(report: &BalanceSheetReport) {
    let sheet = &report.sheet;

    println!("Balance Sheet as of {}", report.as_of);
    println!();
    println!("Assets");
    println!("  {:<26}{:>16}", "Cash", format_money(sheet.cash_balance));
    println!("  {:<26}{:>16}", "Total Assets", format_money(sheet.total_assets));
    println!();
    println!("Liabilities & Equity");
    println!("  {:<26}{:>16}", "GST Payable", format_money(sheet.gst_payable));
    println!(
        "  {:<26}{:>16}",
        "Retained Earnings",
        format_money(sheet.retained_earnings)
    );
    println!(
        "  {:<26}{:>16}",
        "Total",
        format_money(sheet.total_liabilities_and_equity)
    );
}
