use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::io::Read;

use crate::application::LedgerService;
use crate::domain::{parse_cents, parse_ledger_date, Cents, ExpenseRecord, EXPENSE_DATE_FORMAT};

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
}

/// Importer for loading externally recorded data into the ledgers
pub struct Importer<'a> {
    service: &'a LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Import expenses from a `date,description,amount` CSV.
    /// Valid rows are appended in a single write; invalid rows are reported.
    pub async fn import_expenses_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str, fallback: usize| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .unwrap_or(fallback)
        };
        let date_col = column("date", 0);
        let description_col = column("description", 1);
        let amount_col = column("amount", 2);

        // Keyed on the calendar date so "2024-03-01" matches "2024-03-01 00:00:00"
        let mut known: HashSet<(NaiveDate, String, Cents)> = if options.skip_duplicates {
            self.service
                .list_expenses()
                .await?
                .into_iter()
                .filter_map(|e| Some((e.expense_date()?, e.description, e.amount)))
                .collect()
        } else {
            HashSet::new()
        };

        let mut accepted = Vec::new();
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let date_str = record.get(date_col).unwrap_or("");
            let description = record.get(description_col).unwrap_or("");
            let amount_str = record.get(amount_col).unwrap_or("");

            let date = match parse_ledger_date(date_str) {
                Some(date) => date,
                None => {
                    errors.push(ImportError {
                        line,
                        field: Some("date".to_string()),
                        error: format!("Invalid date: '{}'", date_str),
                    });
                    continue;
                }
            };

            if description.is_empty() {
                errors.push(ImportError {
                    line,
                    field: Some("description".to_string()),
                    error: "Description is required".to_string(),
                });
                continue;
            }

            let amount = match parse_cents(amount_str) {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            let expense = ExpenseRecord::new(
                date.format(EXPENSE_DATE_FORMAT).to_string(),
                description,
                amount,
            );

            if options.skip_duplicates {
                let key = (date, expense.description.clone(), expense.amount);
                if !known.insert(key) {
                    skipped += 1;
                    continue;
                }
            }

            accepted.push(expense);
        }

        let imported = if options.dry_run {
            accepted.len()
        } else {
            self.service.record_expenses(&accepted).await?
        };

        tracing::info!(
            imported,
            skipped,
            errors = errors.len(),
            dry_run = options.dry_run,
            "expense import finished"
        );

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}
