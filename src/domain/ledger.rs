use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{sum_cents, Cents, ExpenseRecord, SalesRecord};

/// Default number of entries in a top-services ranking.
pub const TOP_SERVICES_LIMIT: usize = 5;

/// Parse the date part of a ledger cell. Accepts `YYYY-MM-DD HH:MM:SS`
/// (optionally with fractional seconds) and `YYYY-MM-DD`.
pub fn parse_ledger_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(cell, "%Y-%m-%d"))
        .ok()
}

/// Keep the sales and expenses dated within `start..=end`.
/// Records whose date cannot be parsed are left out.
pub fn filter_by_date_range(
    sales: &[SalesRecord],
    expenses: &[ExpenseRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> (Vec<SalesRecord>, Vec<ExpenseRecord>) {
    let in_range = |date: Option<NaiveDate>| date.is_some_and(|d| d >= start && d <= end);

    let sales = sales
        .iter()
        .filter(|s| in_range(s.sale_date()))
        .cloned()
        .collect();
    let expenses = expenses
        .iter()
        .filter(|e| in_range(e.expense_date()))
        .cloned()
        .collect();

    (sales, expenses)
}

/// Period totals for sales, GST and expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Billed totals including GST
    pub total_sales: Cents,
    pub revenue_ex_gst: Cents,
    pub gst_collected: Cents,
    pub total_expenses: Cents,
    /// Revenue excluding GST minus expenses
    pub net_profit: Cents,
}

pub fn summarize(sales: &[SalesRecord], expenses: &[ExpenseRecord]) -> Summary {
    let total_sales = sum_cents(sales.iter().map(|s| s.line_total));
    let revenue_ex_gst = sum_cents(sales.iter().map(|s| s.unit_price));
    let total_expenses = sum_cents(expenses.iter().map(|e| e.amount));

    Summary {
        total_sales,
        revenue_ex_gst,
        gst_collected: total_sales.saturating_sub(revenue_ex_gst),
        total_expenses,
        net_profit: revenue_ex_gst.saturating_sub(total_expenses),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Cents,
}

/// Billed totals per calendar day, oldest first.
pub fn daily_trend(sales: &[SalesRecord]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, Cents> = BTreeMap::new();
    for sale in sales {
        if let Some(date) = sale.sale_date() {
            let total = by_day.entry(date).or_insert(0);
            *total = total.saturating_add(sale.line_total);
        }
    }

    by_day
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: usize,
}

/// Most frequently billed services by number of lines (not revenue).
/// Ties keep the order in which services first appear.
pub fn top_services(sales: &[SalesRecord], limit: usize) -> Vec<ServiceCount> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<ServiceCount> = Vec::new();

    for sale in sales {
        match positions.get(sale.service.as_str()) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                positions.insert(sale.service.as_str(), counts.len());
                counts.push(ServiceCount {
                    service: sale.service.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Whole-history position. This is a simplified sheet, not double-entry:
/// `total_assets` and `total_liabilities_and_equity` are not required to match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub cash_balance: Cents,
    pub gst_payable: Cents,
    pub retained_earnings: Cents,
    pub total_assets: Cents,
    pub total_liabilities_and_equity: Cents,
}

impl BalanceSheet {
    pub fn from_parts(cash_balance: Cents, gst_payable: Cents, retained_earnings: Cents) -> Self {
        Self {
            cash_balance,
            gst_payable,
            retained_earnings,
            total_assets: cash_balance,
            total_liabilities_and_equity: gst_payable.saturating_add(retained_earnings),
        }
    }

    /// Total assets minus total liabilities and equity.
    pub fn imbalance(&self) -> Cents {
        self.total_assets
            .saturating_sub(self.total_liabilities_and_equity)
    }
}

/// Compute the balance sheet over every sale and expense on record.
pub fn balance_sheet(sales: &[SalesRecord], expenses: &[ExpenseRecord]) -> BalanceSheet {
    let totals = summarize(sales, expenses);
    BalanceSheet::from_parts(
        totals.total_sales.saturating_sub(totals.total_expenses),
        totals.gst_collected,
        totals.revenue_ex_gst.saturating_sub(totals.total_expenses),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaxRate;

    fn sale(date: &str, service: &str, price: Cents, total: Cents) -> SalesRecord {
        SalesRecord {
            invoice_number: Some(1001),
            date: date.into(),
            customer: "Asha".into(),
            service: service.into(),
            unit_price: price,
            tax_rate: TaxRate::from_bps(1800),
            line_total: total,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_ledger_date_formats() {
        assert_eq!(parse_ledger_date("2024-03-01 18:45:00"), Some(day("2024-03-01")));
        assert_eq!(parse_ledger_date("2024-03-01"), Some(day("2024-03-01")));
        assert_eq!(parse_ledger_date(" 2024-03-01 "), Some(day("2024-03-01")));
        assert_eq!(
            parse_ledger_date("2024-03-01 18:45:00.123456"),
            Some(day("2024-03-01"))
        );
        assert_eq!(parse_ledger_date("01/03/2024"), None);
        assert_eq!(parse_ledger_date(""), None);
    }

    #[test]
    fn test_summarize() {
        let sales = vec![
            sale("2024-03-01", "Haircut", 10000, 11800),
            sale("2024-03-01", "Facial", 5000, 5900),
        ];
        let expenses = vec![ExpenseRecord::new("2024-03-01", "Supplies", 3000)];

        let summary = summarize(&sales, &expenses);
        assert_eq!(summary.total_sales, 17700);
        assert_eq!(summary.revenue_ex_gst, 15000);
        assert_eq!(summary.gst_collected, 2700);
        assert_eq!(summary.total_expenses, 3000);
        assert_eq!(summary.net_profit, 12000);
    }

    #[test]
    fn test_summarize_empty_is_zero() {
        assert_eq!(summarize(&[], &[]), Summary::default());
    }

    #[test]
    fn test_filter_is_inclusive_and_ignores_time() {
        let sales = vec![
            sale("2024-02-29 23:59:59", "Before", 100, 118),
            sale("2024-03-01 00:00:00", "Start", 100, 118),
            sale("2024-03-05 12:00:00", "Middle", 100, 118),
            sale("2024-03-10 23:59:59", "End", 100, 118),
            sale("2024-03-11", "After", 100, 118),
            sale("not a date", "Broken", 100, 118),
        ];
        let expenses = vec![
            ExpenseRecord::new("2024-03-10", "Rent", 500),
            ExpenseRecord::new("garbage", "Unknown", 700),
            ExpenseRecord::new("2024-04-01", "Later", 900),
        ];

        let (s, e) = filter_by_date_range(&sales, &expenses, day("2024-03-01"), day("2024-03-10"));
        let names: Vec<&str> = s.iter().map(|r| r.service.as_str()).collect();
        assert_eq!(names, vec!["Start", "Middle", "End"]);
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].description, "Rent");
    }

    #[test]
    fn test_filter_with_reversed_range_is_empty() {
        let sales = vec![sale("2024-03-05", "Haircut", 100, 118)];
        let (s, e) = filter_by_date_range(&sales, &[], day("2024-03-10"), day("2024-03-01"));
        assert!(s.is_empty());
        assert!(e.is_empty());
    }

    #[test]
    fn test_daily_trend_sorted_by_date() {
        let sales = vec![
            sale("2024-03-03 10:00:00", "A", 100, 118),
            sale("2024-03-01 10:00:00", "B", 200, 236),
            sale("2024-03-03 16:00:00", "C", 300, 354),
        ];

        let trend = daily_trend(&sales);
        assert_eq!(
            trend,
            vec![
                DailyTotal { date: day("2024-03-01"), total: 236 },
                DailyTotal { date: day("2024-03-03"), total: 472 },
            ]
        );
    }

    #[test]
    fn test_top_services_counts_occurrences() {
        let sales = vec![
            sale("2024-03-01", "Haircut", 100, 118),
            sale("2024-03-01", "Haircut", 100, 118),
            sale("2024-03-01", "Facial", 5000, 5900),
        ];

        let top = top_services(&sales, TOP_SERVICES_LIMIT);
        assert_eq!(
            top,
            vec![
                ServiceCount { service: "Haircut".into(), count: 2 },
                ServiceCount { service: "Facial".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_top_services_ties_and_limit() {
        let sales: Vec<SalesRecord> = ["Wax", "Facial", "Manicure", "Facial", "Wax", "Pedicure"]
            .iter()
            .map(|s| sale("2024-03-01", s, 100, 118))
            .collect();

        let top = top_services(&sales, 3);
        let names: Vec<&str> = top.iter().map(|c| c.service.as_str()).collect();
        assert_eq!(names, vec!["Wax", "Facial", "Manicure"]);
    }

    #[test]
    fn test_balance_sheet_over_whole_history() {
        let sales = vec![sale("2024-03-01", "Haircut", 10000, 11800)];
        let expenses = vec![ExpenseRecord::new("2024-03-01", "Rent", 2000)];

        let sheet = balance_sheet(&sales, &expenses);
        assert_eq!(sheet.cash_balance, 9800);
        assert_eq!(sheet.gst_payable, 1800);
        assert_eq!(sheet.retained_earnings, 8000);
        assert_eq!(sheet.total_assets, sheet.cash_balance);
        assert_eq!(sheet.total_liabilities_and_equity, 9800);
        assert_eq!(sheet.imbalance(), 0);
    }

    #[test]
    fn test_balance_sheet_does_not_force_equality() {
        let sheet = BalanceSheet::from_parts(1000, 300, 500);
        assert_eq!(sheet.total_assets, 1000);
        assert_eq!(sheet.total_liabilities_and_equity, 800);
        assert_eq!(sheet.imbalance(), 200);
    }

    #[test]
    fn test_summarize_clamps_huge_cells() {
        let sales = vec![
            sale("2024-03-01", "Haircut", Cents::MAX, Cents::MAX),
            sale("2024-03-01", "Haircut", 10000, 11800),
        ];
        let expenses = vec![ExpenseRecord::new("2024-03-01", "Rent", Cents::MIN)];

        let summary = summarize(&sales, &expenses);
        assert_eq!(summary.total_sales, Cents::MAX);
        assert_eq!(summary.revenue_ex_gst, Cents::MAX);
        assert_eq!(summary.total_expenses, Cents::MIN);
        assert_eq!(summary.net_profit, Cents::MAX);

        let trend = daily_trend(&sales);
        assert_eq!(trend[0].total, Cents::MAX);

        let sheet = balance_sheet(&sales, &expenses);
        assert_eq!(sheet.cash_balance, Cents::MAX);
    }
}
