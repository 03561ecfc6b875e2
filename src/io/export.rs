use anyhow::Result;
use std::io::Write;

use crate::application::{FinancialReport, SaleLine};
use crate::domain::{format_cents, DailyTotal};

/// Exporter for writing report data as CSV
pub struct Exporter;

impl Exporter {
    /// Export the detailed sales listing of a report
    pub fn export_sales_csv<W: Write>(sales: &[SaleLine], writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["invoice_no", "date", "customer", "service", "total"])?;

        for sale in sales {
            csv_writer.write_record([
                sale.invoice_number.as_str(),
                sale.date.as_str(),
                sale.customer.as_str(),
                sale.service.as_str(),
                format_cents(sale.total).as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(sales.len())
    }

    /// Export the per-day totals of a report
    pub fn export_daily_trend_csv<W: Write>(trend: &[DailyTotal], writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["date", "total"])?;
        for day in trend {
            csv_writer.write_record([day.date.to_string(), format_cents(day.total)])?;
        }

        csv_writer.flush()?;
        Ok(trend.len())
    }

    /// Export a whole report as pretty JSON
    pub fn export_report_json<W: Write>(report: &FinancialReport, mut writer: W) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        writer.write_all(json.as_bytes())?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_export_sales_csv() {
        let sales = vec![SaleLine {
            invoice_number: "1001".into(),
            date: "2024-03-01 10:00:00".into(),
            customer: "Menon, Asha".into(),
            service: "Haircut".into(),
            total: 11800,
        }];

        let mut out = Vec::new();
        let count = Exporter::export_sales_csv(&sales, &mut out).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "invoice_no,date,customer,service,total\n\
             1001,2024-03-01 10:00:00,\"Menon, Asha\",Haircut,118.00\n"
        );
    }

    #[test]
    fn test_export_daily_trend_csv() {
        let trend = vec![DailyTotal {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            total: 17700,
        }];

        let mut out = Vec::new();
        Exporter::export_daily_trend_csv(&trend, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "date,total\n2024-03-01,177.00\n");
    }
}
