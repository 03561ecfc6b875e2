mod common;

use anyhow::Result;
use common::{at, day, test_service, write_expenses, write_sales, StandardCatalog};
use tillbook::domain::ServiceCount;
use tillbook::io::Exporter;

#[tokio::test]
async fn test_financial_report_summary() -> Result<()> {
    let (service, _temp) = test_service().await?;
    write_sales(
        &service,
        "1001,2024-03-01 10:00:00,Asha,Haircut,100.00,18.00,118.00\n\
         1001,2024-03-01 10:00:00,Asha,Manicure,50.00,18.00,59.00\n",
    )?;
    write_expenses(&service, "2024-03-01,Shampoo stock,30.00\n")?;

    let report = service
        .financial_report(day("2024-03-01"), day("2024-03-01"))
        .await?;
    let summary = report.summary;

    assert_eq!(summary.total_sales, 17700);
    assert_eq!(summary.revenue_ex_gst, 15000);
    assert_eq!(summary.gst_collected, 2700);
    assert_eq!(summary.total_expenses, 3000);
    assert_eq!(summary.net_profit, 12000);

    assert_eq!(report.sales.len(), 2);
    assert_eq!(report.sales[0].invoice_number, "1001");
    assert_eq!(report.daily_trend.len(), 1);
    assert_eq!(report.daily_trend[0].total, 17700);

    Ok(())
}

#[tokio::test]
async fn test_report_range_is_inclusive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    write_sales(
        &service,
        "1001,2024-02-29 23:59:59,A,Haircut,100.00,18.00,118.00\n\
         1002,2024-03-01 00:00:00,B,Haircut,100.00,18.00,118.00\n\
         1003,2024-03-07 23:59:59,C,Facial,500.00,18.00,590.00\n\
         1004,2024-03-08 00:00:01,D,Facial,500.00,18.00,590.00\n",
    )?;
    write_expenses(
        &service,
        "2024-02-29,Rent,1000.00\n\
         2024-03-01,Towels,20.00\n\
         2024-03-07 18:00:00,Electricity,80.00\n",
    )?;

    let report = service
        .financial_report(day("2024-03-01"), day("2024-03-07"))
        .await?;

    let invoices: Vec<&str> = report
        .sales
        .iter()
        .map(|s| s.invoice_number.as_str())
        .collect();
    assert_eq!(invoices, vec!["1002", "1003"]);
    assert_eq!(report.summary.total_sales, 70800);
    assert_eq!(report.summary.total_expenses, 10000);

    let days: Vec<_> = report.daily_trend.iter().map(|d| d.date).collect();
    assert_eq!(days, vec![day("2024-03-01"), day("2024-03-07")]);

    Ok(())
}

#[tokio::test]
async fn test_reversed_range_is_empty() -> Result<()> {
    let (service, _temp) = test_service().await?;
    write_sales(
        &service,
        "1001,2024-03-05 10:00:00,A,Haircut,100.00,18.00,118.00\n",
    )?;

    let report = service
        .financial_report(day("2024-03-10"), day("2024-03-01"))
        .await?;
    assert!(report.sales.is_empty());
    assert_eq!(report.summary.total_sales, 0);
    assert!(report.top_services.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_undated_rows_are_left_out() -> Result<()> {
    let (service, _temp) = test_service().await?;
    write_sales(
        &service,
        "1001,yesterday,A,Haircut,100.00,18.00,118.00\n\
         1002,2024-03-01 10:00:00,B,Haircut,100.00,18.00,118.00\n",
    )?;
    write_expenses(
        &service,
        "sometime,Snacks,15.00\n\
         2024-03-01,Towels,20.00\n",
    )?;

    let report = service
        .financial_report(day("2024-01-01"), day("2024-12-31"))
        .await?;
    assert_eq!(report.sales.len(), 1);
    assert_eq!(report.summary.total_expenses, 2000);

    Ok(())
}

#[tokio::test]
async fn test_unreadable_amounts_count_as_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;
    write_sales(
        &service,
        "1001,2024-03-01 10:00:00,A,Haircut,100.00,18.00,n/a\n\
         1002,2024-03-01 11:00:00,B,Haircut,100.00,18.00,118.00\n",
    )?;
    write_expenses(&service, "2024-03-01,Towels,twenty\n")?;

    let report = service
        .financial_report(day("2024-03-01"), day("2024-03-01"))
        .await?;
    assert_eq!(report.sales.len(), 2);
    assert_eq!(report.summary.total_sales, 11800);
    assert_eq!(report.summary.total_expenses, 0);

    Ok(())
}

#[tokio::test]
async fn test_top_services_by_count() -> Result<()> {
    let (service, _temp) = test_service().await?;
    write_sales(
        &service,
        "1001,2024-03-01 10:00:00,A,Facial,500.00,18.00,590.00\n\
         1002,2024-03-01 11:00:00,B,Haircut,100.00,18.00,118.00\n\
         1003,2024-03-01 12:00:00,C,Haircut,100.00,18.00,118.00\n\
         1004,2024-03-01 13:00:00,D,Manicure,50.00,12.00,56.00\n\
         1005,2024-03-01 14:00:00,E,Facial,500.00,18.00,590.00\n\
         1006,2024-03-01 15:00:00,F,Haircut,100.00,18.00,118.00\n",
    )?;

    let report = service
        .financial_report(day("2024-03-01"), day("2024-03-01"))
        .await?;
    assert_eq!(
        report.top_services,
        vec![
            ServiceCount {
                service: "Haircut".into(),
                count: 3
            },
            ServiceCount {
                service: "Facial".into(),
                count: 2
            },
            ServiceCount {
                service: "Manicure".into(),
                count: 1
            },
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_committed_sales_appear_in_report() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let items = StandardCatalog::create(&service).await?;

    let mut session = service.new_session();
    service.add_to_cart(&mut session, items[0].id).await?;
    service.add_to_cart(&mut session, items[2].id).await?;
    service
        .commit_at(&mut session, "Asha", "", "", at("2024-03-02 17:30:00"))
        .await?;

    let report = service
        .financial_report(day("2024-03-02"), day("2024-03-02"))
        .await?;
    assert_eq!(report.summary.total_sales, 17400);
    assert_eq!(report.summary.gst_collected, 2400);

    let mut csv = Vec::new();
    let rows = Exporter::export_sales_csv(&report.sales, &mut csv)?;
    assert_eq!(rows, 2);
    let csv = String::from_utf8(csv)?;
    assert!(csv.contains("1001,2024-03-02 17:30:00,Asha,Manicure,56.00"));

    Ok(())
}

#[tokio::test]
async fn test_report_over_non_utf8_rows() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut sales = common::SALES_HEADER.as_bytes().to_vec();
    sales.extend_from_slice(b"1001,2024-03-01 10:00:00,Asha,Haircut,100.00,18.00,118.00\n");
    sales.extend_from_slice(b"1002,2024-03-01 11:00:00,Ren\xe9e,Manicure,50.00,18.00,59.00\n");
    std::fs::write(service.paths().sales_file(), sales)?;

    let mut expenses = common::EXPENSES_HEADER.as_bytes().to_vec();
    expenses.extend_from_slice(b"2024-03-01,Caf\xe9 supplies,30.00\n");
    std::fs::write(service.paths().expenses_file(), expenses)?;

    let report = service
        .financial_report(day("2024-03-01"), day("2024-03-01"))
        .await?;
    assert_eq!(report.summary.total_sales, 17700);
    assert_eq!(report.summary.net_profit, 12000);
    assert_eq!(report.sales[1].customer, "Ren\u{fffd}e");

    let sheet = service.balance_sheet().await?.sheet;
    assert_eq!(sheet.cash_balance, 14700);

    Ok(())
}
