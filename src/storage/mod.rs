mod repository;

pub use repository::*;

/// Column order of `products.csv`
pub const CATALOG_COLUMNS: [&str; 4] = ["id", "name", "price", "gst"];

/// Column order of `sales.csv`
pub const SALES_COLUMNS: [&str; 7] = [
    "invoice_no",
    "date",
    "customer",
    "service",
    "price",
    "gst",
    "total",
];

/// Column order of `expenses.csv`
pub const EXPENSE_COLUMNS: [&str; 3] = ["date", "description", "amount"];
