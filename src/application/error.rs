use thiserror::Error;

use crate::domain::{CatalogId, InvoiceNumber, ItemValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid catalog item: {0}")]
    InvalidItem(#[from] ItemValidationError),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Customer name is required")]
    MissingCustomerName,

    #[error("Catalog item not found: {0}")]
    CatalogItemNotFound(CatalogId),

    #[error("Cart line not found: {0}")]
    CartLineNotFound(usize),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceNumber),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Document export failed: {0}")]
    Export(String),

    #[error("Ledger error: {0:#}")]
    Io(#[from] anyhow::Error),
}

/// Coarse classification used by front ends to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Parse,
    Io,
    Export,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidItem(_) | AppError::EmptyCart | AppError::MissingCustomerName => {
                ErrorKind::Validation
            }
            AppError::CatalogItemNotFound(_)
            | AppError::CartLineNotFound(_)
            | AppError::InvoiceNotFound(_) => ErrorKind::NotFound,
            AppError::Parse(_) => ErrorKind::Parse,
            AppError::Export(_) => ErrorKind::Export,
            AppError::Io(_) => ErrorKind::Io,
        }
    }
}
