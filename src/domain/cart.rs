use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CatalogId, CatalogItem, Cents, TaxRate};

pub type SessionId = Uuid;

/// One selected catalog item in a billing session.
/// Quantity is always one; selecting an item twice yields two lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: CatalogId,
    pub name: String,
    pub unit_price: Cents,
    pub tax_rate: TaxRate,
    /// Always recomputed from price and rate
    pub line_total: Cents,
}

impl CartLine {
    pub fn from_item(item: &CatalogItem) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            unit_price: item.unit_price,
            tax_rate: item.tax_rate,
            line_total: item.line_total(),
        }
    }

    pub fn tax_amount(&self) -> Cents {
        self.line_total.saturating_sub(self.unit_price)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of prices before GST
    pub subtotal: Cents,
    pub tax_total: Cents,
    pub grand_total: Cents,
}

impl CartTotals {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> Self {
        let (subtotal, grand_total) = lines
            .into_iter()
            .fold((0, 0), |(sub, grand), line| {
                (
                    Cents::saturating_add(sub, line.unit_price),
                    Cents::saturating_add(grand, line.line_total),
                )
            });
        Self {
            subtotal,
            tax_total: grand_total.saturating_sub(subtotal),
            grand_total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    Accumulating,
    /// The last invoice was committed; the cart is empty and ready for the next one.
    Committed,
}

/// An in-progress billing session holding the cart.
/// Sessions are plain values owned by the caller, so several can be open at once.
#[derive(Debug, Clone)]
pub struct BillingSession {
    id: SessionId,
    lines: Vec<CartLine>,
    state: SessionState,
}

impl BillingSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            lines: Vec::new(),
            state: SessionState::Empty,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn push(&mut self, line: CartLine) {
        self.lines.push(line);
        self.state = SessionState::Accumulating;
    }

    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        if index >= self.lines.len() {
            return None;
        }
        let line = self.lines.remove(index);
        if self.lines.is_empty() {
            self.state = SessionState::Empty;
        }
        Some(line)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.state = SessionState::Empty;
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(&self.lines)
    }

    /// Empty the cart after its lines have been persisted.
    pub(crate) fn mark_committed(&mut self) {
        self.lines.clear();
        self.state = SessionState::Committed;
    }
}

impl Default for BillingSession {
    fn default() -> Self {
        Self::new()
    }
}
