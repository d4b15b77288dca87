//! Cart subset chosen for checkout.

use crate::domain::aggregates::{items_total, Cart, CartLine, LineItem};
use crate::domain::value_objects::Money;

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    lines: Vec<CartLine>,
    total: Money,
}

impl Selection {
    /// Lines whose product id is in `selected`, in cart order. An empty `selected` takes the whole cart.
    pub fn from_cart(cart: &Cart, selected: &[String]) -> Self {
        let lines: Vec<CartLine> = cart.items().iter()
            .filter(|line| selected.is_empty() || selected.iter().any(|id| *id == line.product_id))
            .cloned()
            .collect();
        let total = items_total(&Self::snapshots(&lines));
        Self { lines, total }
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn total(&self) -> Money { self.total }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn item_count(&self) -> u32 { self.lines.iter().map(|l| l.quantity).sum() }

    /// Order line items, each a snapshot of the product as it sits in the cart.
    pub fn line_items(&self) -> Vec<LineItem> { Self::snapshots(&self.lines) }

    fn snapshots(lines: &[CartLine]) -> Vec<LineItem> {
        lines.iter().map(|line| LineItem::snapshot(&line.product, line.quantity)).collect()
    }
}
