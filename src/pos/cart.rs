//! # Cart
//!
//! The single active cart of a vendor session. Lines are unique by product id
//! and hold a frozen copy of the product taken when it was first added, so the
//! price on the receipt is the price the customer saw.
//!
//! Quantities stay within `1..=stock`: adding an out-of-stock product does
//! nothing, and going to zero is done with `remove_item`.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{CartItem, Product};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Adds one unit of `product`, which must carry its current stock.
    pub fn add_item(&mut self, product: &Product) {
        if product.stock <= 0 {
            return;
        }

        if let Some(line) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            if line.quantity < product.stock {
                line.quantity += 1;
            }
            return;
        }

        self.items.push(CartItem {
            product: product.clone(),
            quantity: 1,
        });
    }

    /// Moves a line's quantity by `delta`. A change that would leave the line
    /// below one unit or above `current_stock` is ignored. When the product is
    /// no longer known, only the lower bound applies.
    pub fn update_quantity(&mut self, product_id: Uuid, delta: i32, current_stock: Option<i32>) {
        let Some(line) = self.items.iter_mut().find(|i| i.product.id == product_id) else {
            return;
        };

        let quantity = line.quantity.saturating_add(delta);
        if quantity < 1 {
            return;
        }
        if matches!(current_stock, Some(stock) if quantity > stock) {
            return;
        }
        line.quantity = quantity;
    }

    pub fn remove_item(&mut self, product_id: Uuid) {
        self.items.retain(|i| i.product.id != product_id);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
