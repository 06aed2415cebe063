//! Point-of-sale till: the cart plus the discount, remark and payment method
//! typed next to it. Lives only in memory for the duration of a session.

pub mod cart;
pub mod checkout;
pub mod discount;

use chrono::Utc;

pub use cart::Cart;
pub use discount::{Discount, DiscountMode};

use crate::{
    error::AppResult,
    models::{PaymentMethod, Transaction},
};

#[derive(Debug, Clone, Default)]
pub struct PosState {
    pub cart: Cart,
    pub discount: Discount,
    pub remark: String,
    pub payment_method: PaymentMethod,
}

impl PosState {
    pub fn discount_amount(&self) -> rust_decimal::Decimal {
        self.discount.apply_to(self.cart.subtotal())
    }

    /// Builds the sale snapshot for the current till; see
    /// [`checkout::build_transaction`].
    pub fn checkout(&self) -> AppResult<Transaction> {
        checkout::build_transaction(
            &self.cart,
            &self.discount,
            &self.remark,
            self.payment_method,
            Utc::now().timestamp_millis(),
        )
    }

    /// Builds the sale and empties the till in one step, so a second submit
    /// sees an empty cart while the first sale is being stored. The returned
    /// till goes back through [`PosState::restore`] if storing fails.
    pub fn begin_checkout(&mut self) -> AppResult<(Transaction, PosState)> {
        let sale = self.checkout()?;
        Ok((sale, std::mem::take(self)))
    }

    /// Puts a taken till back unless a new cart was started meanwhile.
    pub fn restore(&mut self, till: PosState) {
        if self.cart.is_empty() {
            *self = till;
        }
    }
}
