use uuid::Uuid;

use super::{cart::Cart, discount::Discount};
use crate::{
    error::{AppError, AppResult},
    models::{PaymentMethod, Transaction},
};

/// Freezes the cart into a transaction. Nothing is mutated.
pub fn build_transaction(
    cart: &Cart,
    discount: &Discount,
    remark: &str,
    payment_method: PaymentMethod,
    timestamp_millis: i64,
) -> AppResult<Transaction> {
    if cart.is_empty() {
        return Err(AppError::validation("Cart is empty"));
    }

    let remark = remark.trim();
    if remark.is_empty() {
        return Err(AppError::validation("Remark is required"));
    }

    let subtotal = cart.subtotal();
    let discount = discount.apply_to(subtotal);

    Ok(Transaction {
        id: Uuid::new_v4(),
        timestamp: timestamp_millis,
        items: cart.items().to_vec(),
        subtotal,
        discount,
        total: subtotal - discount,
        payment_method,
        remark: remark.to_string(),
    })
}
