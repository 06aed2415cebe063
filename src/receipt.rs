//! Receipt rendering: turns a stored transaction into the printable bill.
//!
//! Only presentation lives here. Amounts are shown in rupees with two decimals
//! and times in the server's local zone.

use chrono::{DateTime, Local, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Transaction;

pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("₹{:.2}", rounded)
}

fn local_time(timestamp_millis: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .with_timezone(&Local)
}

pub fn format_date(timestamp_millis: i64) -> String {
    local_time(timestamp_millis).format("%d/%m/%Y").to_string()
}

pub fn format_time(timestamp_millis: i64) -> String {
    local_time(timestamp_millis).format("%I:%M:%S %p").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i32,
    pub amount: String,
}

/// Everything the receipt template prints, already formatted.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub store_name: String,
    pub tagline: String,
    pub short_id: String,
    pub date: String,
    pub time: String,
    pub payment_method: String,
    pub remark: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: String,
    /// `None` when no discount was given
    pub discount: Option<String>,
    pub total_items: i32,
    pub total: String,
}

impl Receipt {
    pub fn new(transaction: &Transaction, store_name: &str, tagline: &str) -> Self {
        let lines = transaction
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.product.name.clone(),
                quantity: item.quantity,
                amount: format_inr(item.line_total()),
            })
            .collect();

        Receipt {
            store_name: store_name.to_string(),
            tagline: tagline.to_string(),
            short_id: transaction.short_id(),
            date: format_date(transaction.timestamp),
            time: format_time(transaction.timestamp),
            payment_method: transaction.payment_method.to_string(),
            remark: transaction.remark.clone(),
            lines,
            subtotal: format_inr(transaction.subtotal),
            discount: (transaction.discount > Decimal::ZERO).then(|| format_inr(transaction.discount)),
            total_items: transaction.total_quantity(),
            total: format_inr(transaction.total),
        }
    }
}
