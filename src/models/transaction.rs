use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Product;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Upi];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// A product line in the cart, and later in a transaction snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: i32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A completed sale. Never modified after it is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub remark: String,
}

impl Transaction {
    pub fn total_quantity(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Last six characters of the id, as printed on receipts.
    pub fn short_id(&self) -> String {
        let id = self.id.simple().to_string();
        id[id.len() - 6..].to_string()
    }
}

#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub timestamp: i64,
    pub items: Json<Vec<CartItem>>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub remark: String,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        let payment_method = row.payment_method.parse().unwrap_or_else(|e| {
            warn!("Transaction {} has {}; showing it as cash", row.id, e);
            PaymentMethod::Cash
        });

        Self {
            id: row.id,
            timestamp: row.timestamp,
            items: row.items.0,
            subtotal: row.subtotal,
            discount: row.discount,
            total: row.total,
            payment_method,
            remark: row.remark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!(" card ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_cart_item_json_matches_stored_line_items() {
        let json = r#"{
            "id": "7f1b1d44-2a51-4bb5-9d0e-6d1f3f6b8a10",
            "name": "Dolo 650",
            "price": 30.5,
            "stock": 12,
            "location": "Rack 2",
            "usage": "Fever",
            "lowStockThreshold": 3,
            "quantity": 2
        }"#;

        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.product.name, "Dolo 650");
        assert_eq!(item.product.low_stock_threshold, 3);
        assert_eq!(item.product.category, "General");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.line_total(), Decimal::new(61, 0));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["quantity"], 2);
        assert_eq!(back["lowStockThreshold"], 3);
    }

    #[test]
    fn test_short_id_is_last_six_characters() {
        let tx = Transaction {
            id: Uuid::parse_str("7f1b1d44-2a51-4bb5-9d0e-6d1f3f6b8a10").unwrap(),
            timestamp: 0,
            items: vec![],
            subtotal: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            payment_method: PaymentMethod::Cash,
            remark: "walk-in".to_string(),
        };
        assert_eq!(tx.short_id(), "6b8a10");
    }
}
