//! Figures for the Sales & Orders screen.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{Product, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSold {
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub total_revenue: Decimal,
    pub transaction_count: usize,
    pub low_stock_count: usize,
    /// Quantity sold per item name, best sellers first
    pub order_list: Vec<ItemSold>,
}

impl SalesSummary {
    pub fn compute(transactions: &[Transaction], products: &[Product]) -> Self {
        let mut sold: HashMap<&str, i32> = HashMap::new();
        for item in transactions.iter().flat_map(|t| t.items.iter()) {
            *sold.entry(item.product.name.as_str()).or_default() += item.quantity;
        }

        let mut order_list: Vec<ItemSold> = sold
            .into_iter()
            .map(|(name, quantity)| ItemSold {
                name: name.to_string(),
                quantity,
            })
            .collect();
        order_list.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));

        SalesSummary {
            total_revenue: transactions.iter().map(|t| t.total).sum(),
            transaction_count: transactions.len(),
            low_stock_count: products.iter().filter(|p| p.is_low_stock()).count(),
            order_list,
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::{CartItem, PaymentMethod};

    fn product(name: &str, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: Decimal::new(10, 0),
            stock,
            location: String::new(),
            usage: String::new(),
            low_stock_threshold: 2,
            category: "General".to_string(),
        }
    }

    fn sale(lines: &[(&str, i32)], total: i64) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            timestamp: 0,
            items: lines
                .iter()
                .map(|(name, quantity)| CartItem {
                    product: product(name, 10),
                    quantity: *quantity,
                })
                .collect(),
            subtotal: Decimal::new(total, 0),
            discount: Decimal::ZERO,
            total: Decimal::new(total, 0),
            payment_method: PaymentMethod::Cash,
            remark: "r".to_string(),
        }
    }

    #[test]
    fn test_summary_aggregates_by_name() {
        let transactions = vec![
            sale(&[("Dolo", 2), ("Vicks", 1)], 70),
            sale(&[("Vicks", 4)], 40),
            sale(&[("Antacid", 4)], 20),
        ];
        let products = vec![product("Dolo", 2), product("Vicks", 9), product("Antacid", 0)];

        let summary = SalesSummary::compute(&transactions, &products);

        assert_eq!(summary.total_revenue, Decimal::new(130, 0));
        assert_eq!(summary.transaction_count, 3);
        assert_eq!(summary.low_stock_count, 2);
        assert_eq!(
            summary.order_list,
            vec![
                ItemSold { name: "Vicks".into(), quantity: 5 },
                ItemSold { name: "Antacid".into(), quantity: 4 },
                ItemSold { name: "Dolo".into(), quantity: 2 },
            ]
        );
    }

    #[test]
    fn test_empty_history() {
        let summary = SalesSummary::compute(&[], &[]);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert!(summary.order_list.is_empty());
    }
}
