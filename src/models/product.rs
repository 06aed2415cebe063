use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 2;
pub const DEFAULT_CATEGORY: &str = "General";

fn default_threshold() -> i32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A product as the rest of the application sees it. Also the shape that is
/// frozen into transaction line items, hence the camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i32,
    #[serde(default = "default_category")]
    pub category: String,
}

impl Product {
    pub fn is_out_of_stock(&self) -> bool {
        self.stock <= 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    /// Case-insensitive substring match against the given fields.
    fn matches(&self, needle: &str, fields: &[&str]) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&needle))
    }

    /// Search used on the point-of-sale grid: name or medical usage.
    pub fn matches_sale_search(&self, needle: &str) -> bool {
        self.matches(needle, &[&self.name, &self.usage])
    }

    /// Search used on the inventory screen: name, usage or shelf location.
    pub fn matches_inventory_search(&self, needle: &str) -> bool {
        self.matches(needle, &[&self.name, &self.usage, &self.location])
    }
}

#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub location: Option<String>,
    pub usage: Option<String>,
    pub low_stock_threshold: Option<i32>,
    pub category: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            stock: row.stock,
            location: row.location.unwrap_or_default(),
            usage: row.usage.unwrap_or_default(),
            low_stock_threshold: row.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            category: row.category.unwrap_or_else(default_category),
        }
    }
}

/// Validated input for creating (no id) or updating (id) a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub id: Option<Uuid>,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub location: String,
    pub usage: String,
    pub low_stock_threshold: i32,
    pub category: String,
}

/// Inventory form as posted by the browser; every field arrives as text.
#[derive(Debug, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub low_stock_threshold: String,
}

impl TryFrom<ProductForm> for ProductInput {
    type Error = AppError;

    fn try_from(form: ProductForm) -> AppResult<Self> {
        let name = form.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Item name is required"));
        }

        let id = match form.id.trim() {
            "" => None,
            raw => Some(
                Uuid::parse_str(raw).map_err(|_| AppError::validation("Unknown product id"))?,
            ),
        };

        let price = Decimal::from_str(form.price.trim())
            .map_err(|_| AppError::validation("Price must be a number"))?;
        if price.is_sign_negative() {
            return Err(AppError::validation("Price cannot be negative"));
        }

        let stock: i32 = form
            .stock
            .trim()
            .parse()
            .map_err(|_| AppError::validation("Stock must be a whole number"))?;
        if stock < 0 {
            return Err(AppError::validation("Stock cannot be negative"));
        }

        let low_stock_threshold = match form.low_stock_threshold.trim() {
            "" => DEFAULT_LOW_STOCK_THRESHOLD,
            raw => raw
                .parse::<i32>()
                .ok()
                .filter(|t| *t >= 0)
                .ok_or_else(|| AppError::validation("Low stock alert must be a whole number"))?,
        };

        let location = match form.location.trim() {
            "" => "Unassigned".to_string(),
            l => l.to_string(),
        };
        let usage = match form.usage.trim() {
            "" => "General Health".to_string(),
            u => u.to_string(),
        };

        Ok(ProductInput {
            id,
            name,
            price: price.round_dp(2),
            stock,
            location,
            usage,
            low_stock_threshold,
            category: DEFAULT_CATEGORY.to_string(),
        })
    }
}

/// One line of an incoming wholesale bill, as emitted by the assistant.
/// Everything except the name is optional and filled in on insert.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub low_stock_threshold: Option<i32>,
}

/// What bulk upsert will do for one product.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertAction {
    Restock { id: Uuid, stock: i32, price: Decimal },
    Insert(ProductInput),
}

/// Merges bill lines into the current inventory.
///
/// Names match case-insensitively after trimming. A match adds the incoming
/// quantity to the stock on hand and takes the incoming price when one is
/// given; anything else becomes a new product. Lines without a name are
/// skipped, and repeated names within one bill accumulate. Negative
/// quantities, prices and thresholds from a bill are ignored, and stock
/// saturates at `i32::MAX`.
pub fn plan_bulk_upsert(existing: &[Product], incoming: &[BillItem]) -> Vec<UpsertAction> {
    let mut actions: Vec<UpsertAction> = Vec::new();

    for item in incoming {
        let Some(name) = item.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let key = name.to_lowercase();
        let added = item.stock.unwrap_or(0).max(0);
        let incoming_price = item.price.filter(|p| !p.is_sign_negative());

        let pending = actions.iter_mut().find(|action| match action {
            UpsertAction::Restock { id, .. } => existing
                .iter()
                .any(|p| p.id == *id && p.name.trim().to_lowercase() == key),
            UpsertAction::Insert(input) => input.name.to_lowercase() == key,
        });

        match pending {
            Some(UpsertAction::Restock { stock, price, .. }) => {
                *stock = stock.saturating_add(added);
                if let Some(p) = incoming_price {
                    *price = p;
                }
            }
            Some(UpsertAction::Insert(input)) => {
                input.stock = input.stock.saturating_add(added);
                if let Some(p) = incoming_price {
                    input.price = p;
                }
            }
            None => match existing.iter().find(|p| p.name.trim().to_lowercase() == key) {
                Some(product) => actions.push(UpsertAction::Restock {
                    id: product.id,
                    stock: product.stock.max(0).saturating_add(added),
                    price: incoming_price.unwrap_or(product.price),
                }),
                None => actions.push(UpsertAction::Insert(ProductInput {
                    id: None,
                    name: name.to_string(),
                    price: incoming_price.unwrap_or_default(),
                    stock: added,
                    location: item.location.clone().unwrap_or_else(|| "Unsorted".to_string()),
                    usage: item.usage.clone().unwrap_or_else(|| "General".to_string()),
                    low_stock_threshold: item
                        .low_stock_threshold
                        .filter(|t| *t >= 0)
                        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
                    category: DEFAULT_CATEGORY.to_string(),
                })),
            },
        }
    }

    actions
}

/// Stock left after selling `sold` units; never negative.
pub fn stock_after_sale(current: i32, sold: i32) -> i32 {
    current.saturating_sub(sold).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn product(name: &str, stock: i32, price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: Decimal::new(price, 0),
            stock,
            location: "Shelf A".to_string(),
            usage: "Fever".to_string(),
            low_stock_threshold: 2,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    fn bill(name: &str, stock: i32, price: Option<Decimal>) -> BillItem {
        BillItem {
            name: Some(name.to_string()),
            stock: Some(stock),
            price,
            usage: None,
            location: None,
            low_stock_threshold: None,
        }
    }

    #[test]
    fn test_bulk_upsert_adds_to_existing_stock_case_insensitively() {
        let existing = vec![product("Paracetamol", 10, 5)];
        let actions = plan_bulk_upsert(&existing, &[bill("paracetamol", 5, None)]);

        assert_eq!(
            actions,
            vec![UpsertAction::Restock {
                id: existing[0].id,
                stock: 15,
                price: Decimal::new(5, 0),
            }]
        );
    }

    #[test]
    fn test_bulk_upsert_overwrites_price_when_given() {
        let existing = vec![product("Cetirizine", 3, 2)];
        let actions = plan_bulk_upsert(&existing, &[bill("CETIRIZINE", 7, Some(Decimal::new(450, 2)))]);

        match &actions[0] {
            UpsertAction::Restock { stock, price, .. } => {
                assert_eq!(*stock, 10);
                assert_eq!(*price, Decimal::new(450, 2));
            }
            other => panic!("expected restock, got {:?}", other),
        }
    }

    #[test]
    fn test_bulk_upsert_inserts_unknown_with_defaults() {
        let actions = plan_bulk_upsert(&[], &[bill("ORS Sachet", 20, None)]);

        match &actions[0] {
            UpsertAction::Insert(input) => {
                assert_eq!(input.name, "ORS Sachet");
                assert_eq!(input.stock, 20);
                assert_eq!(input.price, Decimal::ZERO);
                assert_eq!(input.location, "Unsorted");
                assert_eq!(input.usage, "General");
                assert_eq!(input.low_stock_threshold, 2);
            }
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_bulk_upsert_skips_nameless_and_merges_repeats() {
        let existing = vec![product("Dolo 650", 1, 30)];
        let nameless = BillItem {
            name: Some("   ".to_string()),
            ..bill("x", 4, None)
        };
        let actions = plan_bulk_upsert(
            &existing,
            &[
                bill("dolo 650", 2, None),
                nameless,
                bill("Dolo 650", 3, None),
                bill("Vicks", 1, None),
                bill("vicks", 1, None),
            ],
        );

        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], UpsertAction::Restock { stock: 6, .. }));
        assert!(matches!(&actions[1], UpsertAction::Insert(i) if i.stock == 2));
    }

    #[test]
    fn test_bulk_upsert_saturates_large_quantities() {
        let existing = vec![product("Dolo 650", 2_000_000_000, 30)];
        let actions = plan_bulk_upsert(
            &existing,
            &[
                bill("Dolo 650", 500_000_000, None),
                bill("ORS", i32::MAX, None),
                bill("ors", i32::MAX, None),
            ],
        );

        assert!(matches!(actions[0], UpsertAction::Restock { stock, .. } if stock == i32::MAX));
        assert!(matches!(&actions[1], UpsertAction::Insert(i) if i.stock == i32::MAX));
    }

    #[test]
    fn test_bulk_upsert_ignores_negative_values() {
        let existing = vec![product("Vicks", 8, 90)];
        let negative = BillItem {
            low_stock_threshold: Some(-4),
            ..bill("Antacid", -5, Some(Decimal::new(-10, 0)))
        };
        let actions = plan_bulk_upsert(&existing, &[bill("vicks", -3, Some(Decimal::new(-1, 0))), negative]);

        assert_eq!(
            actions[0],
            UpsertAction::Restock {
                id: existing[0].id,
                stock: 8,
                price: Decimal::new(90, 0),
            }
        );
        match &actions[1] {
            UpsertAction::Insert(input) => {
                assert_eq!(input.stock, 0);
                assert_eq!(input.price, Decimal::ZERO);
                assert_eq!(input.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
            }
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_stock_after_sale_floors_at_zero() {
        assert_eq!(stock_after_sale(10, 3), 7);
        assert_eq!(stock_after_sale(2, 5), 0);
        assert_eq!(stock_after_sale(0, 1), 0);
    }

    #[test]
    fn test_form_applies_defaults() {
        let form = ProductForm {
            name: " Paracetamol 500mg ".to_string(),
            price: "12.5".to_string(),
            stock: "40".to_string(),
            ..Default::default()
        };
        let input = ProductInput::try_from(form).unwrap();

        assert_eq!(input.id, None);
        assert_eq!(input.name, "Paracetamol 500mg");
        assert_eq!(input.price, Decimal::new(1250, 2));
        assert_eq!(input.low_stock_threshold, 2);
        assert_eq!(input.location, "Unassigned");
        assert_eq!(input.usage, "General Health");
    }

    #[test]
    fn test_form_rejects_bad_values() {
        let missing_name = ProductForm {
            price: "1".to_string(),
            stock: "1".to_string(),
            ..Default::default()
        };
        assert!(matches!(ProductInput::try_from(missing_name), Err(AppError::Validation(_))));

        let negative_stock = ProductForm {
            name: "Vicks".to_string(),
            price: "1".to_string(),
            stock: "-3".to_string(),
            ..Default::default()
        };
        assert!(matches!(ProductInput::try_from(negative_stock), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_row_defaults() {
        let row = ProductRow {
            id: Uuid::new_v4(),
            name: "Legacy".to_string(),
            price: Decimal::ONE,
            stock: 1,
            location: None,
            usage: None,
            low_stock_threshold: None,
            category: None,
        };
        let product = Product::from(row);
        assert_eq!(product.low_stock_threshold, 2);
        assert_eq!(product.category, "General");
        assert_eq!(product.location, "");
    }

    #[test]
    fn test_search_fields() {
        let p = product("Dolo 650", 4, 30);
        assert!(p.matches_sale_search("fev"));
        assert!(p.matches_sale_search("DOLO"));
        assert!(!p.matches_sale_search("shelf"));
        assert!(p.matches_inventory_search("shelf"));
        assert!(p.matches_inventory_search(""));
    }
}
