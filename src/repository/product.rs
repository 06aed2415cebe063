//! # Product Repository
//!
//! Vendor-scoped product storage. Every write returns the vendor's full,
//! re-queried product list so screens never render a stale row.

use log::{debug, error, info};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{plan_bulk_upsert, stock_after_sale, BillItem, Product, ProductInput, ProductRow, UpsertAction},
};

const PRODUCT_COLUMNS: &str =
    "id, name, price, stock, location, usage, low_stock_threshold, category";

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: Database,
}

impl ProductRepository {
    pub fn new(pool: Database) -> Self {
        ProductRepository { pool }
    }

    pub async fn list(&self, vendor_id: &str) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE vendor_id = $1 ORDER BY lower(name)",
            PRODUCT_COLUMNS
        ))
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Error fetching products for {}: {}", vendor_id, e);
            AppError::from(e)
        })?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn get(&self, vendor_id: &str, id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE vendor_id = $1 AND id = $2",
            PRODUCT_COLUMNS
        ))
        .bind(vendor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Inserts when the input carries no id, otherwise updates in place.
    pub async fn save(&self, vendor_id: &str, input: &ProductInput) -> AppResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        save_product(&mut *conn, vendor_id, input).await.map_err(|e| {
            error!("Error saving product '{}' for {}: {}", input.name, vendor_id, e);
            e
        })?;

        self.list(vendor_id).await
    }

    /// Deleting an id that does not exist is not an error.
    pub async fn delete(&self, vendor_id: &str, id: Uuid) -> AppResult<Vec<Product>> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND vendor_id = $2")
            .bind(id)
            .bind(vendor_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Delete of product {} for {} failed: {}", id, vendor_id, e);
                AppError::from(e)
            })?;

        debug!("Deleted {} product row(s) for {}", result.rows_affected(), vendor_id);
        self.list(vendor_id).await
    }

    /// Merges bill lines into inventory; see [`plan_bulk_upsert`].
    pub async fn bulk_upsert(&self, vendor_id: &str, items: &[BillItem]) -> AppResult<Vec<Product>> {
        let current = self.list(vendor_id).await?;
        let actions = plan_bulk_upsert(&current, items);

        let mut tx = self.pool.begin().await?;
        for action in &actions {
            match action {
                UpsertAction::Restock { id, stock, price } => {
                    sqlx::query(
                        "UPDATE products SET stock = $1, price = $2 WHERE id = $3 AND vendor_id = $4",
                    )
                    .bind(stock)
                    .bind(price)
                    .bind(id)
                    .bind(vendor_id)
                    .execute(&mut *tx)
                    .await?;
                }
                UpsertAction::Insert(input) => {
                    save_product(&mut *tx, vendor_id, input).await?;
                }
            }
        }
        tx.commit().await.map_err(|e| {
            error!("Bulk upsert for {} failed: {}", vendor_id, e);
            AppError::from(e)
        })?;

        info!("Bulk upsert applied {} change(s) for {}", actions.len(), vendor_id);
        self.list(vendor_id).await
    }
}

async fn save_product(conn: &mut PgConnection, vendor_id: &str, input: &ProductInput) -> AppResult<()> {
    if let Some(id) = input.id {
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET name = $1, price = $2, stock = $3, location = $4, usage = $5,
                low_stock_threshold = $6, category = $7
            WHERE id = $8 AND vendor_id = $9
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.location)
        .bind(&input.usage)
        .bind(input.low_stock_threshold)
        .bind(&input.category)
        .bind(id)
        .bind(vendor_id)
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() > 0 {
            return Ok(());
        }
    }

    sqlx::query(
        r#"
        INSERT INTO products (id, vendor_id, name, price, stock, location, usage, low_stock_threshold, category)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(input.id.unwrap_or_else(Uuid::new_v4))
    .bind(vendor_id)
    .bind(&input.name)
    .bind(input.price)
    .bind(input.stock)
    .bind(&input.location)
    .bind(&input.usage)
    .bind(input.low_stock_threshold)
    .bind(&input.category)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Takes sold quantities off the shelf, flooring each product at zero. Runs on
/// the caller's connection so checkout can keep it inside its own transaction.
pub(crate) async fn decrement_stock(
    conn: &mut PgConnection,
    vendor_id: &str,
    sold: &[(Uuid, i32)],
) -> AppResult<()> {
    for (id, quantity) in sold {
        let current: Option<i32> = sqlx::query_scalar(
            "SELECT stock FROM products WHERE id = $1 AND vendor_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(vendor_id)
        .fetch_optional(&mut *conn)
        .await?;

        // Products deleted since they were put in the cart are skipped.
        let Some(current) = current else {
            debug!("Product {} no longer exists for {}; skipping stock update", id, vendor_id);
            continue;
        };

        sqlx::query("UPDATE products SET stock = $1 WHERE id = $2 AND vendor_id = $3")
            .bind(stock_after_sale(current, *quantity))
            .bind(id)
            .bind(vendor_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    use super::*;

    pub(crate) async fn seed_vendor(pool: &PgPool, vendor_id: &str) {
        sqlx::query("INSERT INTO vendors (id) VALUES ($1)")
            .bind(vendor_id)
            .execute(pool)
            .await
            .unwrap();
    }

    pub(crate) fn input(name: &str, price: i64, stock: i32) -> ProductInput {
        ProductInput {
            id: None,
            name: name.to_string(),
            price: Decimal::new(price, 0),
            stock,
            location: "Rack 1".to_string(),
            usage: "Fever".to_string(),
            low_stock_threshold: 2,
            category: "General".to_string(),
        }
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_save_then_list_is_vendor_scoped(pool: PgPool) {
        seed_vendor(&pool, "main_store").await;
        seed_vendor(&pool, "other_store").await;
        let products = ProductRepository::new(pool);

        let listed = products.save("main_store", &input("Dolo 650", 30, 10)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Dolo 650");
        assert_eq!(listed[0].price, Decimal::new(30, 0));
        assert_eq!(listed[0].stock, 10);

        let edited = ProductInput {
            id: Some(listed[0].id),
            stock: 4,
            ..input("Dolo 650", 32, 10)
        };
        let listed = products.save("main_store", &edited).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].stock, 4);
        assert_eq!(listed[0].price, Decimal::new(32, 0));

        assert!(products.list("other_store").await.unwrap().is_empty());
        assert!(matches!(
            products.get("other_store", listed[0].id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_delete_is_idempotent(pool: PgPool) {
        seed_vendor(&pool, "main_store").await;
        let products = ProductRepository::new(pool);

        products.save("main_store", &input("Vicks", 90, 3)).await.unwrap();
        let listed = products.save("main_store", &input("Antacid", 20, 40)).await.unwrap();
        let vicks = listed.iter().find(|p| p.name == "Vicks").unwrap().id;

        let once = products.delete("main_store", vicks).await.unwrap();
        let twice = products.delete("main_store", vicks).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
        assert_eq!(once[0].name, "Antacid");
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_bulk_upsert_restocks_and_inserts(pool: PgPool) {
        seed_vendor(&pool, "main_store").await;
        let products = ProductRepository::new(pool);
        products.save("main_store", &input("Dolo 650", 30, 10)).await.unwrap();

        let bill = [
            BillItem {
                name: Some("dolo 650".to_string()),
                stock: Some(5),
                price: Some(Decimal::new(28, 0)),
                usage: None,
                location: None,
                low_stock_threshold: None,
            },
            BillItem {
                name: Some("ORS Sachet".to_string()),
                stock: Some(20),
                price: None,
                usage: None,
                location: None,
                low_stock_threshold: None,
            },
        ];
        let listed = products.bulk_upsert("main_store", &bill).await.unwrap();

        assert_eq!(listed.len(), 2);
        let dolo = listed.iter().find(|p| p.name == "Dolo 650").unwrap();
        assert_eq!(dolo.stock, 15);
        assert_eq!(dolo.price, Decimal::new(28, 0));
        let ors = listed.iter().find(|p| p.name == "ORS Sachet").unwrap();
        assert_eq!(ors.stock, 20);
        assert_eq!(ors.location, "Unsorted");
    }
}
