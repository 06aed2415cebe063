//! # Transaction Repository
//!
//! Append-only sales log. Recording a sale writes the transaction row and
//! takes the sold quantities off the shelf in one database transaction.

use log::{error, info};
use sqlx::types::Json;
use uuid::Uuid;

use super::product::decrement_stock;
use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{Transaction, TransactionRow},
};

const TRANSACTION_COLUMNS: &str =
    "id, timestamp, items, subtotal, discount, total, payment_method, remark";

/// A failed history reset, carrying the history as it still stands.
/// `transactions` is `None` when the history could not be read back either.
#[derive(Debug)]
pub struct ResetFailure {
    pub error: AppError,
    pub transactions: Option<Vec<Transaction>>,
}

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: Database,
}

impl TransactionRepository {
    pub fn new(pool: Database) -> Self {
        TransactionRepository { pool }
    }

    /// Newest first.
    pub async fn list(&self, vendor_id: &str) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE vendor_id = $1 ORDER BY timestamp DESC",
            TRANSACTION_COLUMNS
        ))
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Get transactions for {} failed: {}", vendor_id, e);
            AppError::from(e)
        })?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    pub async fn get(&self, vendor_id: &str, id: Uuid) -> AppResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE vendor_id = $1 AND id = $2",
            TRANSACTION_COLUMNS
        ))
        .bind(vendor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        Ok(row.into())
    }

    /// Stores the sale and decrements stock for every line, atomically.
    pub async fn record_sale(&self, vendor_id: &str, sale: &Transaction) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, vendor_id, timestamp, items, subtotal, discount, total, payment_method, remark)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(sale.id)
        .bind(vendor_id)
        .bind(sale.timestamp)
        .bind(Json(&sale.items))
        .bind(sale.subtotal)
        .bind(sale.discount)
        .bind(sale.total)
        .bind(sale.payment_method.as_str())
        .bind(&sale.remark)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Save transaction for {} failed: {}", vendor_id, e);
            AppError::from(e)
        })?;

        let sold: Vec<(Uuid, i32)> = sale
            .items
            .iter()
            .map(|item| (item.product.id, item.quantity))
            .collect();
        decrement_stock(&mut *tx, vendor_id, &sold).await?;

        tx.commit().await?;
        info!("Recorded sale {} for {} ({} lines)", sale.id, vendor_id, sale.items.len());
        Ok(())
    }

    /// Deletes the whole sales history of a vendor.
    pub async fn reset(&self, vendor_id: &str) -> Result<(), ResetFailure> {
        let result = sqlx::query("DELETE FROM transactions WHERE vendor_id = $1")
            .bind(vendor_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                info!("Reset {} transaction(s) for {}", done.rows_affected(), vendor_id);
                Ok(())
            }
            Err(e) => {
                error!("Reset transactions for {} failed: {}", vendor_id, e);
                let transactions = match self.list(vendor_id).await {
                    Ok(transactions) => Some(transactions),
                    Err(reread) => {
                        error!("History for {} unreadable after failed reset: {}", vendor_id, reread);
                        None
                    }
                };
                Err(ResetFailure {
                    error: e.into(),
                    transactions,
                })
            }
        }
    }
}
