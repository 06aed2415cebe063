use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use askama::Template;
use log::error;

use super::{failure_message, redirect_with_notice, render, Flash, Shell};
use crate::{
    error::{AppError, AppResult},
    models::{Product, Transaction},
    receipt::{format_date, format_inr, format_time},
    sales::{ItemSold, SalesSummary},
    session::VendorSession,
    state::AppState,
};

const ITEM_PREVIEW_CHARS: usize = 30;

struct TransactionView {
    id: String,
    short_id: String,
    date: String,
    time: String,
    item_count: usize,
    items_preview: String,
    remark: String,
    total: String,
    payment_method: &'static str,
}

impl From<&Transaction> for TransactionView {
    fn from(t: &Transaction) -> Self {
        let names = t.items.iter().map(|i| i.product.name.as_str()).collect::<Vec<_>>().join(", ");
        let items_preview = if names.chars().count() > ITEM_PREVIEW_CHARS {
            format!("{}...", names.chars().take(ITEM_PREVIEW_CHARS).collect::<String>())
        } else {
            names
        };

        TransactionView {
            id: t.id.to_string(),
            short_id: t.short_id(),
            date: format_date(t.timestamp),
            time: format_time(t.timestamp),
            item_count: t.items.len(),
            items_preview,
            remark: t.remark.clone(),
            total: format_inr(t.total),
            payment_method: t.payment_method.as_str(),
        }
    }
}

#[derive(Template)]
#[template(path = "sales.html")]
struct SalesTemplate {
    shell: Shell,
    total_revenue: String,
    transaction_count: usize,
    low_stock_count: usize,
    order_list: Vec<ItemSold>,
    transactions: Vec<TransactionView>,
    /// False when the history could not be read; totals are then unknown.
    history_loaded: bool,
    error: Option<String>,
    notice: Option<String>,
}

fn build_template(
    shell: Shell,
    transactions: Option<&[Transaction]>,
    products: &[Product],
    flash: Flash,
) -> SalesTemplate {
    let history = transactions.unwrap_or_default();
    let summary = SalesSummary::compute(history, products);
    SalesTemplate {
        shell,
        total_revenue: format_inr(summary.total_revenue),
        transaction_count: summary.transaction_count,
        low_stock_count: summary.low_stock_count,
        order_list: summary.order_list,
        transactions: history.iter().map(TransactionView::from).collect(),
        history_loaded: transactions.is_some(),
        error: flash.error,
        notice: flash.notice,
    }
}

fn page(
    state: &AppState,
    session: &VendorSession,
    transactions: Option<&[Transaction]>,
    products: &[Product],
    flash: Flash,
) -> AppResult<Html<String>> {
    let shell = Shell::new(state, session, "sales", "/sales");
    render(&build_template(shell, transactions, products, flash))
}

async fn load_products(state: &AppState, session: &VendorSession) -> AppResult<Vec<Product>> {
    state.products().list(&session.vendor_id).await.map_err(|e| {
        error!("Failed to load products for {}: {}", session.vendor_id, e);
        e
    })
}

pub async fn sales_page(
    State(state): State<AppState>,
    session: VendorSession,
    Query(flash): Query<Flash>,
) -> AppResult<Html<String>> {
    let mut failure = None;
    let transactions = match state.transactions().list(&session.vendor_id).await {
        Ok(transactions) => Some(transactions),
        Err(e) => {
            failure = Some(failure_message(&e));
            None
        }
    };
    let products = match load_products(&state, &session).await {
        Ok(products) => products,
        Err(e) => {
            failure = failure.or_else(|| Some(failure_message(&e)));
            Vec::new()
        }
    };

    let flash = Flash {
        error: failure.or(flash.error),
        notice: flash.notice,
    };
    page(&state, &session, transactions.as_deref(), &products, flash)
}

/// Deletes the vendor's sales history. On failure the page shows the
/// history as it still stands.
pub async fn reset_history(
    State(state): State<AppState>,
    session: VendorSession,
) -> AppResult<Response> {
    match state.transactions().reset(&session.vendor_id).await {
        Ok(()) => Ok(redirect_with_notice("/sales", "Sales history has been successfully reset.").into_response()),
        Err(failure) => {
            let products = load_products(&state, &session).await.unwrap_or_default();
            let flash = Flash {
                error: Some(reset_failure_message(&failure.error)),
                notice: None,
            };
            let html = page(&state, &session, failure.transactions.as_deref(), &products, flash)?;
            Ok((StatusCode::INTERNAL_SERVER_ERROR, html).into_response())
        }
    }
}

fn reset_failure_message(error: &AppError) -> String {
    format!(
        "Failed to reset history: {}. Please run the SQL script in the Help section to fix permissions.",
        error
    )
}
