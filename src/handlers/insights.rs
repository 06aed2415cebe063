use axum::{extract::State, response::Html};
use askama::Template;

use super::{render, Shell};
use crate::{
    ai::{insights::generate_insights, markdown},
    error::AppResult,
    session::VendorSession,
    state::AppState,
};

#[derive(Template)]
#[template(path = "insights.html")]
struct InsightsTemplate {
    shell: Shell,
    product_count: usize,
    transaction_count: usize,
    /// Rendered report; `None` until one has been requested
    report_html: Option<String>,
}

pub async fn insights_page(
    State(state): State<AppState>,
    session: VendorSession,
) -> AppResult<Html<String>> {
    let products = state.products().list(&session.vendor_id).await?;
    let transactions = state.transactions().list(&session.vendor_id).await?;

    render(&InsightsTemplate {
        shell: Shell::new(&state, &session, "insights", "/insights"),
        product_count: products.len(),
        transaction_count: transactions.len(),
        report_html: None,
    })
}

pub async fn generate_report(
    State(state): State<AppState>,
    session: VendorSession,
) -> AppResult<Html<String>> {
    let products = state.products().list(&session.vendor_id).await?;
    let transactions = state.transactions().list(&session.vendor_id).await?;

    let report = generate_insights(state.model.as_ref(), &products, &transactions).await;

    render(&InsightsTemplate {
        shell: Shell::new(&state, &session, "insights", "/insights"),
        product_count: products.len(),
        transaction_count: transactions.len(),
        report_html: Some(markdown::render(&report)),
    })
}
