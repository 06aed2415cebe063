use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use askama::Template;
use log::{error, info};
use serde::Deserialize;
use uuid::Uuid;

use super::{failure_message, redirect_with_error, redirect_with_notice, render, Flash, Shell};
use crate::{
    error::{AppError, AppResult},
    models::{Product, ProductForm, ProductInput, DEFAULT_LOW_STOCK_THRESHOLD},
    receipt::format_inr,
    session::VendorSession,
    state::AppState,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockFilter {
    #[default]
    All,
    ZeroStock,
    LowStock,
}

impl StockFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockFilter::All => "all",
            StockFilter::ZeroStock => "zero-stock",
            StockFilter::LowStock => "low-stock",
        }
    }

    /// Low stock here excludes items that are already out.
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            StockFilter::All => true,
            StockFilter::ZeroStock => product.stock == 0,
            StockFilter::LowStock => product.stock > 0 && product.is_low_stock(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    filter: StockFilter,
    #[serde(default)]
    edit: Option<Uuid>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    notice: Option<String>,
}

struct ProductView {
    id: String,
    name: String,
    usage: String,
    location: String,
    price: String,
    stock: i32,
    low_stock_threshold: i32,
    /// "out", "low" or "ok"
    status: &'static str,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        let status = if p.is_out_of_stock() {
            "out"
        } else if p.is_low_stock() {
            "low"
        } else {
            "ok"
        };
        ProductView {
            id: p.id.to_string(),
            name: p.name.clone(),
            usage: p.usage.clone(),
            location: p.location.clone(),
            price: format_inr(p.price),
            stock: p.stock,
            low_stock_threshold: p.low_stock_threshold,
            status,
        }
    }
}

/// Values shown in the add/edit form.
struct FormView {
    id: String,
    name: String,
    price: String,
    stock: String,
    location: String,
    usage: String,
    low_stock_threshold: String,
}

impl FormView {
    fn empty() -> Self {
        FormView {
            id: String::new(),
            name: String::new(),
            price: String::new(),
            stock: String::new(),
            location: String::new(),
            usage: String::new(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD.to_string(),
        }
    }

    fn editing(&self) -> bool {
        !self.id.is_empty()
    }
}

impl From<&Product> for FormView {
    fn from(p: &Product) -> Self {
        FormView {
            id: p.id.to_string(),
            name: p.name.clone(),
            price: p.price.to_string(),
            stock: p.stock.to_string(),
            location: p.location.clone(),
            usage: p.usage.clone(),
            low_stock_threshold: p.low_stock_threshold.to_string(),
        }
    }
}

impl From<&ProductForm> for FormView {
    fn from(f: &ProductForm) -> Self {
        FormView {
            id: f.id.clone(),
            name: f.name.clone(),
            price: f.price.clone(),
            stock: f.stock.clone(),
            location: f.location.clone(),
            usage: f.usage.clone(),
            low_stock_threshold: f.low_stock_threshold.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "inventory.html")]
struct InventoryTemplate {
    shell: Shell,
    products: Vec<ProductView>,
    total_count: usize,
    query: String,
    filter: &'static str,
    form: FormView,
    error: Option<String>,
    notice: Option<String>,
}

fn filter_products<'a>(products: &'a [Product], query: &str, filter: StockFilter) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.matches_inventory_search(query) && filter.matches(p))
        .collect()
}

fn build_template(
    shell: Shell,
    products: &[Product],
    query: String,
    filter: StockFilter,
    form: FormView,
    flash: Flash,
) -> InventoryTemplate {
    InventoryTemplate {
        shell,
        products: filter_products(products, &query, filter)
            .into_iter()
            .map(ProductView::from)
            .collect(),
        total_count: products.len(),
        query,
        filter: filter.as_str(),
        form,
        error: flash.error,
        notice: flash.notice,
    }
}

fn page(
    state: &AppState,
    session: &VendorSession,
    products: &[Product],
    query: String,
    filter: StockFilter,
    form: FormView,
    flash: Flash,
) -> AppResult<Html<String>> {
    let shell = Shell::new(state, session, "inventory", "/inventory");
    render(&build_template(shell, products, query, filter, form, flash))
}

/// An unreadable shelf is shown as empty with the failure as the page error.
async fn load_products(state: &AppState, session: &VendorSession) -> (Vec<Product>, Option<String>) {
    match state.products().list(&session.vendor_id).await {
        Ok(products) => (products, None),
        Err(e) => {
            error!("Failed to load products for {}: {}", session.vendor_id, e);
            (Vec::new(), Some(failure_message(&e)))
        }
    }
}

/// Shows the form again with what was typed and why it was not saved.
async fn reject_form(
    state: &AppState,
    session: &VendorSession,
    entered: FormView,
    status: StatusCode,
    message: String,
) -> AppResult<Response> {
    let (products, _) = load_products(state, session).await;
    let flash = Flash {
        error: Some(message),
        notice: None,
    };
    let html = page(state, session, &products, String::new(), StockFilter::All, entered, flash)?;
    Ok((status, html).into_response())
}

pub async fn inventory_page(
    State(state): State<AppState>,
    session: VendorSession,
    Query(params): Query<InventoryQuery>,
) -> AppResult<Html<String>> {
    let (products, load_error) = load_products(&state, &session).await;

    let form = params
        .edit
        .and_then(|id| products.iter().find(|p| p.id == id))
        .map(FormView::from)
        .unwrap_or_else(FormView::empty);

    let flash = Flash {
        error: load_error.or(params.error),
        notice: params.notice,
    };
    page(&state, &session, &products, params.q, params.filter, form, flash)
}

pub async fn save_product(
    State(state): State<AppState>,
    session: VendorSession,
    Form(form): Form<ProductForm>,
) -> AppResult<Response> {
    let entered = FormView::from(&form);
    let input = match ProductInput::try_from(form) {
        Ok(input) => input,
        Err(AppError::Validation(message)) => {
            return reject_form(&state, &session, entered, StatusCode::UNPROCESSABLE_ENTITY, message).await;
        }
        Err(e) => return Err(e),
    };

    let updated = input.id.is_some();
    if let Err(e) = state.products().save(&session.vendor_id, &input).await {
        error!("Failed to save {} for {}: {}", input.name, session.vendor_id, e);
        return reject_form(&state, &session, entered, e.status_code(), failure_message(&e)).await;
    }
    info!(
        "{} {} for {}",
        if updated { "Updated" } else { "Added" },
        input.name,
        session.vendor_id
    );

    let notice = if updated { "Item updated." } else { "Item added." };
    Ok(redirect_with_notice("/inventory", notice).into_response())
}

pub async fn delete_product(
    State(state): State<AppState>,
    session: VendorSession,
    Path(id): Path<Uuid>,
) -> Redirect {
    if let Err(e) = state.products().delete(&session.vendor_id, id).await {
        error!("Failed to delete product {} for {}: {}", id, session.vendor_id, e);
        return redirect_with_error("/inventory", &failure_message(&e));
    }
    info!("Deleted product {} for {}", id, session.vendor_id);
    Redirect::to("/inventory")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::ai::assistant::Conversation;
    use crate::handlers::AssistantPanel;
    use crate::pos::cart::tests::test_product;

    fn shell() -> Shell {
        Shell {
            store_name: "Store".to_string(),
            tagline: "by Rinku".to_string(),
            vendor_id: "main_store".to_string(),
            active: "inventory",
            path: "/inventory".to_string(),
            assistant: AssistantPanel::from_conversation(&Conversation::new(), None),
        }
    }

    fn shelf() -> Vec<Product> {
        let mut dolo = test_product("Dolo 650", Decimal::new(30, 0), 0);
        dolo.usage = "Fever".to_string();
        let mut vicks = test_product("Vicks", Decimal::new(90, 0), 2);
        vicks.location = "Rack 3".to_string();
        let antacid = test_product("Antacid", Decimal::new(20, 0), 40);
        vec![dolo, vicks, antacid]
    }

    fn names(products: Vec<&Product>) -> Vec<&str> {
        products.into_iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_stock_filters() {
        let products = shelf();
        assert_eq!(names(filter_products(&products, "", StockFilter::All)).len(), 3);
        assert_eq!(names(filter_products(&products, "", StockFilter::ZeroStock)), vec!["Dolo 650"]);
        assert_eq!(names(filter_products(&products, "", StockFilter::LowStock)), vec!["Vicks"]);
    }

    #[test]
    fn test_search_covers_usage_and_location() {
        let products = shelf();
        assert_eq!(names(filter_products(&products, "fever", StockFilter::All)), vec!["Dolo 650"]);
        assert_eq!(names(filter_products(&products, "rack 3", StockFilter::All)), vec!["Vicks"]);
        assert!(filter_products(&products, "rack 3", StockFilter::ZeroStock).is_empty());
    }

    #[test]
    fn test_filter_query_values() {
        let uri: axum::http::Uri = "/inventory?q=dolo&filter=low-stock".parse().unwrap();
        let Query(query) = Query::<InventoryQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.q, "dolo");
        assert_eq!(query.filter, StockFilter::LowStock);
        assert!(query.edit.is_none());
    }

    #[test]
    fn test_product_status() {
        let products = shelf();
        let views: Vec<ProductView> = products.iter().map(ProductView::from).collect();
        assert_eq!(views[0].status, "out");
        assert_eq!(views[1].status, "low");
        assert_eq!(views[2].status, "ok");
        assert_eq!(views[2].price, "₹20.00");
    }

    #[test]
    fn test_rejected_save_keeps_entered_values() {
        let entered = FormView {
            id: String::new(),
            name: "Cetirizine".to_string(),
            price: "18.50".to_string(),
            stock: "12".to_string(),
            location: "Rack 1".to_string(),
            usage: "Allergy".to_string(),
            low_stock_threshold: "10".to_string(),
        };
        let failure = AppError::Persistence(sqlx::Error::PoolTimedOut);
        let flash = Flash {
            error: Some(failure_message(&failure)),
            notice: None,
        };

        let html = build_template(shell(), &shelf(), String::new(), StockFilter::All, entered, flash)
            .render()
            .unwrap();

        assert!(html.contains("Database Error: "));
        assert!(html.contains("Cetirizine"));
        assert!(html.contains("18.50"));
    }
}
