use std::str::FromStr;

use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, Redirect},
};
use askama::Template;
use log::{error, info};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::{failure_message, redirect_with_error, render, Shell};
use crate::{
    error::{AppError, AppResult},
    models::{PaymentMethod, Product},
    pos::{Discount, DiscountMode, PosState},
    receipt::{format_inr, Receipt},
    session::VendorSession,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct PosQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    error: Option<String>,
}

struct GridItem {
    id: String,
    name: String,
    usage: String,
    location: String,
    price: String,
    stock: i32,
    low: bool,
}

struct CartLineView {
    id: String,
    name: String,
    price: String,
    quantity: i32,
    line_total: String,
    can_increase: bool,
}

struct PaymentOption {
    value: &'static str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "pos.html")]
struct PosTemplate {
    shell: Shell,
    query: String,
    products: Vec<GridItem>,
    lines: Vec<CartLineView>,
    item_count: i32,
    subtotal: String,
    discount_mode: &'static str,
    discount_value: String,
    discount: String,
    percent_label: Option<String>,
    total: String,
    remark: String,
    payment_options: Vec<PaymentOption>,
    error: Option<String>,
}

fn build_template(
    shell: Shell,
    pos: &PosState,
    products: &[Product],
    query: String,
    error: Option<String>,
) -> PosTemplate {
    let grid = products
        .iter()
        .filter(|p| p.matches_sale_search(&query))
        .map(|p| GridItem {
            id: p.id.to_string(),
            name: p.name.clone(),
            usage: p.usage.clone(),
            location: p.location.clone(),
            price: format_inr(p.price),
            stock: p.stock,
            low: p.is_low_stock(),
        })
        .collect();

    let lines = pos
        .cart
        .items()
        .iter()
        .map(|item| {
            let stock = products
                .iter()
                .find(|p| p.id == item.product.id)
                .map(|p| p.stock)
                .unwrap_or(item.product.stock);
            CartLineView {
                id: item.product.id.to_string(),
                name: item.product.name.clone(),
                price: format_inr(item.product.price),
                quantity: item.quantity,
                line_total: format_inr(item.line_total()),
                can_increase: item.quantity < stock,
            }
        })
        .collect();

    let subtotal = pos.cart.subtotal();
    let discount = pos.discount_amount();
    let percent_label = (pos.discount.mode == DiscountMode::Percent && pos.discount.value > Decimal::ZERO)
        .then(|| format!("{}%", pos.discount.value.normalize()));

    PosTemplate {
        shell,
        query,
        products: grid,
        lines,
        item_count: pos.cart.total_quantity(),
        subtotal: format_inr(subtotal),
        discount_mode: pos.discount.mode.as_str(),
        discount_value: if pos.discount.value.is_zero() {
            String::new()
        } else {
            pos.discount.value.normalize().to_string()
        },
        discount: format_inr(discount),
        percent_label,
        total: format_inr(subtotal - discount),
        remark: pos.remark.clone(),
        payment_options: PaymentMethod::ALL
            .iter()
            .map(|m| PaymentOption {
                value: m.as_str(),
                selected: *m == pos.payment_method,
            })
            .collect(),
        error,
    }
}

pub async fn pos_page(
    State(state): State<AppState>,
    session: VendorSession,
    Query(params): Query<PosQuery>,
) -> AppResult<Html<String>> {
    let (products, error) = match state.products().list(&session.vendor_id).await {
        Ok(products) => (products, params.error),
        Err(e) => {
            error!("Failed to load products for {}: {}", session.vendor_id, e);
            (Vec::new(), Some(failure_message(&e)))
        }
    };
    let shell = Shell::new(&state, &session, "pos", "/pos");

    let template = {
        let workspace = state.sessions.workspace(&session.vendor_id);
        let pos = workspace.pos();
        build_template(shell, &pos, &products, params.q, error)
    };
    render(&template)
}

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    product_id: Uuid,
    #[serde(default)]
    q: String,
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    session: VendorSession,
    Form(form): Form<AddToCartForm>,
) -> AppResult<Redirect> {
    let product = match state.products().get(&session.vendor_id, form.product_id).await {
        Ok(product) => product,
        Err(e) => {
            error!("Failed to add {} to the cart: {}", form.product_id, e);
            return Ok(redirect_with_error("/pos", &failure_message(&e)));
        }
    };
    state
        .sessions
        .workspace(&session.vendor_id)
        .pos()
        .cart
        .add_item(&product);

    if form.q.trim().is_empty() {
        Ok(Redirect::to("/pos"))
    } else {
        Ok(Redirect::to(&format!("/pos?q={}", urlencoding::encode(form.q.trim()))))
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    delta: i32,
}

pub async fn update_quantity(
    State(state): State<AppState>,
    session: VendorSession,
    Path(id): Path<Uuid>,
    Form(form): Form<QuantityForm>,
) -> AppResult<Redirect> {
    let current_stock = match state.products().get(&session.vendor_id, id).await {
        Ok(product) => Some(product.stock),
        Err(AppError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };

    state
        .sessions
        .workspace(&session.vendor_id)
        .pos()
        .cart
        .update_quantity(id, form.delta, current_stock);
    Ok(Redirect::to("/pos"))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: VendorSession,
    Path(id): Path<Uuid>,
) -> Redirect {
    state
        .sessions
        .workspace(&session.vendor_id)
        .pos()
        .cart
        .remove_item(id);
    Redirect::to("/pos")
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscountForm {
    #[serde(default)]
    mode: String,
    #[serde(default)]
    value: String,
}

pub async fn set_discount(
    State(state): State<AppState>,
    session: VendorSession,
    Form(form): Form<DiscountForm>,
) -> Redirect {
    let mode = DiscountMode::from_str(&form.mode).unwrap_or_default();
    let discount = match Discount::parse(mode, &form.value) {
        Ok(discount) => discount,
        Err(e) => return redirect_with_error("/pos", &e.to_string()),
    };

    state.sessions.workspace(&session.vendor_id).pos().discount = discount;
    Redirect::to("/pos")
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    remark: String,
    #[serde(default)]
    payment_method: String,
}

pub async fn checkout(
    State(state): State<AppState>,
    session: VendorSession,
    Form(form): Form<CheckoutForm>,
) -> AppResult<Redirect> {
    let workspace = state.sessions.workspace(&session.vendor_id);

    let taken = {
        let mut pos = workspace.pos();
        pos.remark = form.remark;
        pos.payment_method = PaymentMethod::from_str(&form.payment_method).unwrap_or_default();
        pos.begin_checkout()
    };

    let (sale, till) = match taken {
        Ok(taken) => taken,
        Err(AppError::Validation(message)) => {
            let message = if message == "Remark is required" {
                "Remark: This field is required".to_string()
            } else {
                message
            };
            return Ok(redirect_with_error("/pos", &message));
        }
        Err(e) => return Err(e),
    };

    if let Err(e) = state.transactions().record_sale(&session.vendor_id, &sale).await {
        error!("Checkout failed for {}: {}", session.vendor_id, e);
        workspace.pos().restore(till);
        return Ok(redirect_with_error("/pos", &failure_message(&e)));
    }

    info!(
        "Sale {} recorded for {}: {} item(s), total {}",
        sale.short_id(),
        session.vendor_id,
        sale.total_quantity(),
        sale.total
    );
    Ok(Redirect::to(&format!("/pos/receipts/{}", sale.id)))
}

#[derive(Template)]
#[template(path = "receipt.html")]
struct ReceiptTemplate {
    receipt: Receipt,
}

pub async fn receipt_page(
    State(state): State<AppState>,
    session: VendorSession,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let sale = state.transactions().get(&session.vendor_id, id).await?;
    let receipt = Receipt::new(
        &sale,
        &state.config.store_display_name,
        &state.config.store_tagline,
    );
    render(&ReceiptTemplate { receipt })
}
