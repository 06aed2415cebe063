mod ai;
mod config;
mod database;
mod error;
mod handlers;
mod models;
mod pos;
mod receipt;
mod repository;
mod sales;
mod session;
mod state;
mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use log::{error, info, warn};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use ai::gemini::GeminiClient;
use config::AppConfig;
use database::{create_database_pool, run_migrations};
use state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let db = create_database_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; AI insights and the assistant will be unavailable");
    }
    let model = Arc::new(GeminiClient::new(&config));

    let addr = format!("0.0.0.0:{}", config.port);
    let app = create_router(AppState::new(db, config, model));

    info!("Medistore listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        // Vendor identity
        .route("/login", get(handlers::auth::login_page).post(handlers::auth::login))
        .route("/register", get(handlers::auth::register_page).post(handlers::auth::register))
        .route("/logout", post(handlers::auth::logout))
        // Inventory
        .route("/inventory", get(handlers::inventory::inventory_page).post(handlers::inventory::save_product))
        .route("/inventory/:id/delete", post(handlers::inventory::delete_product))
        // Point of sale
        .route("/pos", get(handlers::pos::pos_page))
        .route("/pos/cart/add", post(handlers::pos::add_to_cart))
        .route("/pos/cart/:id/quantity", post(handlers::pos::update_quantity))
        .route("/pos/cart/:id/remove", post(handlers::pos::remove_from_cart))
        .route("/pos/discount", post(handlers::pos::set_discount))
        .route("/pos/checkout", post(handlers::pos::checkout))
        .route("/pos/receipts/:id", get(handlers::pos::receipt_page))
        // Sales & orders
        .route("/sales", get(handlers::sales::sales_page))
        .route("/sales/reset", post(handlers::sales::reset_history))
        // AI
        .route("/insights", get(handlers::insights::insights_page).post(handlers::insights::generate_report))
        .route("/assistant/messages", post(handlers::assistant::send_message))
        .route("/assistant/reset", post(handlers::assistant::reset_conversation))
        // Database setup guide
        .route("/help", get(handlers::help::help_page))
        .nest_service("/static", ServeDir::new("static"))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
