use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use askama::Template;
use log::{error, info};
use tower_cookies::Cookies;

use super::database_error_message;
use crate::{
    error::{AppError, AppResult},
    models::VendorCredentials,
    session::{clear_session_cookie, session_cookie, VendorSession},
    state::AppState,
    utils::create_token,
};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    store_name: String,
    error: String,
    entered_name: String,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    store_name: String,
    error: String,
    entered_name: String,
}

pub async fn login_page(State(state): State<AppState>) -> AppResult<Html<String>> {
    super::render(&LoginTemplate {
        store_name: state.config.store_display_name.clone(),
        error: String::new(),
        entered_name: String::new(),
    })
}

pub async fn register_page(State(state): State<AppState>) -> AppResult<Html<String>> {
    super::render(&RegisterTemplate {
        store_name: state.config.store_display_name.clone(),
        error: String::new(),
        entered_name: String::new(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<VendorCredentials>,
) -> AppResult<Response> {
    match state.vendors().login(&form.store_name, &form.password).await {
        Ok(vendor_id) => start_session(&state, &cookies, &vendor_id),
        Err(e) => {
            let status = e.status_code();
            let template = LoginTemplate {
                store_name: state.config.store_display_name.clone(),
                error: login_error_message(&e),
                entered_name: form.store_name,
            };
            Ok((status, super::render(&template)?).into_response())
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<VendorCredentials>,
) -> AppResult<Response> {
    if form.password.trim().is_empty() {
        let template = RegisterTemplate {
            store_name: state.config.store_display_name.clone(),
            error: "Please choose a password.".to_string(),
            entered_name: form.store_name,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, super::render(&template)?).into_response());
    }

    match state.vendors().register(&form.store_name, &form.password).await {
        Ok(vendor_id) => {
            info!("Registered store {}", vendor_id);
            start_session(&state, &cookies, &vendor_id)
        }
        Err(e) => {
            let message = match &e {
                AppError::AlreadyExists(_) => {
                    "This Store Name is already taken. Please switch to Login below.".to_string()
                }
                AppError::Persistence(db) => {
                    error!("Registration failed: {}", db);
                    database_error_message(db)
                }
                other => other.to_string(),
            };
            let template = RegisterTemplate {
                store_name: state.config.store_display_name.clone(),
                error: message,
                entered_name: form.store_name,
            };
            Ok((e.status_code(), super::render(&template)?).into_response())
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    session: Option<VendorSession>,
    cookies: Cookies,
) -> Redirect {
    if let Some(session) = session {
        state.sessions.teardown(&session.vendor_id);
        info!("Store {} signed out", session.vendor_id);
    }
    clear_session_cookie(&cookies);
    Redirect::to("/login")
}

fn start_session(state: &AppState, cookies: &Cookies, vendor_id: &str) -> AppResult<Response> {
    let token = create_token(vendor_id, &state.config.jwt_secret, state.config.session_hours)
        .map_err(|e| {
            error!("Failed to sign session token: {}", e);
            AppError::Unauthorized
        })?;

    cookies.add(session_cookie(token, state.config.session_hours));
    Ok(Redirect::to("/inventory").into_response())
}

fn login_error_message(err: &AppError) -> String {
    match err {
        AppError::NotFound(_) => "Store not found. Please Register first.".to_string(),
        AppError::WrongPassword => "Incorrect password.".to_string(),
        AppError::Persistence(e) => {
            error!("Login failed: {}", e);
            database_error_message(e)
        }
        other => other.to_string(),
    }
}
