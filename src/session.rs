//! Who is signed in, and the in-memory state that belongs to them.
//!
//! The auth cookie carries a signed token naming the vendor. Everything that
//! lives only for the length of a session (the till and the assistant
//! conversation) hangs off a [`VendorWorkspace`] and is dropped on logout.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{extract::FromRequestParts, http::request::Parts};
use log::debug;
use tower_cookies::{Cookie, Cookies};

use crate::{
    ai::assistant::Conversation, error::AppError, pos::PosState, state::AppState,
    utils::verify_token,
};

pub const AUTH_COOKIE: &str = "auth_token";

/// The signed-in vendor. Extracting it from a request without a valid cookie
/// redirects to the login page.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorSession {
    pub vendor_id: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for VendorSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let token = cookies.get(AUTH_COOKIE).map(|c| c.value().to_string());
        vendor_from_token(token.as_deref(), &state.config.jwt_secret)
            .map(|vendor_id| VendorSession { vendor_id })
            .ok_or(AppError::Unauthorized)
    }
}

fn vendor_from_token(token: Option<&str>, secret: &str) -> Option<String> {
    let claims = verify_token(token?, secret)
        .map_err(|e| debug!("Rejected session token: {}", e))
        .ok()?;
    Some(claims.sub).filter(|id| !id.is_empty())
}

pub fn session_cookie(token: String, lifetime_hours: i64) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(lifetime_hours))
        .build()
}

pub fn clear_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    cookies.remove(cookie);
}

/// Per-vendor state that is not persisted.
#[derive(Debug, Default)]
pub struct VendorWorkspace {
    pos: Mutex<PosState>,
    /// Held for the whole model round trip, so at most one exchange runs
    pub assistant: tokio::sync::Mutex<Conversation>,
    assistant_notice: Mutex<Option<String>>,
}

impl VendorWorkspace {
    pub fn pos(&self) -> MutexGuard<'_, PosState> {
        self.pos.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A one-off message for the assistant panel, shown on the next render.
    pub fn set_assistant_notice(&self, notice: impl Into<String>) {
        *self.assistant_notice.lock().unwrap_or_else(PoisonError::into_inner) = Some(notice.into());
    }

    pub fn take_assistant_notice(&self) -> Option<String> {
        self.assistant_notice.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    workspaces: Mutex<HashMap<String, Arc<VendorWorkspace>>>,
}

impl SessionStore {
    /// The vendor's workspace, created on first use.
    pub fn workspace(&self, vendor_id: &str) -> Arc<VendorWorkspace> {
        let mut workspaces = self.workspaces.lock().unwrap_or_else(PoisonError::into_inner);
        workspaces
            .entry(vendor_id.to_string())
            .or_insert_with(|| {
                debug!("Opening workspace for {}", vendor_id);
                Arc::new(VendorWorkspace::default())
            })
            .clone()
    }

    pub fn teardown(&self, vendor_id: &str) {
        let removed = self
            .workspaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(vendor_id);
        if removed.is_some() {
            debug!("Closed workspace for {}", vendor_id);
        }
    }
}
