//! Error types shared by every screen.
//!
//! Handlers that own an inline message area (login, checkout, sales reset,
//! the assistant) catch these and re-render; everything else falls through to
//! the `IntoResponse` impl below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use log::error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("AI service error: {0}")]
    ExternalService(String),

    #[error("Could not read the structured reply: {0}")]
    Parse(String),

    #[error("Not signed in")]
    Unauthorized,

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::WrongPassword | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Unauthorized = self {
            return Redirect::to("/login").into_response();
        }

        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(AppError::NotFound("Store".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::AlreadyExists("Store".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::WrongPassword.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::validation("Remark is required").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::ExternalService("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }
}
