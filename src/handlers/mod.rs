pub mod assistant;
pub mod auth;
pub mod help;
pub mod insights;
pub mod inventory;
pub mod pos;
pub mod sales;

use axum::response::{Html, Redirect};
use askama::Template;
use serde::Deserialize;

use crate::{
    ai::{assistant::Conversation, markdown, Role},
    error::{AppError, AppResult},
    session::VendorSession,
    state::AppState,
};

/// Everything `base.html` needs: header, navigation and the assistant panel.
pub struct Shell {
    pub store_name: String,
    pub tagline: String,
    pub vendor_id: String,
    pub active: &'static str,
    pub path: String,
    pub assistant: AssistantPanel,
}

pub struct AssistantPanel {
    pub messages: Vec<PanelMessage>,
    /// A reply is being generated in another request
    pub busy: bool,
    pub notice: Option<String>,
    pub hint: &'static str,
    pub has_bill: bool,
}

pub struct PanelMessage {
    pub from_user: bool,
    pub html: String,
}

impl AssistantPanel {
    fn from_conversation(conversation: &Conversation, notice: Option<String>) -> Self {
        AssistantPanel {
            messages: conversation
                .messages()
                .iter()
                .map(|m| PanelMessage {
                    from_user: m.role == Role::User,
                    html: markdown::render(&m.text),
                })
                .collect(),
            busy: false,
            notice,
            hint: conversation.phase().hint(),
            has_bill: conversation.has_bill(),
        }
    }

    fn busy(notice: Option<String>) -> Self {
        AssistantPanel {
            messages: vec![],
            busy: true,
            notice,
            hint: "Analyzing...",
            has_bill: false,
        }
    }
}

impl Shell {
    pub fn new(state: &AppState, session: &VendorSession, active: &'static str, path: impl Into<String>) -> Self {
        let workspace = state.sessions.workspace(&session.vendor_id);
        let notice = workspace.take_assistant_notice();
        let assistant = match workspace.assistant.try_lock() {
            Ok(conversation) => AssistantPanel::from_conversation(&conversation, notice),
            Err(_) => AssistantPanel::busy(notice),
        };

        Shell {
            store_name: state.config.store_display_name.clone(),
            tagline: state.config.store_tagline.clone(),
            vendor_id: session.vendor_id.clone(),
            active,
            path: path.into(),
            assistant,
        }
    }
}

pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    Ok(Html(template.render()?))
}

/// Points the vendor at the setup guide when the schema is missing or locked.
pub fn database_error_message(err: &sqlx::Error) -> String {
    let message = err.to_string();
    if message.contains("row-level security") || message.contains("policy") {
        "Permission Denied: Database is locked. Please open the Database Setup Guide.".to_string()
    } else if message.contains("relation") && message.contains("does not exist") {
        "Tables Missing: Please open the Database Setup Guide.".to_string()
    } else {
        format!("Database Error: {}", message)
    }
}

/// The line shown on a page whose data could not be loaded or saved.
pub fn failure_message(err: &AppError) -> String {
    match err {
        AppError::Persistence(db) => database_error_message(db),
        other => other.to_string(),
    }
}

/// Optional one-line messages carried across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct Flash {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub notice: Option<String>,
}

pub fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(message)))
}

pub fn redirect_with_notice(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?notice={}", path, urlencoding::encode(message)))
}

/// Only same-site absolute paths are followed.
pub fn local_path(candidate: &str, fallback: &'static str) -> String {
    if candidate.starts_with('/') && !candidate.starts_with("//") && !candidate.contains('\\') {
        candidate.to_string()
    } else {
        fallback.to_string()
    }
}

pub async fn root() -> Redirect {
    Redirect::to("/inventory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/pos", "/inventory"), "/pos");
        assert_eq!(local_path("//evil.example", "/inventory"), "/inventory");
        assert_eq!(local_path("https://evil.example", "/inventory"), "/inventory");
        assert_eq!(local_path("", "/inventory"), "/inventory");
    }

    #[test]
    fn test_database_error_hint() {
        let missing = sqlx::Error::Protocol("relation \"vendors\" does not exist".to_string());
        assert_eq!(database_error_message(&missing), "Tables Missing: Please open the Database Setup Guide.");

        let other = sqlx::Error::PoolTimedOut;
        assert!(database_error_message(&other).starts_with("Database Error: "));
    }

    #[test]
    fn test_failure_message() {
        let locked = AppError::Persistence(sqlx::Error::Protocol(
            "new row violates row-level security policy".to_string(),
        ));
        assert!(failure_message(&locked).starts_with("Permission Denied"));
        assert_eq!(
            failure_message(&AppError::validation("Discount must be a number")),
            "Discount must be a number"
        );
    }

    #[test]
    fn test_panel_renders_markdown() {
        let panel = AssistantPanel::from_conversation(&Conversation::new(), None);
        assert_eq!(panel.messages.len(), 1);
        assert!(!panel.messages[0].from_user);
        assert!(panel.messages[0].html.contains("Pharma Assistant"));
        assert!(!panel.busy);
    }
}
