use axum::{extract::State, response::Html};
use askama::Template;

use super::{render, Shell};
use crate::{database::SCHEMA_SQL, error::AppResult, session::VendorSession, state::AppState};

#[derive(Template)]
#[template(path = "help.html")]
struct HelpTemplate {
    shell: Shell,
    schema_sql: &'static str,
}

/// The guide is also linked from the login page, before anyone is signed in.
#[derive(Template)]
#[template(path = "setup_guide.html")]
struct SetupGuideTemplate {
    store_name: String,
    schema_sql: &'static str,
}

pub async fn help_page(
    State(state): State<AppState>,
    session: Option<VendorSession>,
) -> AppResult<Html<String>> {
    match session {
        Some(session) => render(&HelpTemplate {
            shell: Shell::new(&state, &session, "help", "/help"),
            schema_sql: SCHEMA_SQL,
        }),
        None => render(&SetupGuideTemplate {
            store_name: state.config.store_display_name.clone(),
            schema_sql: SCHEMA_SQL,
        }),
    }
}
