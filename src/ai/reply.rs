//! Interpreting a model reply: plain text, or text carrying a fenced
//! ```json block of bill lines.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::Citation;
use crate::{
    error::{AppError, AppResult},
    models::BillItem,
};

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    Text(String),
    TextWithUpdate {
        items: Vec<BillItem>,
        /// The reply with the json block cut out
        remaining_text: String,
    },
}

fn json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("json block pattern"))
}

/// Only the first json block is considered. A block that is present but is
/// not an array of bill lines is a [`AppError::Parse`].
pub fn parse_reply(text: &str) -> AppResult<AssistantReply> {
    let Some(captures) = json_block().captures(text) else {
        return Ok(AssistantReply::Text(text.to_string()));
    };

    let (Some(block), Some(body)) = (captures.get(0), captures.get(1)) else {
        return Ok(AssistantReply::Text(text.to_string()));
    };

    let items: Vec<BillItem> =
        serde_json::from_str(body.as_str()).map_err(|e| AppError::Parse(e.to_string()))?;

    let mut remaining_text = String::with_capacity(text.len());
    remaining_text.push_str(&text[..block.start()]);
    remaining_text.push_str(&text[block.end()..]);

    Ok(AssistantReply::TextWithUpdate {
        items,
        remaining_text: remaining_text.trim().to_string(),
    })
}

/// Markdown list of cited sources, one per distinct URL, in first-seen order.
/// Empty when nothing was cited.
pub fn format_sources(citations: &[Citation]) -> String {
    let mut seen = HashSet::new();
    let links: Vec<String> = citations
        .iter()
        .filter(|c| !c.uri.is_empty() && seen.insert(c.uri.as_str()))
        .map(|c| {
            let title = c.title.as_deref().filter(|t| !t.trim().is_empty()).unwrap_or("Source");
            format!("- [{}]({})", title, c.uri)
        })
        .collect();

    if links.is_empty() {
        String::new()
    } else {
        format!("\n\n**Sources:**\n{}", links.join("\n"))
    }
}
