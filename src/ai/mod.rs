//! Generative-model features: the insights report and the chat assistant.
//!
//! Both talk to the model through [`GenerativeModel`], a single
//! request/response call. The production implementation is
//! [`gemini::GeminiClient`].

pub mod assistant;
pub mod gemini;
pub mod insights;
pub mod markdown;
pub mod reply;

use async_trait::async_trait;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// A past text exchange sent along for context.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub history: Vec<Turn>,
    /// The current user turn
    pub parts: Vec<Part>,
    pub web_search: bool,
}

impl GenerateRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        GenerateRequest {
            parts: vec![Part::Text(text.into())],
            ..Default::default()
        }
    }
}

/// A source the model cited through its search tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub uri: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> AppResult<GenerateResponse>;
}
