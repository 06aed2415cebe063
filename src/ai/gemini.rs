//! Gemini `generateContent` over REST.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{Citation, GenerateRequest, GenerateResponse, GenerativeModel, Part, Role};
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            endpoint: config.gemini_endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> AppResult<GenerateResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalService("API key not configured".to_string()))?;

        let body = WireRequest::from(&request);
        debug!("Calling {} with {} history turn(s)", self.model, request.history.len());

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini call failed: {} - {}", status, error_text);
            return Err(AppError::ExternalService(format!("model returned {}", status)));
        }

        let wire: WireResponse = response.json().await?;
        Ok(wire.into())
    }
}

// Wire format

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        inline_data: WireBlob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: String,
    data: String,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text { text: text.clone() },
            Part::Image { mime_type, data } => WirePart::Inline {
                inline_data: WireBlob {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                },
            },
        }
    }
}

impl From<&GenerateRequest> for WireRequest {
    fn from(request: &GenerateRequest) -> Self {
        let mut contents: Vec<WireContent> = request
            .history
            .iter()
            .map(|turn| WireContent {
                role: Some(match turn.role {
                    Role::User => "user",
                    Role::Model => "model",
                }),
                parts: vec![WirePart::Text { text: turn.text.clone() }],
            })
            .collect();

        contents.push(WireContent {
            role: Some("user"),
            parts: request.parts.iter().map(WirePart::from).collect(),
        });

        WireRequest {
            system_instruction: request.system_instruction.as_ref().map(|text| WireContent {
                role: None,
                parts: vec![WirePart::Text { text: text.clone() }],
            }),
            contents,
            tools: if request.web_search {
                vec![WireTool {
                    google_search: serde_json::Map::new(),
                }]
            } else {
                vec![]
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<WireGrounding>,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponseContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGrounding {
    #[serde(default)]
    grounding_chunks: Vec<WireChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WireChunk {
    #[serde(default)]
    web: Option<WireWeb>,
}

#[derive(Debug, Default, Deserialize)]
struct WireWeb {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl From<WireResponse> for GenerateResponse {
    fn from(wire: WireResponse) -> Self {
        let Some(candidate) = wire.candidates.into_iter().next() else {
            return GenerateResponse::default();
        };

        let text = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        let citations = candidate
            .grounding_metadata
            .map(|g| g.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .filter_map(|web| {
                web.uri.map(|uri| Citation {
                    uri,
                    title: web.title,
                })
            })
            .collect();

        GenerateResponse { text, citations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Turn;

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest {
            system_instruction: Some("be brief".to_string()),
            history: vec![Turn {
                role: Role::Model,
                text: "Hello".to_string(),
            }],
            parts: vec![
                Part::Image {
                    mime_type: "image/png".to_string(),
                    data: vec![1, 2, 3],
                },
                Part::Text("Here is a bill".to_string()),
            ],
            web_search: true,
        };

        let body = serde_json::to_value(WireRequest::from(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "model");
        assert_eq!(body["contents"][1]["role"], "user");
        assert_eq!(body["contents"][1]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(body["contents"][1]["parts"][0]["inlineData"]["data"], "AQID");
        assert_eq!(body["contents"][1]["parts"][1]["text"], "Here is a bill");
        assert!(body["tools"][0]["googleSearch"].is_object());
    }

    #[test]
    fn test_plain_prompt_has_no_tools() {
        let body = serde_json::to_value(WireRequest::from(&GenerateRequest::prompt("hi"))).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_and_citations() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Take with "}, {"text": "food."}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://example.org/a", "title": "A"}},
                        {"web": {"title": "no uri"}},
                        {}
                    ]
                }
            }]
        }"#;

        let wire: WireResponse = serde_json::from_str(json).unwrap();
        let response = GenerateResponse::from(wire);

        assert_eq!(response.text, "Take with food.");
        assert_eq!(
            response.citations,
            vec![Citation {
                uri: "https://example.org/a".to_string(),
                title: Some("A".to_string()),
            }]
        );
    }

    #[test]
    fn test_empty_candidates() {
        let wire: WireResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert_eq!(GenerateResponse::from(wire), GenerateResponse::default());
    }
}
