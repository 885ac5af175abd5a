//! Gemini API client for campaign generation.
//!
//! A client is cheap to build and is constructed fresh for every call with
//! the credential resolved at that moment — configuration is passed as an
//! argument, never held in a shared singleton.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use crate::config::GeminiConfig;

use super::chat::ChatSession;
use super::error::{GeminiError, Result};
use super::types::{CampaignCopy, CampaignRequest, GeneratedImage, ImageSize};

/// Persona for campaign copy generation.
pub const COPYWRITER_PERSONA: &str =
    "You are a world-class marketing copywriter. Your goal is to drive conversions.";

/// Persona for the chat assistant.
pub const ASSISTANT_PERSONA: &str = "You are a helpful and creative marketing assistant. \
     You help users refine their marketing strategies, brainstorm ideas, \
     and troubleshoot campaign issues.";

/// Response schema the text model is constrained to: exactly the three
/// campaign fields, all required.
fn campaign_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "subjectLines": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Three catchy email subject lines."
            },
            "bodyCopy": {
                "type": "STRING",
                "description": "The main email body content in Markdown format."
            },
            "imagePrompt": {
                "type": "STRING",
                "description": "A detailed prompt to generate a marketing image for this email."
            }
        },
        "required": ["subjectLines", "bodyCopy", "imagePrompt"]
    })
}

/// Natural-language instruction embedding the request fields verbatim.
fn build_campaign_prompt(request: &CampaignRequest) -> String {
    format!(
        "Create an email marketing campaign for: {}.\n\
         Target Audience: {}.\n\
         Tone: {}.\n\
         \n\
         I need:\n\
         1. 3 catchy subject lines.\n\
         2. The main body copy for the email (formatted with Markdown).\n\
         3. A detailed visual description (image prompt) that represents the \
         campaign theme, suitable for an AI image generator.",
        request.topic, request.audience, request.tone
    )
}

pub struct GeminiClient {
    api_key: String,
    cfg: GeminiConfig,
    http: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, cfg: &GeminiConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.into().trim().to_string(),
            cfg: cfg.clone(),
            http,
        }
    }

    /// Generate structured campaign copy for a request.
    pub async fn generate_campaign_text(&self, request: &CampaignRequest) -> Result<CampaignCopy> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.base_url, self.cfg.text_model
        );

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_campaign_prompt(request) }]
            }],
            "systemInstruction": {
                "parts": [{ "text": COPYWRITER_PERSONA }]
            },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": campaign_schema(),
                "thinkingConfig": { "thinkingBudget": self.cfg.thinking_budget }
            }
        });

        log::debug!("Generating campaign copy for topic: {}", request.topic);
        let json = self.post(&url, &body).await?;

        let text = extract_text(&json)
            .ok_or_else(|| GeminiError::malformed("response carried no text payload"))?;

        let copy: CampaignCopy = serde_json::from_str(text)
            .map_err(|e| GeminiError::malformed(format!("structured payload did not parse: {e}")))?;

        if copy.subject_lines.is_empty() {
            return Err(GeminiError::malformed("no subject lines in payload"));
        }
        if copy.subject_lines.len() != 3 {
            log::warn!(
                "Expected 3 subject lines, model returned {}",
                copy.subject_lines.len()
            );
        }

        Ok(copy)
    }

    /// Generate a marketing visual for a prompt at the given resolution tier.
    pub async fn generate_campaign_image(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<GeneratedImage> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.base_url, self.cfg.image_model
        );

        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "imageConfig": {
                    "imageSize": size.as_str(),
                    "aspectRatio": self.cfg.aspect_ratio
                }
            }
        });

        log::debug!("Generating {size} campaign image");
        let json = self.post(&url, &body).await?;

        let parts = json["candidates"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["content"]["parts"].as_array());

        let data = parts
            .and_then(|parts| {
                parts
                    .iter()
                    .find_map(|part| part["inlineData"]["data"].as_str())
            })
            .ok_or(GeminiError::NoImageReturned)?;

        Ok(GeneratedImage {
            data: data.to_string(),
            size,
        })
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GeminiError::from_status(status.as_u16(), message));
        }

        Ok(resp.json().await?)
    }
}

/// Open a conversational context pre-configured with a persona instruction.
pub fn create_chat_session(cfg: &GeminiConfig, system_instruction: &str) -> ChatSession {
    ChatSession::new(cfg.clone(), system_instruction)
}

/// First text part of the first candidate, if any.
fn extract_text(json: &Value) -> Option<&str> {
    json["candidates"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|c| c["content"]["parts"].as_array())
        .and_then(|parts| parts.first())
        .and_then(|p| p["text"].as_str())
}
