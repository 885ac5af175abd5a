//! Streaming chat session.
//!
//! A [`ChatSession`] is an opaque handle to one conversational context:
//! persona instruction plus accumulated history. Each send opens a fresh
//! SSE stream against the API; fragments arrive in generation order and the
//! receiver is single-use — a new send must be issued per user message.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

use crate::config::GeminiConfig;

use super::error::{GeminiError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One committed exchange half in the session history.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Stateful conversational handle. Cloning shares the same history.
#[derive(Clone)]
pub struct ChatSession {
    id: String,
    system_instruction: String,
    cfg: GeminiConfig,
    http: Client,
    history: Arc<Mutex<Vec<ChatTurn>>>,
}

impl ChatSession {
    pub(crate) fn new(cfg: GeminiConfig, system_instruction: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        let id = uuid::Uuid::new_v4().to_string();
        log::debug!("Chat session {id} opened");

        Self {
            id,
            system_instruction: system_instruction.to_string(),
            cfg,
            http,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of committed turns so far.
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Send one user message and stream the reply as ordered text fragments.
    ///
    /// The returned receiver is finite and not restartable. The exchange is
    /// committed to the session history only when the stream completes
    /// cleanly, so a failed send does not poison the context.
    pub async fn send_streamed(
        &self,
        api_key: &str,
        message: &str,
    ) -> Result<mpsc::Receiver<Result<String>>> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.cfg.base_url, self.cfg.text_model
        );

        let contents = {
            let history = self.history.lock().await;
            let mut contents: Vec<Value> = history
                .iter()
                .map(|turn| {
                    json!({
                        "role": turn.role.as_str(),
                        "parts": [{ "text": turn.text }]
                    })
                })
                .collect();
            contents.push(json!({
                "role": "user",
                "parts": [{ "text": message }]
            }));
            contents
        };

        let body = json!({
            "contents": contents,
            "systemInstruction": {
                "parts": [{ "text": self.system_instruction }]
            }
        });

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", api_key.trim())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::from_status(status.as_u16(), message));
        }

        let (tx, rx) = mpsc::channel(64);
        let history = Arc::clone(&self.history);
        let user_text = message.to_string();
        let session_id = self.id.clone();

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut full_reply = String::new();
            // SSE buffer to handle TCP chunk boundaries
            let mut sse_buffer = String::new();

            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        sse_buffer.push_str(&String::from_utf8_lossy(&bytes));

                        // Process complete lines from the buffer
                        while let Some(newline_pos) = sse_buffer.find('\n') {
                            let line =
                                sse_buffer[..newline_pos].trim_end_matches('\r').to_string();
                            sse_buffer.drain(..=newline_pos);

                            if let Some(fragment) = parse_sse_line(&line) {
                                full_reply.push_str(&fragment);
                                if tx.send(Ok(fragment)).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(GeminiError::Http(e))).await;
                        return;
                    }
                }
            }

            // Process any remaining buffer content
            if let Some(fragment) = parse_sse_line(sse_buffer.trim()) {
                full_reply.push_str(&fragment);
                let _ = tx.send(Ok(fragment)).await;
            }

            // Commit the exchange now that the stream finished cleanly
            let mut history = history.lock().await;
            history.push(ChatTurn::user(user_text));
            history.push(ChatTurn::model(full_reply));
            log::debug!(
                "Chat session {session_id} committed exchange ({} turns)",
                history.len()
            );
        });

        Ok(rx)
    }
}

/// Extract the text fragment from a single SSE `data:` line, if any.
fn parse_sse_line(line: &str) -> Option<String> {
    let data = line.strip_prefix("data: ")?;
    let json = serde_json::from_str::<Value>(data).ok()?;
    let text = json["candidates"][0]["content"]["parts"][0]["text"].as_str()?;
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
