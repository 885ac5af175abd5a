//! Chat orchestration.
//!
//! Owns the transcript and exactly one live [`ChatSession`]. The transcript
//! is append-only except for the most recent model entry, which grows in
//! place as stream fragments arrive. Entries are identified by a monotonic
//! id assigned at creation, never by position.

use std::sync::Arc;

use crate::config::GeminiConfig;
use crate::core::gemini::client::{create_chat_session, ASSISTANT_PERSONA};
use crate::core::gemini::ChatSession;
use crate::core::keygate::{resolve_api_key, KeySelector};

const GREETING: &str = "Hello! I am your AI marketing assistant. \
     Ask me anything about strategy, copywriting, or analytics.";

const STREAM_ERROR_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
    Error,
}

#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// Monotonic creation-order key, used for in-place text growth.
    pub id: u64,
    pub role: ChatRole,
    pub text: String,
    /// Display metadata only; never used for identity.
    pub created_at: String,
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

// ============================================================================
// Events
// ============================================================================

/// Stream progress flowing back into the event loop.
#[derive(Debug)]
pub enum ChatEvent {
    /// A text fragment for the placeholder entry, applied in arrival order.
    Fragment { entry_id: u64, text: String },
    /// The stream finished cleanly.
    Done { entry_id: u64 },
    /// The stream or the session failed.
    Failed {
        entry_id: u64,
        message: String,
        credential: bool,
    },
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct ChatDesk {
    transcript: Vec<TranscriptEntry>,
    next_id: u64,
    busy: bool,
    session: Option<ChatSession>,
}

impl Default for ChatDesk {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatDesk {
    pub fn new() -> Self {
        let mut desk = Self {
            transcript: Vec::new(),
            next_id: 0,
            busy: false,
            session: None,
        };
        desk.push_entry(ChatRole::Model, GREETING.to_string());
        desk
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    /// Discard the session context (and any prior handle). The transcript
    /// stays; only the conversational memory resets.
    pub fn reset_session(&mut self) {
        if self.session.take().is_some() {
            log::info!("Chat session discarded");
        }
    }

    fn push_entry(&mut self, role: ChatRole, text: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.transcript.push(TranscriptEntry {
            id,
            role,
            text,
            created_at: timestamp(),
        });
        id
    }

    /// Append the user entry and the empty model placeholder for one
    /// exchange, marking the desk busy. Returns the placeholder id.
    pub(crate) fn begin_exchange(&mut self, user_text: &str) -> u64 {
        self.push_entry(ChatRole::User, user_text.to_string());
        let entry_id = self.push_entry(ChatRole::Model, String::new());
        self.busy = true;
        entry_id
    }

    /// Send one user message, streaming the reply into a placeholder entry.
    ///
    /// No-op while a send is already in flight or when the input is empty.
    /// Returns whether a send was started.
    pub fn send<E>(
        &mut self,
        text: &str,
        selector: Option<Arc<dyn KeySelector>>,
        cfg: &GeminiConfig,
        emit: E,
    ) -> bool
    where
        E: Fn(ChatEvent) + Send + 'static,
    {
        if self.busy || text.trim().is_empty() {
            return false;
        }

        let session = self
            .session
            .get_or_insert_with(|| create_chat_session(cfg, ASSISTANT_PERSONA))
            .clone();

        let entry_id = self.begin_exchange(text);
        let message = text.to_string();

        tokio::spawn(async move {
            let Some(api_key) = resolve_api_key(selector.as_ref()) else {
                emit(ChatEvent::Failed {
                    entry_id,
                    message: "No API key is available. Select a key to continue.".to_string(),
                    credential: true,
                });
                return;
            };

            match session.send_streamed(&api_key, &message).await {
                Ok(mut rx) => {
                    while let Some(item) = rx.recv().await {
                        match item {
                            Ok(fragment) => emit(ChatEvent::Fragment {
                                entry_id,
                                text: fragment,
                            }),
                            Err(e) => {
                                emit(ChatEvent::Failed {
                                    entry_id,
                                    message: e.to_string(),
                                    credential: e.is_credential_failure(),
                                });
                                return;
                            }
                        }
                    }
                    emit(ChatEvent::Done { entry_id });
                }
                Err(e) => emit(ChatEvent::Failed {
                    entry_id,
                    message: e.to_string(),
                    credential: e.is_credential_failure(),
                }),
            }
        });

        true
    }

    /// Apply stream progress.
    ///
    /// Fragments concatenate onto the placeholder located by id; a failure
    /// appends a distinct error entry instead of mutating the placeholder.
    /// The busy flag clears on every terminal event. Returns true when the
    /// failure was credential-related.
    pub fn handle_event(&mut self, event: ChatEvent) -> bool {
        match event {
            ChatEvent::Fragment { entry_id, text } => {
                if let Some(entry) = self.transcript.iter_mut().find(|e| e.id == entry_id) {
                    entry.text.push_str(&text);
                } else {
                    log::warn!("Fragment for unknown transcript entry {entry_id}");
                }
                false
            }
            ChatEvent::Done { .. } => {
                self.busy = false;
                false
            }
            ChatEvent::Failed {
                entry_id,
                message,
                credential,
            } => {
                log::error!("Chat stream for entry {entry_id} failed: {message}");
                self.busy = false;
                self.push_entry(ChatRole::Error, STREAM_ERROR_NOTICE.to_string());
                credential
            }
        }
    }
}
