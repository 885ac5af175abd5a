//! Gemini Generation Client
//!
//! Stateless wrappers around the Generative Language API: structured
//! campaign-copy generation, marketing-image generation, and streaming chat.
//! Clients are rebuilt from the current credential on every call so a key
//! rotated mid-session is picked up immediately.

pub mod chat;
pub mod client;
pub mod error;
pub mod types;

pub use chat::{ChatSession, ChatTurn, TurnRole};
pub use client::GeminiClient;
pub use error::{GeminiError, Result};
pub use types::{CampaignCopy, CampaignRequest, GeneratedImage, ImageSize, Tone};
