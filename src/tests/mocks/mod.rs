//! Mock implementations for testing
//!
//! Scripted, call-recording stand-ins for the generation seam, used to test
//! the orchestrators in isolation. The key-selection capability is mocked
//! with mockall's automock on the `KeySelector` trait itself.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::campaign::CampaignGenerator;
use crate::core::gemini::{
    CampaignCopy, CampaignRequest, GeminiError, GeneratedImage, ImageSize, Result,
};

/// Campaign copy used across the orchestrator tests.
pub fn sample_copy() -> CampaignCopy {
    CampaignCopy {
        subject_lines: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        body_copy: "**Hi**".to_string(),
        image_prompt: "boots in mountains".to_string(),
    }
}

/// Copy without an image prompt, so no visual stage follows.
pub fn sample_copy_without_prompt() -> CampaignCopy {
    CampaignCopy {
        image_prompt: String::new(),
        ..sample_copy()
    }
}

pub fn sample_image(size: ImageSize) -> GeneratedImage {
    GeneratedImage {
        data: "aGVsbG8=".to_string(),
        size,
    }
}

/// An emitter backed by an unbounded channel, so tests can await events the
/// same way the app loop does.
pub fn channel_emitter<T: Send + 'static>(
) -> (impl Fn(T) + Send + 'static, mpsc::UnboundedReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |event| {
            let _ = tx.send(event);
        },
        rx,
    )
}

// ============================================================================
// Scripted generator
// ============================================================================

/// [`CampaignGenerator`] with scripted results and recorded calls.
///
/// Results are consumed front-to-back, one per call; an unscripted call
/// fails with a synthetic API error so a test never hangs on a missing
/// script entry.
pub struct ScriptedGenerator {
    text_results: Mutex<VecDeque<Result<CampaignCopy>>>,
    image_results: Mutex<VecDeque<Result<GeneratedImage>>>,
    text_calls: Mutex<Vec<CampaignRequest>>,
    image_calls: Mutex<Vec<(String, ImageSize)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            text_results: Mutex::new(VecDeque::new()),
            image_results: Mutex::new(VecDeque::new()),
            text_calls: Mutex::new(Vec::new()),
            image_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_text(self, result: Result<CampaignCopy>) -> Self {
        self.text_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_image(self, result: Result<GeneratedImage>) -> Self {
        self.image_results.lock().unwrap().push_back(result);
        self
    }

    pub fn text_calls(&self) -> Vec<CampaignRequest> {
        self.text_calls.lock().unwrap().clone()
    }

    pub fn image_calls(&self) -> Vec<(String, ImageSize)> {
        self.image_calls.lock().unwrap().clone()
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CampaignGenerator for ScriptedGenerator {
    async fn generate_text(&self, request: &CampaignRequest) -> Result<CampaignCopy> {
        self.text_calls.lock().unwrap().push(request.clone());
        self.text_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GeminiError::Api {
                    status: 500,
                    message: "unscripted text call".to_string(),
                })
            })
    }

    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<GeneratedImage> {
        self.image_calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), size));
        self.image_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GeminiError::Api {
                    status: 500,
                    message: "unscripted image call".to_string(),
                })
            })
    }
}
