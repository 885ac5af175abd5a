//! Campaign orchestration.
//!
//! Sequences the two dependent generation calls — copy first, then the
//! visual derived from the copy's image prompt — and tracks per-stage busy
//! and error state. Results come back as [`CampaignEvent`]s tagged with the
//! generation that produced them; events from a superseded generation are
//! ignored, so a late-arriving stale result can never overwrite a newer one.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::GeminiConfig;
use crate::core::gemini::{
    CampaignCopy, CampaignRequest, GeminiClient, GeminiError, GeneratedImage, ImageSize, Result,
};
use crate::core::keygate::{resolve_api_key, KeySelector};

// ============================================================================
// Generator seam
// ============================================================================

/// The two generation calls the orchestrator depends on, behind a trait so
/// tests can script and record them.
#[async_trait]
pub trait CampaignGenerator: Send + Sync {
    async fn generate_text(&self, request: &CampaignRequest) -> Result<CampaignCopy>;
    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<GeneratedImage>;
}

/// Production generator: resolves the credential and builds a fresh
/// [`GeminiClient`] on every call.
pub struct LiveCampaignGenerator {
    selector: Option<Arc<dyn KeySelector>>,
    cfg: GeminiConfig,
}

impl LiveCampaignGenerator {
    pub fn new(selector: Option<Arc<dyn KeySelector>>, cfg: GeminiConfig) -> Self {
        Self { selector, cfg }
    }

    fn client(&self) -> Result<GeminiClient> {
        let key = resolve_api_key(self.selector.as_ref()).ok_or(GeminiError::NoCredential)?;
        Ok(GeminiClient::new(key, &self.cfg))
    }
}

#[async_trait]
impl CampaignGenerator for LiveCampaignGenerator {
    async fn generate_text(&self, request: &CampaignRequest) -> Result<CampaignCopy> {
        self.client()?.generate_campaign_text(request).await
    }

    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<GeneratedImage> {
        self.client()?.generate_campaign_image(prompt, size).await
    }
}

// ============================================================================
// Events
// ============================================================================

/// Stage results flowing back into the event loop.
#[derive(Debug)]
pub enum CampaignEvent {
    TextReady {
        generation: u64,
        copy: CampaignCopy,
    },
    TextFailed {
        generation: u64,
        error: GeminiError,
    },
    ImageReady {
        generation: u64,
        seq: u64,
        image: GeneratedImage,
    },
    ImageFailed {
        generation: u64,
        seq: u64,
        error: GeminiError,
    },
}

// ============================================================================
// Orchestrator
// ============================================================================

/// State for the active campaign: at most one copy/image pair at a time.
pub struct CampaignStudio {
    copy: Option<CampaignCopy>,
    image: Option<GeneratedImage>,
    image_size: ImageSize,
    text_busy: bool,
    image_busy: bool,
    text_error: Option<String>,
    image_error: Option<String>,
    /// Latest submitted campaign generation.
    generation: u64,
    /// Latest requested image within the current campaign.
    image_seq: u64,
}

impl Default for CampaignStudio {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignStudio {
    pub fn new() -> Self {
        Self {
            copy: None,
            image: None,
            image_size: ImageSize::OneK,
            text_busy: false,
            image_busy: false,
            text_error: None,
            image_error: None,
            generation: 0,
            image_seq: 0,
        }
    }

    pub fn copy(&self) -> Option<&CampaignCopy> {
        self.copy.as_ref()
    }

    pub fn image(&self) -> Option<&GeneratedImage> {
        self.image.as_ref()
    }

    pub fn text_busy(&self) -> bool {
        self.text_busy
    }

    pub fn image_busy(&self) -> bool {
        self.image_busy
    }

    pub fn text_error(&self) -> Option<&str> {
        self.text_error.as_deref()
    }

    pub fn image_error(&self) -> Option<&str> {
        self.image_error.as_deref()
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Whether a regeneration is currently possible.
    pub fn can_regenerate_image(&self) -> bool {
        !self.image_busy
            && self
                .copy
                .as_ref()
                .is_some_and(|copy| copy.has_image_prompt())
    }

    /// Submit a new campaign request.
    ///
    /// An empty topic is rejected before any call is issued. Otherwise the
    /// previous result pair is discarded, the generation counter advances,
    /// and one task drives both stages in order: copy, then — only on
    /// success with a non-empty image prompt — the visual.
    ///
    /// Returns whether a generation was actually started.
    pub fn submit<E>(
        &mut self,
        request: CampaignRequest,
        generator: Arc<dyn CampaignGenerator>,
        emit: E,
    ) -> bool
    where
        E: Fn(CampaignEvent) + Send + 'static,
    {
        if !request.has_topic() {
            log::debug!("Campaign submit ignored: empty topic");
            return false;
        }
        if self.text_busy {
            log::debug!("Campaign submit ignored: generation already in flight");
            return false;
        }

        self.generation += 1;
        self.image_seq += 1;
        let generation = self.generation;
        let seq = self.image_seq;

        self.copy = None;
        self.image = None;
        self.image_size = request.image_size;
        self.text_busy = true;
        self.image_busy = false;
        self.text_error = None;
        self.image_error = None;

        log::info!(
            "Generating campaign #{generation} for topic: {}",
            request.topic
        );

        tokio::spawn(async move {
            match generator.generate_text(&request).await {
                Ok(copy) => {
                    let prompt = copy.image_prompt.clone();
                    emit(CampaignEvent::TextReady { generation, copy });

                    if prompt.trim().is_empty() {
                        log::debug!("Campaign #{generation} has no image prompt — skipping visual");
                        return;
                    }

                    match generator.generate_image(&prompt, request.image_size).await {
                        Ok(image) => emit(CampaignEvent::ImageReady {
                            generation,
                            seq,
                            image,
                        }),
                        Err(error) => emit(CampaignEvent::ImageFailed {
                            generation,
                            seq,
                            error,
                        }),
                    }
                }
                Err(error) => emit(CampaignEvent::TextFailed { generation, error }),
            }
        });

        true
    }

    /// Regenerate the visual for the current copy at the selected size.
    ///
    /// Never re-issues text generation; idempotent with respect to the
    /// campaign copy. Returns whether a regeneration was started.
    pub fn regenerate_image<E>(
        &mut self,
        size: ImageSize,
        generator: Arc<dyn CampaignGenerator>,
        emit: E,
    ) -> bool
    where
        E: Fn(CampaignEvent) + Send + 'static,
    {
        if !self.can_regenerate_image() {
            return false;
        }
        // can_regenerate_image guarantees a copy with a prompt
        let Some(prompt) = self.copy.as_ref().map(|c| c.image_prompt.clone()) else {
            return false;
        };

        self.image_seq += 1;
        let generation = self.generation;
        let seq = self.image_seq;
        self.image_size = size;
        self.image_busy = true;
        self.image_error = None;

        log::info!("Regenerating campaign #{generation} image ({size})");

        tokio::spawn(async move {
            match generator.generate_image(&prompt, size).await {
                Ok(image) => emit(CampaignEvent::ImageReady {
                    generation,
                    seq,
                    image,
                }),
                Err(error) => emit(CampaignEvent::ImageFailed {
                    generation,
                    seq,
                    error,
                }),
            }
        });

        true
    }

    /// Apply a stage result.
    ///
    /// Busy flags are cleared on every exit path of the affected stage; an
    /// image failure leaves the already-obtained copy intact. Returns true
    /// when the failure was credential-related, so the caller can force the
    /// key gate back to reselection.
    pub fn handle_event(&mut self, event: CampaignEvent) -> bool {
        match event {
            CampaignEvent::TextReady { generation, copy } => {
                if generation != self.generation {
                    log::debug!("Dropping stale copy result from campaign #{generation}");
                    return false;
                }
                self.text_busy = false;
                // The visual stage starts as soon as the copy lands
                self.image_busy = copy.has_image_prompt();
                self.copy = Some(copy);
                false
            }
            CampaignEvent::TextFailed { generation, error } => {
                if generation != self.generation {
                    return false;
                }
                log::error!("Campaign copy generation failed: {error}");
                self.text_busy = false;
                let credential = error.is_credential_failure();
                self.text_error = Some(format!("Failed to generate campaign: {error}"));
                credential
            }
            CampaignEvent::ImageReady {
                generation,
                seq,
                image,
            } => {
                if generation != self.generation || seq != self.image_seq {
                    log::debug!("Dropping stale image result (campaign #{generation}, seq {seq})");
                    return false;
                }
                self.image_busy = false;
                self.image = Some(image);
                false
            }
            CampaignEvent::ImageFailed {
                generation,
                seq,
                error,
            } => {
                if generation != self.generation || seq != self.image_seq {
                    return false;
                }
                log::error!("Campaign image generation failed: {error}");
                self.image_busy = false;
                let credential = error.is_credential_failure();
                self.image_error = Some(format!("Failed to generate image: {error}"));
                credential
            }
        }
    }
}
