//! Error types for the Gemini client.

/// Result type alias using [`GeminiError`].
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Errors that can occur during generation calls.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    /// Network/HTTP transport errors.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx responses from the service.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service rejected the request for credential reasons.
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// No API key could be resolved for the call.
    #[error("No API key is available")]
    NoCredential,

    /// Structured payload missing or not parseable into the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The image response carried no inline image part.
    #[error("No image data returned")]
    NoImageReturned,
}

impl GeminiError {
    /// Build the error for a non-success HTTP status, mapping
    /// credential-style rejections to [`GeminiError::Auth`].
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => GeminiError::Auth(message),
            _ => GeminiError::Api { status, message },
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        GeminiError::MalformedResponse(msg.into())
    }

    /// True when the failure should force the key gate back to reselection.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, GeminiError::Auth(_) | GeminiError::NoCredential)
    }
}
