// Error types for contact-scout.
// Covers OpenAI API errors, page fetching, CSV/cache IO, and general failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired API key")]
    Unauthorized,

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Missing OPENAI_API_KEY environment variable")]
    MissingApiKey,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTML rewrite error: {0}")]
    Html(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ScoutError {
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        ScoutError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;
