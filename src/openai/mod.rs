// OpenAI API module.
// Provides client and types for the chat completions API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{OPENAI_API_BASE, OpenAiClient, RetryConfig};
pub use types::*;
