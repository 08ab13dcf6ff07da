// Agent module.
// LLM tool-calling agent that browses a site and saves the contacts it finds.

pub mod prompts;
pub mod session;
pub mod tools;

use async_trait::async_trait;

use crate::cache::lru::DEFAULT_CAPACITY;
use crate::error::Result;
use crate::openai::{ChatRequest, ChatResponse};

pub use session::{ContactAgent, StdinInput, UserInput};

pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";
pub const DEFAULT_MAX_STEPS: usize = 40;

/// Anything that answers chat completion requests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Per-session agent settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub model: String,
    /// Pages kept in the in-memory LRU.
    pub cache_size: usize,
    /// Completion requests allowed before the session gives up.
    pub max_steps: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            cache_size: DEFAULT_CAPACITY,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}
