//! Request fixtures sent by each smoke-test step

use serde::{Deserialize, Serialize};

use crate::backend::{ChatMessage, ChatRequest, EmbeddingRequest, StreamRequest};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const EMBEDDING_INPUT: &str = "Hello world";
const MAX_TOKENS: u32 = 50;

/// Which SDK script's requests to reproduce.
///
/// `Python` mirrors the official Python SDK walkthrough, `Node` the Node.js
/// one. A profile only shapes the request bodies (prompts and sampling
/// parameters); the console title and banners come from [`Language`] and are
/// the same for both.
///
/// [`Language`]: crate::config::Language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScriptProfile {
    #[default]
    Python,
    Node,
}

impl ScriptProfile {
    /// Parse profile from string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "node" | "nodejs" | "js" => Self::Node,
            _ => Self::Python,
        }
    }

    /// Name accepted by `--profile`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
        }
    }

    fn chat_prompt(&self) -> &'static str {
        match self {
            Self::Python => "Say 'Hello from the proxy!' in French",
            Self::Node => "Say hello!",
        }
    }

    fn temperature(&self) -> Option<f32> {
        match self {
            Self::Python => Some(0.7),
            Self::Node => None,
        }
    }

    fn stream_prompt(&self) -> &'static str {
        match self {
            Self::Python => "Count to 5",
            Self::Node => "Count to 3",
        }
    }

    /// System instruction plus user prompt, capped at 50 tokens
    pub fn chat_request(&self, model: &str) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(self.chat_prompt()),
            ],
            temperature: self.temperature(),
            max_tokens: Some(MAX_TOKENS),
        }
    }

    pub fn embedding_request(&self, model: &str) -> EmbeddingRequest {
        EmbeddingRequest {
            model: model.to_string(),
            input: EMBEDDING_INPUT.to_string(),
        }
    }

    /// Single user message, streamed
    pub fn stream_request(&self, model: &str) -> StreamRequest {
        StreamRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user(self.stream_prompt())],
        }
    }
}
