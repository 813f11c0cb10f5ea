//! proxy_smoke: smoke test for local OpenAI-compatible proxies
//!
//! This library runs four independent steps against a proxy that exposes
//! the OpenAI API surface:
//! - Model listing
//! - Chat completion
//! - Embeddings
//! - Streaming chat
//!
//! Each step isolates its own failure, so a proxy that rejects chat requests
//! still gets its embeddings and streaming endpoints exercised.
//!
//! # Example
//!
//! ```no_run
//! use proxy_smoke::{ClientConfig, HarnessConfig, Language, ProxyClient, SmokeHarness};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let client = ProxyClient::new(ClientConfig::new("http://localhost:3001/v1"));
//!     let config = HarnessConfig::new().with_lang(Language::English);
//!
//!     let harness = SmokeHarness::new(client, config);
//!     let report = harness.run(&mut std::io::stdout()).await?;
//!     println!("{} step(s) passed", report.passed());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Core functionality
pub mod backend;
pub mod client;
pub mod harness;
pub mod steps;
mod sse;

// Re-export commonly used types and functions
pub use error::{Result, SmokeError};

// Config re-exports
pub use config::{
    get_message, get_messages, Language, ScriptProfile, DEFAULT_CHAT_MODEL,
    DEFAULT_EMBEDDING_MODEL, MESSAGES_EN, MESSAGES_FR,
};

// Backend re-exports
pub use backend::{
    ChatMessage, ChatReply, ChatRequest, ChunkStream, EmbeddingReply, EmbeddingRequest,
    HealthStatus, ProxyBackend, Role, StreamChunk, StreamRequest,
};

// Client re-exports
pub use client::{ClientConfig, ProxyClient, DEFAULT_API_KEY, DEFAULT_BASE_URL};

// Harness re-exports
pub use harness::{HarnessConfig, SmokeHarness, SmokeReport, StepOutcome, StepReport};
pub use steps::Step;
