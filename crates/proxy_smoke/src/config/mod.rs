//! Configuration module for proxy_smoke
//!
//! This module contains:
//! - `i18n`: Console messages in French and English
//! - `profile`: Request fixtures for each smoke-test step

mod i18n;
mod profile;

pub use i18n::{get_message, get_messages, Language, MESSAGES_EN, MESSAGES_FR};
pub use profile::{ScriptProfile, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
