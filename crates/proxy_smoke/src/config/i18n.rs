//! Internationalization (i18n) module for console messages

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Language options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    French,
    English,
}

impl Language {
    /// Parse language from string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "en" | "english" => Self::English,
            _ => Self::French,
        }
    }

    /// Get language code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
        }
    }
}

/// French messages
pub static MESSAGES_FR: phf::Map<&'static str, &'static str> = phf_map! {
    "title" => "Test du Proxy OpenAI avec async-openai",
    "health_banner" => "Vérification de santé",
    "models_banner" => "Liste des modèles disponibles",
    "chat_banner" => "Test Chat Completion",
    "embeddings_banner" => "Test Embeddings",
    "streaming_banner" => "Test Streaming Chat",
    "status" => "Statut",
    "reply" => "Réponse",
    "error" => "Erreur",
    "auth_hint" => "(Normal si pas authentifié avec ChatGPT)",
    "embedding_created" => "Embedding créé",
    "dimensions" => "dimensions",
    "streaming" => "Streaming",
    "finished" => "Tests terminés",
};

/// English messages
pub static MESSAGES_EN: phf::Map<&'static str, &'static str> = phf_map! {
    "title" => "OpenAI Proxy Test with async-openai",
    "health_banner" => "Health check",
    "models_banner" => "Available models",
    "chat_banner" => "Chat Completion Test",
    "embeddings_banner" => "Embeddings Test",
    "streaming_banner" => "Streaming Chat Test",
    "status" => "Status",
    "reply" => "Reply",
    "error" => "Error",
    "auth_hint" => "(Expected if the proxy is not authenticated with ChatGPT)",
    "embedding_created" => "Embedding created",
    "dimensions" => "dimensions",
    "streaming" => "Streaming",
    "finished" => "Tests finished",
};

/// Get console messages dictionary by language
pub fn get_messages(lang: Language) -> &'static phf::Map<&'static str, &'static str> {
    match lang {
        Language::English => &MESSAGES_EN,
        Language::French => &MESSAGES_FR,
    }
}

/// Get a single console message by key and language
/// Returns the message if found, otherwise returns the key as a fallback
pub fn get_message<'a>(key: &'a str, lang: Language) -> &'a str {
    let messages = get_messages(lang);
    match messages.get(key) {
        Some(msg) => msg,
        None => key,
    }
}
