//! proxy-smoke - smoke test for a local OpenAI-compatible proxy
//!
//! Usage:
//!     proxy-smoke [OPTIONS]
//!
//! Environment Variables:
//!     PROXY_SMOKE_BASE_URL: Proxy API base URL (default: http://localhost:3001/v1)
//!     PROXY_SMOKE_API_KEY: API key sent to the proxy (default: sk-fake-key-for-testing)
//!     PROXY_SMOKE_CHAT_MODEL: Model for chat and streaming (default: gpt-3.5-turbo)
//!     PROXY_SMOKE_EMBEDDING_MODEL: Model for embeddings (default: text-embedding-ada-002)
//!     PROXY_SMOKE_LANG: Console language, fr or en (default: fr)
//!     RUST_LOG: Log filter, overrides --verbose

use anyhow::Result;
use clap::Parser;
use proxy_smoke::{
    ClientConfig, HarnessConfig, Language, ProxyClient, ScriptProfile, SmokeHarness, Step,
    DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL,
};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Smoke test for a local OpenAI-compatible proxy
#[derive(Parser, Debug)]
#[command(name = "proxy-smoke")]
#[command(about = "Smoke test for a local OpenAI-compatible proxy")]
#[command(after_help = r#"Examples:
    # Run every step against the default proxy (http://localhost:3001/v1)
    proxy-smoke

    # Point at another proxy
    proxy-smoke --base-url http://localhost:3000/v1

    # Only check chat and streaming, in English
    proxy-smoke --step chat --step streaming --lang en

    # Reproduce the Node.js script's requests and check /health first
    proxy-smoke --profile node --health
"#)]
struct Cli {
    /// Proxy API base URL
    #[arg(long, env = "PROXY_SMOKE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key sent to the proxy (placeholder, the proxy authenticates upstream)
    #[arg(long, env = "PROXY_SMOKE_API_KEY", default_value = DEFAULT_API_KEY)]
    api_key: String,

    /// Model for the chat and streaming steps
    #[arg(long, env = "PROXY_SMOKE_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    chat_model: String,

    /// Model for the embeddings step
    #[arg(long, env = "PROXY_SMOKE_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Request fixtures to reproduce (python or node)
    #[arg(long, default_value = "python", value_parser = ["python", "node"])]
    profile: String,

    /// Console language (fr or en)
    #[arg(long, env = "PROXY_SMOKE_LANG", default_value = "fr", value_parser = ["fr", "en"])]
    lang: String,

    /// Run only this step (repeatable; default: all steps)
    #[arg(long = "step", value_name = "STEP", value_parser = ["models", "chat", "embeddings", "streaming"])]
    steps: Vec<String>,

    /// Check the proxy's /health route before the steps
    #[arg(long)]
    health: bool,

    /// Increase log verbosity on stderr (-v info, -vv debug)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn selected_steps(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            return Step::ALL.to_vec();
        }
        Step::ALL
            .into_iter()
            .filter(|step| self.steps.iter().any(|name| Step::from_name(name) == Some(*step)))
            .collect()
    }

    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::new()
            .with_lang(Language::from_str(&self.lang))
            .with_profile(ScriptProfile::from_str(&self.profile))
            .with_chat_model(&self.chat_model)
            .with_embedding_model(&self.embedding_model)
            .with_steps(self.selected_steps())
            .with_health_check(self.health)
    }
}

/// Install the stderr log subscriber; stdout carries only the transcript
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    debug!(?args, "parsed arguments");

    let client_config = ClientConfig::new(&args.base_url).with_api_key(&args.api_key);
    let harness = SmokeHarness::new(ProxyClient::new(client_config), args.harness_config());

    // Step failures are part of the transcript, never of the exit code
    harness.run(&mut std::io::stdout()).await?;

    Ok(())
}
