//! Gateway selection from configuration.

use std::sync::Arc;

use opencursor_config::AppConfig;
use opencursor_core::gateway::ModelGateway;

use crate::ollama::OllamaGateway;
use crate::openai_compat::OpenAiCompatGateway;

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Build the gateway named by `config.provider`.
///
/// `ollama` talks the native API at `config.host`. Everything else goes
/// through the OpenAI-compatible gateway; well-known providers get their
/// public base URL unless `host` was changed from the Ollama default.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn ModelGateway> {
    let provider = config.provider.trim().to_lowercase();

    if provider == "ollama" {
        tracing::debug!(host = %config.host, "Using native Ollama gateway");
        return Arc::new(OllamaGateway::new(&config.host));
    }

    let base_url = match default_base_url(&provider) {
        Some(url) if config.host.trim_end_matches('/') == DEFAULT_OLLAMA_HOST => url.to_string(),
        _ => config.host.clone(),
    };
    let api_key = config.api_key.clone().unwrap_or_default();

    tracing::debug!(provider = %provider, base_url = %base_url, "Using OpenAI-compatible gateway");
    Arc::new(OpenAiCompatGateway::new(provider, base_url, api_key))
}

/// Base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}
