//! Model gateway implementations for OpenCursor.
//!
//! All gateways implement the `opencursor_core::ModelGateway` trait.
//! [`build_from_config`] selects one from the loaded configuration.

pub mod ollama;
pub mod openai_compat;
pub mod router;

pub use ollama::OllamaGateway;
pub use openai_compat::OpenAiCompatGateway;
pub use router::build_from_config;

/// Interpret tool-call arguments delivered as a JSON string.
///
/// Empty input means "no arguments". Text that is not valid JSON is kept as
/// a string value so the dispatcher can report it back to the model.
pub(crate) fn parse_arguments(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return serde_json::Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
