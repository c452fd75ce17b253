//! `fetch_webpage`: fetch pages and return their readable text.

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};
use tracing::{debug, warn};

use crate::args;
use crate::html;

/// Bytes of a response body read before the rest is dropped.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub struct FetchWebpageTool {
    client: reqwest::Client,
    max_chars: usize,
}

impl FetchWebpageTool {
    pub fn new(max_chars: usize) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; OpenCursor/0.1)")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            max_chars: max_chars.max(1),
        }
    }

    async fn fetch_one(&self, url: &str, query: Option<&str>) -> String {
        match reqwest::Url::parse(url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => return format!("Error fetching {url}: only http(s) URLs are supported"),
        }

        debug!(url = %url, "Fetching webpage");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed");
                return format!("Error fetching {url}: {e}");
            }
        };

        let status = response.status();
        if !status.is_success() {
            return format!("Error fetching {url}: HTTP {status}");
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("html"));

        match read_capped(response, MAX_BODY_BYTES).await {
            Ok(body) => format!(
                "Content from {url}:\n\n{}",
                render_page(&String::from_utf8_lossy(&body), is_html, query, self.max_chars)
            ),
            Err(e) => format!("Error fetching {url}: {e}"),
        }
    }
}

/// Stream the body, stopping once `limit` bytes have been read.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if append_capped(&mut body, &chunk, limit) {
            debug!(limit, "Response body capped");
            break;
        }
    }
    Ok(body)
}

/// Append up to `limit` bytes in total; `true` once the buffer is full.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() >= limit
}

/// Readable text of a page, optionally filtered to lines mentioning `query`,
/// truncated to `max_chars` characters.
fn render_page(body: &str, is_html: bool, query: Option<&str>, max_chars: usize) -> String {
    let text = if is_html {
        html::to_text(body)
    } else {
        body.trim().to_string()
    };

    let text = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let needle = q.to_lowercase();
            let hits: Vec<&str> = text
                .lines()
                .filter(|l| l.to_lowercase().contains(&needle))
                .collect();
            if hits.is_empty() {
                return format!("No lines mentioning '{q}'");
            }
            hits.join("\n")
        }
        None => text,
    };

    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\n... [truncated]", &text[..cut]),
        None => text,
    }
}

#[async_trait]
impl Tool for FetchWebpageTool {
    fn name(&self) -> &str {
        "fetch_webpage"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["urls"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "fetch_webpage",
            "Fetch web pages and return their text content.",
        )
        .param(ParamSpec::required(
            "urls",
            ParamType::Array,
            "List of URLs to fetch",
        ))
        .param(ParamSpec::optional(
            "query",
            ParamType::String,
            "Only return lines mentioning this text",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let urls = args::string_list(&arguments, "urls")?;
        let query = args::optional_str(&arguments, "query")?;

        if urls.is_empty() {
            return Err(ToolError::InvalidArguments("urls must not be empty".into()));
        }

        let mut sections = Vec::with_capacity(urls.len());
        for url in &urls {
            sections.push(self.fetch_one(url, query).await);
        }
        Ok(sections.join("\n\n").into())
    }
}
