//! `web_search`: search the web through DuckDuckGo's HTML endpoint.
//!
//! No API key needed. The result page is scraped, so a layout change on
//! their side shows up as "no results" rather than an error.

use std::sync::LazyLock;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};
use regex::Regex;
use tracing::debug;

use crate::args;
use crate::html;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 5;

static RESULT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#).unwrap());
static RESULT_SNIPPET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#).unwrap()
});
static HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());

#[derive(Debug, Clone, PartialEq)]
struct SearchResult {
    title: String,
    url: String,
    description: String,
}

pub struct WebSearchTool {
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; OpenCursor/0.1)")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

/// DuckDuckGo wraps result links in a redirect; pull out the target.
fn unwrap_redirect(href: &str) -> String {
    let href = html::decode_entities(href);
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.clone()
    };
    reqwest::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(href)
}

fn parse_results(page: &str, limit: usize) -> Vec<SearchResult> {
    page.split("result__body")
        .skip(1)
        .filter_map(|chunk| {
            let link = RESULT_LINK.captures(chunk)?;
            let href = HREF.captures(&link[1])?;
            let title = html::to_text(&link[2]);
            if title.is_empty() {
                return None;
            }
            let description = RESULT_SNIPPET
                .captures(chunk)
                .map(|c| html::to_text(&c[1]))
                .unwrap_or_default();
            Some(SearchResult {
                title,
                url: unwrap_redirect(&href[1]),
                description,
            })
        })
        .take(limit)
        .collect()
}

fn render(results: &[SearchResult], show_descriptions: bool) -> String {
    let mut lines = Vec::new();
    for (i, r) in results.iter().enumerate() {
        if show_descriptions {
            lines.push(format!("{}. {}", i + 1, r.title));
            lines.push(format!("   URL: {}", r.url));
            if !r.description.is_empty() {
                lines.push(format!("   Description: {}", r.description));
            }
            lines.push(String::new());
        } else {
            lines.push(format!("{}. {}", i + 1, r.url));
        }
    }
    lines.join("\n").trim_end().to_string()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["search_term"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "web_search",
            "Search the web for up-to-date information. \
             Returns titles, URLs and short descriptions of the top results.",
        )
        .param(ParamSpec::required(
            "search_term",
            ParamType::String,
            "What to search for. Be specific; include versions or dates when relevant.",
        ))
        .param(ParamSpec::optional(
            "show_descriptions",
            ParamType::Boolean,
            "Include result descriptions (default true) or only URLs",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let term = args::required_str(&arguments, "search_term")?;
        let show_descriptions = args::optional_bool(&arguments, "show_descriptions", true)?;

        debug!(term = %term, "Searching the web");

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", term)])
            .send()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error during web search: {e}")))?;

        if !response.status().is_success() {
            return Err(ToolError::failed(
                self.name(),
                format!("Error during web search: HTTP {}", response.status()),
            ));
        }

        let page = response
            .text()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error during web search: {e}")))?;

        if page.contains("anomaly-modal") || page.contains("Unfortunately, bots") {
            return Err(ToolError::failed(
                self.name(),
                "Error during web search: the search engine rejected the request as automated",
            ));
        }

        let results = parse_results(&page, MAX_RESULTS);
        if results.is_empty() {
            return Ok(format!("No search results found for '{term}'.").into());
        }
        Ok(render(&results, show_descriptions).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="result results_links results_links_deep web-result ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&amp;rut=abc">The Rust <b>Programming</b> Language</a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Learn <b>Rust</b> &amp; more.</a>
  </div>
</div>
<div class="result">
  <div class="links_main result__body">
    <h2 class="result__title">
      <a class="result__a" href="https://crates.io/">crates.io</a>
    </h2>
  </div>
</div>
"#;

    #[test]
    fn parses_results_and_unwraps_redirects() {
        let results = parse_results(PAGE, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "The Rust Programming Language");
        assert_eq!(results[0].url, "https://doc.rust-lang.org/book/");
        assert_eq!(results[0].description, "Learn Rust & more.");
        assert_eq!(results[1].url, "https://crates.io/");
        assert_eq!(results[1].description, "");
    }

    #[test]
    fn limit_applies() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
        assert!(parse_results("<html>nothing</html>", 5).is_empty());
    }

    #[test]
    fn renders_numbered_list() {
        let results = parse_results(PAGE, 5);
        let text = render(&results, true);
        assert!(
            text.starts_with("1. The Rust Programming Language\n   URL: https://doc.rust-lang.org/book/")
        );
        assert!(text.contains("   Description: Learn Rust & more."));
        assert!(text.contains("2. crates.io"));

        let urls = render(&results, false);
        assert_eq!(urls, "1. https://doc.rust-lang.org/book/\n2. https://crates.io/");
    }

    #[test]
    fn schema_requires_search_term() {
        let tool = WebSearchTool::new();
        assert_eq!(tool.schema().required_names(), vec!["search_term"]);
    }
}
