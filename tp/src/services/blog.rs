//! Travel blog scraping and tip extraction
//!
//! Fetches a blog post, converts the HTML to markdown, and asks the agent
//! to pull out tips and highlights. Extraction is layered: if the LLM pass
//! fails, the basic scraped content still comes back; if the fetch itself
//! fails, the result is `None`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::SavedBlogContent;
use crate::llm::{PromptContext, TravelAgent, extract_json};

/// Characters of markdown handed to the extraction prompt
const MAX_EXTRACT_CHARS: usize = 8000;

/// Combined tip/highlight list caps
const MAX_TIPS: usize = 15;

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Extracted content from a travel blog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogContent {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub tips: Vec<String>,
    pub highlights: Vec<String>,
    pub images: Vec<String>,
    pub raw_text: String,
}

impl BlogContent {
    /// Digest suitable for feeding back into generation requirements
    pub fn to_context_string(&self) -> String {
        let mut parts = vec![
            format!("## Blog: {}", self.title),
            format!("Source: {}", self.url),
            String::new(),
        ];

        if !self.summary.is_empty() {
            parts.push(format!("**Summary:** {}", self.summary));
            parts.push(String::new());
        }

        if !self.tips.is_empty() {
            parts.push("**Tips from this blog:**".to_string());
            for tip in &self.tips {
                parts.push(format!("- {}", tip));
            }
            parts.push(String::new());
        }

        if !self.highlights.is_empty() {
            parts.push("**Highlights mentioned:**".to_string());
            for highlight in &self.highlights {
                parts.push(format!("- {}", highlight));
            }
        }

        parts.join("\n")
    }
}

impl From<BlogContent> for SavedBlogContent {
    fn from(content: BlogContent) -> Self {
        SavedBlogContent {
            url: content.url,
            title: content.title,
            summary: content.summary,
            tips: content.tips,
            highlights: content.highlights,
            images: content.images,
            raw_text: content.raw_text,
        }
    }
}

fn build_extraction_prompt(destination: Option<&str>) -> String {
    let dest_context = destination.map(|d| format!(" to {}", d)).unwrap_or_default();

    format!(
        r#"Analyze this travel blog content and extract useful information for planning a trip{}.

Return a JSON object with this exact structure:
{{
    "summary": "A 2-3 sentence summary of what this blog post is about",
    "tips": ["tip 1", "tip 2"],
    "highlights": ["place or activity 1", "place or activity 2"],
    "practical_info": {{
        "budget_mentions": "any budget/cost information mentioned",
        "best_time": "best time to visit if mentioned",
        "warnings": "any warnings or things to avoid"
    }}
}}

Focus on extracting:
- Practical travel tips (what to bring, what to book ahead, etc.)
- Must-see places and activities
- Local food recommendations
- Transportation tips
- Accommodation suggestions
- Safety/health advice
- Budget information

Blog content:
"#,
        dest_context
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractionResponse {
    summary: String,
    tips: Vec<String>,
    highlights: Vec<String>,
    practical_info: PracticalInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PracticalInfo {
    budget_mentions: String,
    best_time: String,
    warnings: String,
}

/// Scrapes travel blogs into structured planning context
pub struct BlogScraper {
    http: Client,
}

impl Default for BlogScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl BlogScraper {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .user_agent(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
                )
                .build()
                .unwrap_or_default(),
        }
    }

    /// Fetch a blog post and convert it to markdown; None on any failure
    pub async fn scrape(&self, url: &str) -> Option<BlogContent> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return None;
        }

        let response = self.http.get(url).send().await.ok()?;
        if !response.status().is_success() {
            warn!(status = %response.status(), %url, "Blog fetch failed");
            return None;
        }

        let html = response.text().await.ok()?;
        let title = extract_title(&html);
        let markdown = html2md::rewrite_html(&html, false);

        let mut raw_text: String = markdown
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if raw_text.len() > MAX_EXTRACT_CHARS {
            raw_text.truncate(MAX_EXTRACT_CHARS);
            raw_text.push_str("...");
        }

        Some(BlogContent {
            url: url.to_string(),
            title,
            raw_text,
            ..Default::default()
        })
    }

    /// Scrape a blog and enrich it with LLM-extracted tips
    ///
    /// The LLM pass is best-effort: on any extraction failure the basic
    /// scraped content is returned unchanged.
    pub async fn scrape_with_agent(
        &self,
        url: &str,
        agent: &TravelAgent,
        destination: Option<&str>,
    ) -> Option<BlogContent> {
        let mut content = self.scrape(url).await?;
        if content.raw_text.is_empty() {
            return Some(content);
        }

        let prompt = format!("{}{}", build_extraction_prompt(destination), content.raw_text);

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let response = match agent.stream_chat(&prompt, &[], &PromptContext::new(), tx).await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, %url, "Blog extraction call failed");
                return Some(content);
            }
        };

        let Ok(extracted) =
            serde_json::from_str::<ExtractionResponse>(&extract_json(&response))
        else {
            debug!(%url, "Blog extraction response did not parse");
            return Some(content);
        };

        if !extracted.summary.is_empty() {
            content.summary = extracted.summary;
        }
        if !extracted.tips.is_empty() {
            let mut combined = extracted.tips;
            for tip in content.tips {
                if !combined.contains(&tip) {
                    combined.push(tip);
                }
            }
            combined.truncate(MAX_TIPS);
            content.tips = combined;
        }
        if !extracted.highlights.is_empty() {
            content.highlights = extracted.highlights;
            content.highlights.truncate(MAX_TIPS);
        }

        let practical = extracted.practical_info;
        if !practical.budget_mentions.is_empty() {
            content.tips.push(format!("Budget info: {}", practical.budget_mentions));
        }
        if !practical.best_time.is_empty() {
            content.tips.push(format!("Best time to visit: {}", practical.best_time));
        }
        if !practical.warnings.is_empty() {
            content.tips.push(format!("Warning: {}", practical.warnings));
        }

        Some(content)
    }
}

/// Page title from the `<title>` tag, else the first markdown heading
fn extract_title(html: &str) -> String {
    if let Some(captures) = TITLE_TAG.captures(html) {
        let title = captures[1].trim().to_string();
        if !title.is_empty() {
            return title;
        }
    }
    "Untitled Blog Post".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::NullDebugSink;
    use crate::llm::model::mock::MockModel;
    use std::sync::Arc;

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title>Two Weeks in Borneo</title></head><body></body></html>";
        assert_eq!(extract_title(html), "Two Weeks in Borneo");
    }

    #[test]
    fn test_extract_title_missing() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), "Untitled Blog Post");
    }

    #[test]
    fn test_context_string_sections() {
        let content = BlogContent {
            url: "https://example.com/lisbon".to_string(),
            title: "Lisbon on a Budget".to_string(),
            summary: "Cheap eats and free views.".to_string(),
            tips: vec!["Buy a transit pass".to_string()],
            highlights: vec!["Alfama".to_string()],
            ..Default::default()
        };

        let context = content.to_context_string();
        assert!(context.contains("## Blog: Lisbon on a Budget"));
        assert!(context.contains("**Summary:** Cheap eats"));
        assert!(context.contains("- Buy a transit pass"));
        assert!(context.contains("- Alfama"));
    }

    #[test]
    fn test_context_string_skips_empty_sections() {
        let content = BlogContent {
            url: "https://example.com".to_string(),
            title: "Sparse".to_string(),
            ..Default::default()
        };

        let context = content.to_context_string();
        assert!(!context.contains("**Summary:**"));
        assert!(!context.contains("**Tips"));
    }

    #[test]
    fn test_extraction_prompt_mentions_destination() {
        let prompt = build_extraction_prompt(Some("Portugal"));
        assert!(prompt.contains("a trip to Portugal"));

        let generic = build_extraction_prompt(None);
        assert!(generic.contains("planning a trip."));
    }

    #[tokio::test]
    async fn test_scrape_rejects_non_http_urls() {
        let scraper = BlogScraper::new();
        assert!(scraper.scrape("file:///etc/passwd").await.is_none());
        assert!(scraper.scrape("not a url").await.is_none());
    }

    #[test]
    fn test_extraction_response_parses_partial_json() {
        let json = r#"{"summary": "Nice post", "tips": ["go early"]}"#;
        let parsed: ExtractionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.summary, "Nice post");
        assert_eq!(parsed.tips.len(), 1);
        assert!(parsed.highlights.is_empty());
    }

    #[tokio::test]
    async fn test_agent_enrichment_is_best_effort() {
        // Unparseable extraction response must not lose the scraped content
        let model = Arc::new(MockModel::with_responses(&["total nonsense"]));
        let agent = TravelAgent::new(model, Arc::new(NullDebugSink));
        let scraper = BlogScraper::new();

        // Invalid URL: scrape itself fails before the agent is consulted
        let result = scraper
            .scrape_with_agent("ftp://example.com", &agent, None)
            .await;
        assert!(result.is_none());
    }
}
