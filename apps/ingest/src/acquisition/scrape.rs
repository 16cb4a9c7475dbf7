//! Fallback acquisition: plain HTTP GET, then visible-text scraping with a
//! selector-priority heuristic for job-posting containers.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{AcquisitionStrategy, StrategyError, StrategyKind};
use crate::text::{char_len, collapse_whitespace};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Job-specific containers first, then generic content containers.
const CONTENT_SELECTORS: &[&str] = &[
    r#"[class*="job-description"]"#,
    r#"[class*="job"]"#,
    r#"[id*="job"]"#,
    r#"[class*="position"]"#,
    r#"[id*="position"]"#,
    r#"[class*="description"]"#,
    r#"[id*="description"]"#,
    "main",
    "article",
    r#"[class*="content"]"#,
    "#content",
];

/// Subtrees that never contribute visible text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements after which a word break is inserted.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "section", "article", "main", "header", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th", "table", "dd", "dt", "blockquote",
    "pre", "aside", "nav",
];

fn content_selectors() -> &'static [Selector] {
    static SELECTORS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        CONTENT_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect()
    })
}

fn body_selector() -> &'static Option<Selector> {
    static BODY: OnceLock<Option<Selector>> = OnceLock::new();
    BODY.get_or_init(|| Selector::parse("body").ok())
}

pub struct FetchScrapeStrategy {
    client: Client,
    timeout: Duration,
    selector_min_chars: usize,
}

impl FetchScrapeStrategy {
    pub fn new(timeout: Duration, selector_min_chars: usize) -> Result<Self, StrategyError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            timeout,
            selector_min_chars,
        })
    }
}

#[async_trait]
impl AcquisitionStrategy for FetchScrapeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ScrapedFallback
    }

    async fn attempt(&self, url: &Url) -> Result<String, StrategyError> {
        let response = self
            .client
            .get(url.as_str())
            .header("accept", "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StrategyError::Timeout(self.timeout)
                } else {
                    StrategyError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StrategyError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(extract_job_text(&body, self.selector_min_chars))
    }
}

/// Picks the first job/content container whose visible text exceeds
/// `min_chars`; otherwise returns the whole page's visible text.
pub fn extract_job_text(html: &str, min_chars: usize) -> String {
    let document = Html::parse_document(html);

    for (selector, source) in content_selectors().iter().zip(CONTENT_SELECTORS) {
        for element in document.select(selector) {
            let text = element_text(element);
            if char_len(&text) > min_chars {
                debug!("Selector {source} matched {} chars", char_len(&text));
                return text;
            }
        }
    }

    document_text(&document)
}

/// Visible text of a whole page, script and style removed.
pub fn page_text(html: &str) -> String {
    document_text(&Html::parse_document(html))
}

fn document_text(document: &Html) -> String {
    let root = body_selector()
        .as_ref()
        .and_then(|sel| document.select(sel).next())
        .unwrap_or_else(|| document.root_element());
    element_text(root)
}

fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_TAGS.contains(&name) {
                continue;
            }
            collect_text(child_element, out);
            if BLOCK_TAGS.contains(&name) {
                out.push(' ');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_html_server;

    fn long_sentence(words: usize) -> String {
        "Build reliable data pipelines. ".repeat(words)
    }

    #[test]
    fn test_page_text_strips_script_and_style() {
        let html = r#"<html><head><title>T</title><style>body{color:red}</style></head>
            <body><script>var x = 1;</script><p>Hello</p><p>World</p>
            <noscript>enable js</noscript></body></html>"#;
        assert_eq!(page_text(html), "Hello World");
    }

    #[test]
    fn test_inline_elements_do_not_split_words() {
        let html = "<body><p>Sen<b>ior</b> Engineer</p></body>";
        assert_eq!(page_text(html), "Senior Engineer");
    }

    #[test]
    fn test_job_description_block_wins_over_body() {
        let block = long_sentence(10);
        let html = format!(
            r#"<html><body><nav>Home Jobs About</nav>
            <div class="job-description"><p>{block}</p></div>
            <footer>Copyright 2024 Example Corp. All rights reserved.</footer></body></html>"#
        );
        let text = extract_job_text(&html, 200);
        assert_eq!(text, collapse_whitespace(&block));
    }

    #[test]
    fn test_short_candidates_fall_through_to_body() {
        let html = r#"<html><body><div class="job-title">Engineer</div>
            <p>We are hiring.</p></body></html>"#;
        let text = extract_job_text(html, 200);
        assert_eq!(text, "Engineer We are hiring.");
    }

    #[test]
    fn test_generic_main_container_used_when_no_job_markup() {
        let body = long_sentence(8);
        let html = format!(
            "<html><body><header>Site header</header><main>{body}</main></body></html>"
        );
        assert_eq!(extract_job_text(&html, 200), collapse_whitespace(&body));
    }

    #[test]
    fn test_threshold_is_tunable() {
        let html = r#"<body><div class="position">Short role blurb</div><p>other</p></body>"#;
        assert_eq!(extract_job_text(html, 5), "Short role blurb");
        assert_eq!(extract_job_text(html, 200), "Short role blurb other");
    }

    #[tokio::test]
    async fn test_fetch_scrapes_successful_page() {
        let block = long_sentence(10);
        let html = format!(r#"<body><div class="job-description">{block}</div></body>"#);
        let base = spawn_html_server(vec![("/job", 200, html)]).await;

        let strategy = FetchScrapeStrategy::new(Duration::from_secs(5), 200).unwrap();
        let url = Url::parse(&format!("{base}/job")).unwrap();
        let text = strategy.attempt(&url).await.unwrap();
        assert_eq!(text, collapse_whitespace(&block));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_fails() {
        let base = spawn_html_server(vec![("/gone", 404, "<p>missing</p>".into())]).await;

        let strategy = FetchScrapeStrategy::new(Duration::from_secs(5), 200).unwrap();
        let url = Url::parse(&format!("{base}/gone")).unwrap();
        let err = strategy.attempt(&url).await.unwrap_err();
        assert!(matches!(err, StrategyError::Status(404)));
    }
}
