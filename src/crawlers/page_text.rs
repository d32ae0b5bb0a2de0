//! Main-content text extraction for job description URLs.

use scraper::{Html, Selector};

use crate::crawlers::{CrawlerError, CrawlerResult, fetch_text};

/// Containers tried in order; the first one yielding text wins.
const CONTENT_ROOTS: [&str; 3] = ["article", "main", "body"];
const CONTENT_BLOCKS: &str = "h1, h2, h3, h4, p, li";

/// Collects heading, paragraph and list text from the page's main content.
///
/// Returns an empty string when the page has no readable blocks.
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let block_selector = Selector::parse(CONTENT_BLOCKS).unwrap();

    for root in CONTENT_ROOTS {
        let root_selector = Selector::parse(root).unwrap();
        let Some(container) = document.select(&root_selector).next() else {
            continue;
        };

        let blocks: Vec<String> = container
            .select(&block_selector)
            .map(|el| {
                el.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.is_empty())
            .collect();

        if !blocks.is_empty() {
            return blocks.join("\n");
        }
    }

    String::new()
}

/// Main text of a page fetched from `url`.
///
/// Fails with [`CrawlerError::EmptyExtraction`] when the page yields nothing.
pub fn page_text(html: &str, url: &str) -> CrawlerResult<String> {
    let text = extract_main_text(html);
    if text.trim().is_empty() {
        return Err(CrawlerError::EmptyExtraction(url.to_string()));
    }
    Ok(text)
}

/// Fetches `url` and extracts its main text.
pub async fn fetch_page_text(client: &reqwest::Client, url: &str) -> CrawlerResult<String> {
    let html = fetch_text(client, url).await?;
    page_text(&html, url)
}
