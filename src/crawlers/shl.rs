use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use url::Url;

use crate::crawlers::{CatalogCrawler, CrawlerError, CrawlerResult, build_reqwest_client, fetch_text};
use crate::domain::assessment::{AssessmentRecord, DurationField, SupportFlag, TestTypeField};

/// Listing pages are paginated in steps of this many items.
const PAGE_SIZE: usize = 12;
/// `(type, item count)` for each catalog section.
const CATALOG_SECTIONS: [(u8, usize); 2] = [(1, 384), (2, 144)];
const DETAIL_PATH: &str = "/product-catalog/view/";

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)").unwrap());
static TYPE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Z])\b").unwrap());

fn test_type_label(code: &str) -> Option<&'static str> {
    match code {
        "A" => Some("Ability & Aptitude"),
        "B" => Some("Biodata & Situational Judgement"),
        "C" => Some("Competencies"),
        "D" => Some("Development & 360"),
        "E" => Some("Assessment Exercises"),
        "K" => Some("Knowledge & Skills"),
        "P" => Some("Personality & Behavior"),
        "S" => Some("Simulations"),
        _ => None,
    }
}

/// A detail link discovered on a listing page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogLink {
    pub name: String,
    pub url: String,
}

/// Fields scraped from an assessment detail page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssessmentDetails {
    pub duration: DurationField,
    pub test_type: TestTypeField,
    pub remote_support: bool,
    pub adaptive_support: bool,
}

impl AssessmentDetails {
    /// Placeholder used when a detail page cannot be fetched.
    pub fn unknown() -> Self {
        Self {
            duration: DurationField::Text("N/A".to_string()),
            test_type: TestTypeField::Text("N/A".to_string()),
            remote_support: false,
            adaptive_support: false,
        }
    }

    fn into_record(self, name: &str, url: &str) -> AssessmentRecord {
        AssessmentRecord {
            name: Some(name.to_string()),
            url: Some(url.to_string()),
            duration: Some(self.duration),
            test_type: Some(self.test_type),
            original_test_type: None,
            remote_support: Some(SupportFlag::from_bool(self.remote_support)),
            adaptive_support: Some(SupportFlag::from_bool(self.adaptive_support)),
        }
    }
}

/// Extracts detail links from a listing page.
pub fn parse_listing_page(html: &str, base_url: &Url) -> Vec<CatalogLink> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            if !href.contains(DETAIL_PATH) {
                return None;
            }
            Some(CatalogLink {
                name: link.text().collect::<String>().trim().to_string(),
                url: base_url.join(href).ok()?.to_string(),
            })
        })
        .collect()
}

/// Extracts duration, test type and support flags from a detail page.
pub fn parse_detail_page(html: &str) -> AssessmentDetails {
    let document = Html::parse_document(html);

    // Duration
    let paragraph_selector = Selector::parse("p").unwrap();
    let duration = document
        .select(&paragraph_selector)
        .map(|el| el.text().collect::<String>())
        .find(|text| text.to_lowercase().contains("approximate completion time"))
        .and_then(|text| {
            FIRST_NUMBER
                .captures(&text)
                .and_then(|captures| captures.get(1))
                .and_then(|digits| digits.as_str().parse().ok())
        })
        .map(DurationField::Minutes)
        .unwrap_or_else(|| DurationField::Text("N/A".to_string()));

    // Test type codes live next to the element whose own text says "Test Type"
    let any_selector = Selector::parse("body *").unwrap();
    let labels: Vec<&str> = document
        .select(&any_selector)
        .find(|el| {
            el.children()
                .filter_map(|child| child.value().as_text())
                .any(|text| text.to_lowercase().contains("test type"))
        })
        .map(|container| {
            let text = container.text().collect::<Vec<_>>().join(" ");
            TYPE_CODE
                .captures_iter(&text)
                .filter_map(|captures| captures.get(1))
                .filter_map(|code| test_type_label(code.as_str()))
                .collect()
        })
        .unwrap_or_default();
    let test_type = if labels.is_empty() {
        TestTypeField::Text("N/A".to_string())
    } else {
        TestTypeField::Text(labels.join(", "))
    };

    // Remote / adaptive flags
    let page_text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    AssessmentDetails {
        duration,
        test_type,
        remote_support: page_text.contains("remote testing"),
        adaptive_support: page_text.contains("adaptive") || page_text.contains("irt"),
    }
}

/// Keeps one link per URL, in first-seen order, with the name from the last
/// occurrence.
pub fn dedupe_links(links: Vec<CatalogLink>) -> Vec<CatalogLink> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<CatalogLink> = Vec::new();

    for link in links {
        match positions.get(&link.url) {
            Some(&position) => unique[position] = link,
            None => {
                positions.insert(link.url.clone(), unique.len());
                unique.push(link);
            }
        }
    }

    unique
}

/// Crawler for the SHL product catalog which limits concurrent HTTP requests
/// using a [`Semaphore`].
pub struct ShlCatalogCrawler {
    catalog_url: Url,
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl ShlCatalogCrawler {
    /// Creates a new crawler with the given concurrency limit.
    ///
    /// `concurrency` controls how many detail pages may be in flight at the
    /// same time.
    pub fn new(catalog_url: &str, concurrency: usize) -> CrawlerResult<Self> {
        Ok(Self {
            catalog_url: Url::parse(catalog_url).map_err(|e| CrawlerError::Build(e.to_string()))?,
            client: build_reqwest_client()?,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        })
    }

    /// Every listing page URL in crawl order.
    pub fn listing_urls(&self) -> Vec<String> {
        let mut urls = Vec::new();
        for (section, items) in CATALOG_SECTIONS {
            for start in (0..items).step_by(PAGE_SIZE) {
                let mut page_url = self.catalog_url.clone();
                page_url
                    .query_pairs_mut()
                    .clear()
                    .append_pair("start", &start.to_string())
                    .append_pair("type", &section.to_string());
                urls.push(page_url.to_string());
            }
        }
        urls
    }

    /// Fetches a URL once a permit from the internal [`Semaphore`] is held.
    async fn fetch_html(&self, url: &str) -> CrawlerResult<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| CrawlerError::Closed)?;
        fetch_text(&self.client, url).await
    }

    /// Walks every listing page sequentially and collects detail links.
    async fn get_catalog_links(&self) -> Vec<CatalogLink> {
        let mut links = Vec::new();
        for page_url in self.listing_urls() {
            match self.fetch_html(&page_url).await {
                Ok(html) => links.extend(parse_listing_page(&html, &self.catalog_url)),
                Err(e) => log::error!("Failed to fetch listing page {page_url}: {e}"),
            }
        }
        links
    }
}

#[async_trait]
impl CatalogCrawler for ShlCatalogCrawler {
    /// Crawls listings sequentially, then fetches detail pages concurrently
    /// with `join_all`, bounded by the crawler's semaphore.
    async fn get_assessments(&self) -> Vec<AssessmentRecord> {
        let links = dedupe_links(self.get_catalog_links().await);
        log::info!("Discovered {} unique assessments", links.len());

        let tasks = links
            .iter()
            .map(|link| self.get_assessment(&link.name, &link.url));
        futures::future::join_all(tasks).await
    }

    async fn get_assessment(&self, name: &str, url: &str) -> AssessmentRecord {
        let details = match self.fetch_html(url).await {
            Ok(html) => parse_detail_page(&html),
            Err(e) => {
                log::error!("Error scraping {url}: {e}");
                AssessmentDetails::unknown()
            }
        };
        details.into_record(name, url)
    }
}
