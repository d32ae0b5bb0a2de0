use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::assessment::AssessmentRecord;

pub mod page_text;
pub mod shl;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("failed to build crawler: {0}")]
    Build(String),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("no text could be extracted from {0}")]
    EmptyExtraction(String),
    #[error("crawler was shut down")]
    Closed,
}

pub type CrawlerResult<T> = Result<T, CrawlerError>;

/// An abstraction over catalog crawlers that produce [`AssessmentRecord`]s.
#[async_trait]
pub trait CatalogCrawler: Send + Sync {
    /// Crawls the whole catalog and returns one record per unique URL.
    async fn get_assessments(&self) -> Vec<AssessmentRecord>;

    /// Fetches a single detail page.
    ///
    /// Never fails: an unreachable page yields a placeholder record with
    /// unknown duration and test type.
    async fn get_assessment(&self, name: &str, url: &str) -> AssessmentRecord;
}

pub fn build_reqwest_client() -> CrawlerResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| CrawlerError::Build(e.to_string()))
}

/// GET `url` and return the body when the status is a success.
pub(crate) async fn fetch_text(client: &reqwest::Client, url: &str) -> CrawlerResult<String> {
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|source| CrawlerError::Request {
            url: url.to_string(),
            source,
        })?;
    if !res.status().is_success() {
        return Err(CrawlerError::Status {
            url: url.to_string(),
            status: res.status(),
        });
    }
    res.text().await.map_err(|source| CrawlerError::Request {
        url: url.to_string(),
        source,
    })
}
