//! Interactive recommendation front end.

use std::fmt::Write as _;

use serde::Serialize;

use crate::crawlers::page_text::fetch_page_text;
use crate::crawlers::{CrawlerResult, build_reqwest_client};
use crate::domain::catalog::Catalog;
use crate::processing::embedding::{TextEncoder, embed_query};
use crate::processing::retrieval::{SearchOptions, search};
use crate::processing::{ProcessingError, ProcessingResult};
use crate::repository::CatalogReader;

/// A user query: either a job description or a link to one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryInput {
    Text(String),
    Url(String),
}

impl QueryInput {
    /// Classify raw input. Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.starts_with("http") {
            Some(QueryInput::Url(trimmed.to_string()))
        } else {
            Some(QueryInput::Text(trimmed.to_string()))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub url: String,
    pub similarity: f32,
}

/// Embed `text` and run retrieval with `options`.
pub fn recommend<E>(
    catalog: &Catalog,
    encoder: &mut E,
    text: &str,
    options: &SearchOptions,
) -> ProcessingResult<Vec<Recommendation>>
where
    E: TextEncoder + ?Sized,
{
    let query_vector = embed_query(encoder, text)?;
    let candidates = search(catalog, &query_vector, options)?;

    Ok(candidates
        .into_iter()
        .map(|candidate| Recommendation {
            name: candidate.assessment.name.clone(),
            url: candidate.assessment.url.clone(),
            similarity: candidate.similarity,
        })
        .collect())
}

pub fn render_recommendations(results: &[Recommendation]) -> String {
    if results.is_empty() {
        return "No matching assessments found with the current filters.\n".to_string();
    }

    let mut output = String::from("Top Matches:\n");
    for result in results {
        let _ = writeln!(
            output,
            "- {} (Adjusted Similarity: {:.4})\n  {}\n",
            result.name, result.similarity, result.url
        );
    }
    output
}

/// Serves queries against a catalog that is loaded on first use.
///
/// A failed load is reported for that request only; the next request tries
/// again.
pub struct QuerySession<'a, R, E: ?Sized> {
    repo: &'a R,
    encoder: &'a mut E,
    client: reqwest::Client,
    catalog: Option<Catalog>,
    options: SearchOptions,
}

impl<'a, R, E> QuerySession<'a, R, E>
where
    R: CatalogReader,
    E: TextEncoder + ?Sized,
{
    pub fn new(repo: &'a R, encoder: &'a mut E, options: SearchOptions) -> CrawlerResult<Self> {
        Ok(Self {
            repo,
            encoder,
            client: build_reqwest_client()?,
            catalog: None,
            options,
        })
    }

    pub async fn resolve_text(&self, input: &QueryInput) -> CrawlerResult<String> {
        match input {
            QueryInput::Text(text) => Ok(text.clone()),
            QueryInput::Url(url) => {
                log::info!("Extracting content from {url}");
                fetch_page_text(&self.client, url).await
            }
        }
    }

    pub async fn handle(&mut self, raw_input: &str) -> ProcessingResult<Vec<Recommendation>> {
        let input = QueryInput::parse(raw_input).ok_or(ProcessingError::EmptyQuery)?;
        let text = self.resolve_text(&input).await?;

        let catalog = match self.catalog.take() {
            Some(catalog) => catalog,
            None => self.repo.load_catalog()?,
        };
        let results = recommend(&catalog, &mut *self.encoder, &text, &self.options);
        self.catalog = Some(catalog);

        results
    }
}
