use thiserror::Error;

use crate::crawlers::CrawlerError;
use crate::domain::catalog::CatalogError;
use crate::processing::embedding::EmbeddingError;
use crate::repository::errors::RepositoryError;

pub mod cleaning;
pub mod crawler;
pub mod embedding;
pub mod evaluation;
pub mod indexing;
pub mod query;
pub mod retrieval;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Crawler(#[from] CrawlerError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("please enter a job description or URL")]
    EmptyQuery,
}

impl ProcessingError {
    /// Level at which an interactive front end reports this error. Blank
    /// input is a user slip, not a failure.
    pub fn log_level(&self) -> log::Level {
        match self {
            ProcessingError::EmptyQuery => log::Level::Warn,
            _ => log::Level::Error,
        }
    }
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;
