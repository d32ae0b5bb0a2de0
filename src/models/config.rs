//! Configuration model loaded from external sources.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::assessment::Category;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
/// Settings shared by every pipeline stage.
pub struct AppConfig {
    pub catalog_url: String,
    pub crawler_concurrency: usize,
    pub raw_metadata_path: PathBuf,
    pub cleaned_metadata_path: PathBuf,
    pub output_dir: PathBuf,
    pub eval_set_path: PathBuf,
    pub embedding_model: String,
    pub model_cache_dir: Option<PathBuf>,
    pub evaluation: EvaluationConfig,
    pub query: QueryConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    pub k: usize,
    pub max_duration: Option<u32>,
    pub required_categories: Vec<Category>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
/// Defaults for the interactive front end; CLI flags override them.
pub struct QueryConfig {
    pub top_k: usize,
    pub max_duration: Option<u32>,
    pub required_categories: Vec<Category>,
    pub category_penalty: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://www.shl.com/solutions/products/product-catalog/".to_string(),
            crawler_concurrency: 10,
            raw_metadata_path: PathBuf::from("shl_metadata_index.json"),
            cleaned_metadata_path: PathBuf::from("shl_metadata_index_cleaned.json"),
            output_dir: PathBuf::from("outputs"),
            eval_set_path: PathBuf::from("query_eval_set.json"),
            embedding_model: "multilingual-e5-large".to_string(),
            model_cache_dir: None,
            evaluation: EvaluationConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            k: 5,
            max_duration: Some(45),
            required_categories: vec![
                Category::Cognitive,
                Category::Personality,
                Category::Technical,
            ],
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_duration: Some(45),
            required_categories: vec![
                Category::Technical,
                Category::Cognitive,
                Category::Personality,
            ],
            category_penalty: 0.8,
        }
    }
}

impl AppConfig {
    /// Load `config/default.yaml` and `config/local.yaml` when present, then
    /// apply `RECOMMENDER_*` environment overrides (`__` separates nested
    /// keys, e.g. `RECOMMENDER_QUERY__TOP_K`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources("config/default", "config/local")
    }

    pub fn from_sources(default_file: &str, local_file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(default_file).required(false))
            .add_source(File::with_name(local_file).required(false))
            .add_source(
                Environment::with_prefix("RECOMMENDER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
