use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use usearch::Index;

use crate::domain::assessment::{Assessment, AssessmentRecord};
use crate::domain::catalog::Catalog;
use crate::domain::evaluation::{EvalCase, EvalReport};
use crate::models::config::AppConfig;
use crate::repository::errors::{RepositoryError, RepositoryResult};

pub mod catalog;
pub mod errors;
pub mod evaluation;
pub mod record;

pub trait RecordReader {
    fn list_raw_records(&self) -> RepositoryResult<Vec<AssessmentRecord>>;
    fn list_cleaned_records(&self) -> RepositoryResult<Vec<AssessmentRecord>>;
}

pub trait RecordWriter {
    fn save_raw_records(&self, records: &[AssessmentRecord]) -> RepositoryResult<usize>;
    fn save_cleaned_records(&self, records: &[AssessmentRecord]) -> RepositoryResult<usize>;
}

pub trait CatalogReader {
    fn load_catalog(&self) -> RepositoryResult<Catalog>;
}

pub trait CatalogWriter {
    /// Replace every catalog artifact. All slices and the index must describe
    /// the same assessments in the same order.
    fn save_catalog(
        &self,
        assessments: &[Assessment],
        texts: &[String],
        vectors: &[Vec<f32>],
        index: &Index,
    ) -> RepositoryResult<()>;
}

pub trait EvalSetReader {
    fn list_eval_cases(&self) -> RepositoryResult<Vec<EvalCase>>;
}

pub trait ReportWriter {
    fn save_eval_report(&self, report: &EvalReport) -> RepositoryResult<()>;
}

/// Locations of every file the pipeline reads or writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub raw_metadata: PathBuf,
    pub cleaned_metadata: PathBuf,
    pub index: PathBuf,
    pub vectors: PathBuf,
    pub texts: PathBuf,
    pub catalog_metadata: PathBuf,
    pub eval_set: PathBuf,
    pub eval_report: PathBuf,
}

impl ArtifactPaths {
    /// Catalog artifacts and the report under `output_dir`, inputs as given.
    pub fn new(
        output_dir: &Path,
        raw_metadata: PathBuf,
        cleaned_metadata: PathBuf,
        eval_set: PathBuf,
    ) -> Self {
        Self {
            raw_metadata,
            cleaned_metadata,
            index: output_dir.join("assessment_index.usearch"),
            vectors: output_dir.join("assessment_embeddings.bin"),
            texts: output_dir.join("assessment_texts.json"),
            catalog_metadata: output_dir.join("assessment_metadata.json"),
            eval_set,
            eval_report: output_dir.join("eval_results.json"),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.output_dir,
            config.raw_metadata_path.clone(),
            config.cleaned_metadata_path.clone(),
            config.eval_set_path.clone(),
        )
    }
}

/// Repository over JSON and index files on local disk.
#[derive(Clone, Debug)]
pub struct FileRepository {
    paths: ArtifactPaths,
}

impl FileRepository {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RepositoryError + '_ {
    move |source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> RepositoryResult<T> {
    if !path.exists() {
        return Err(RepositoryError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&content).map_err(|source| RepositoryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RepositoryResult<()> {
    ensure_parent_dir(path)?;
    let content = serde_json::to_string_pretty(value).map_err(|source| RepositoryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(io_error(path))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> RepositoryResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(io_error(parent))
        }
        _ => Ok(()),
    }
}
