use std::fs;
use std::mem::size_of;
use std::path::Path;

use bytemuck::{cast_slice, pod_read_unaligned};
use usearch::Index;

use crate::domain::assessment::Assessment;
use crate::domain::catalog::Catalog;
use crate::processing::embedding::index_options;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    CatalogReader, CatalogWriter, FileRepository, ensure_parent_dir, io_error, read_json,
    write_json,
};

fn index_path(path: &Path) -> RepositoryResult<&str> {
    path.to_str().ok_or_else(|| RepositoryError::Corrupt {
        path: path.to_path_buf(),
        reason: "index path is not valid UTF-8".to_string(),
    })
}

fn read_vectors(path: &Path) -> RepositoryResult<Vec<f32>> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    if bytes.len() % size_of::<f32>() != 0 {
        return Err(RepositoryError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("{} bytes is not a whole number of f32 values", bytes.len()),
        });
    }
    Ok(bytes
        .chunks_exact(size_of::<f32>())
        .map(pod_read_unaligned::<f32>)
        .collect())
}

impl CatalogReader for FileRepository {
    fn load_catalog(&self) -> RepositoryResult<Catalog> {
        let required = [
            &self.paths.index,
            &self.paths.vectors,
            &self.paths.texts,
            &self.paths.catalog_metadata,
        ];
        if let Some(missing) = required.into_iter().find(|path| !path.exists()) {
            return Err(RepositoryError::NotFound(missing.clone()));
        }

        let assessments: Vec<Assessment> = read_json(&self.paths.catalog_metadata)?;
        let texts: Vec<String> = read_json(&self.paths.texts)?;
        let vectors = read_vectors(&self.paths.vectors)?;

        if assessments.is_empty() || vectors.len() % assessments.len() != 0 {
            return Err(RepositoryError::Corrupt {
                path: self.paths.vectors.clone(),
                reason: format!(
                    "{} values cannot be split across {} assessments",
                    vectors.len(),
                    assessments.len()
                ),
            });
        }
        let dimensions = vectors.len() / assessments.len();

        let index = Index::new(&index_options(dimensions))
            .map_err(|error| RepositoryError::Index(error.to_string()))?;
        index
            .load(index_path(&self.paths.index)?)
            .map_err(|error| RepositoryError::Index(error.to_string()))?;

        if index.dimensions() != dimensions {
            return Err(RepositoryError::Corrupt {
                path: self.paths.index.clone(),
                reason: format!(
                    "index has {} dimensions, stored vectors have {dimensions}",
                    index.dimensions()
                ),
            });
        }

        log::info!(
            "Loaded catalog with {} assessments ({dimensions} dimensions)",
            assessments.len()
        );

        Ok(Catalog::new(assessments, texts, index)?)
    }
}

impl CatalogWriter for FileRepository {
    fn save_catalog(
        &self,
        assessments: &[Assessment],
        texts: &[String],
        vectors: &[Vec<f32>],
        index: &Index,
    ) -> RepositoryResult<()> {
        let count = assessments.len();
        if texts.len() != count || vectors.len() != count || index.size() != count {
            return Err(RepositoryError::Corrupt {
                path: self.paths.index.clone(),
                reason: format!(
                    "refusing to save misaligned catalog: {count} assessments, {} texts, {} vectors, {} indexed",
                    texts.len(),
                    vectors.len(),
                    index.size()
                ),
            });
        }

        write_json(&self.paths.catalog_metadata, assessments)?;
        write_json(&self.paths.texts, texts)?;

        let flat: Vec<f32> = vectors.concat();
        ensure_parent_dir(&self.paths.vectors)?;
        fs::write(&self.paths.vectors, cast_slice::<f32, u8>(&flat))
            .map_err(io_error(&self.paths.vectors))?;

        ensure_parent_dir(&self.paths.index)?;
        index
            .save(index_path(&self.paths.index)?)
            .map_err(|error| RepositoryError::Index(error.to_string()))?;

        log::info!("Saved catalog artifacts for {count} assessments");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tempfile::TempDir;

    use super::*;
    use crate::domain::assessment::Category;
    use crate::processing::embedding::build_index;
    use crate::repository::ArtifactPaths;

    fn repo(dir: &TempDir) -> FileRepository {
        FileRepository::new(ArtifactPaths::new(
            &dir.path().join("outputs"),
            dir.path().join("raw.json"),
            dir.path().join("cleaned.json"),
            dir.path().join("eval.json"),
        ))
    }

    fn assessment(name: &str) -> Assessment {
        Assessment {
            name: name.to_string(),
            url: format!("https://example.com/view/{name}/"),
            duration_minutes: Some(20),
            categories: BTreeSet::from([Category::Technical]),
            original_test_type: Some("Knowledge & Skills".to_string()),
            remote_support: true,
            adaptive_support: false,
        }
    }

    #[test]
    fn load_catalog_reports_missing_artifacts() {
        let dir = TempDir::new().expect("temp dir");

        let result = repo(&dir).load_catalog();

        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn saved_catalog_loads_back_aligned() {
        let dir = TempDir::new().expect("temp dir");
        let repo = repo(&dir);
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        let index = build_index(&vectors).expect("index builds");
        let assessments = vec![assessment("java"), assessment("python")];
        let texts = vec!["java".to_string(), "python".to_string()];

        repo.save_catalog(&assessments, &texts, &vectors, &index)
            .expect("catalog saved");
        let catalog = repo.load_catalog().expect("catalog loads");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dimensions(), 3);
        assert_eq!(catalog.assessments(), assessments.as_slice());
        assert_eq!(catalog.texts(), texts.as_slice());
        let nearest = catalog.nearest(&[0.0, 1.0, 0.0], 1).expect("search succeeds");
        assert_eq!(nearest[0].position, 1);
    }

    #[test]
    fn save_catalog_refuses_misaligned_input() {
        let dir = TempDir::new().expect("temp dir");
        let vectors = vec![vec![1.0, 0.0]];
        let index = build_index(&vectors).expect("index builds");

        let result = repo(&dir).save_catalog(
            &[assessment("java"), assessment("python")],
            &["java".to_string(), "python".to_string()],
            &vectors,
            &index,
        );

        assert!(matches!(result, Err(RepositoryError::Corrupt { .. })));
    }

    #[test]
    fn load_catalog_rejects_truncated_texts() {
        let dir = TempDir::new().expect("temp dir");
        let repo = repo(&dir);
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let index = build_index(&vectors).expect("index builds");
        repo.save_catalog(
            &[assessment("java"), assessment("python")],
            &["java".to_string(), "python".to_string()],
            &vectors,
            &index,
        )
        .expect("catalog saved");
        write_json(&repo.paths().texts, &["java".to_string()]).expect("texts overwritten");

        let result = repo.load_catalog();

        assert!(matches!(result, Err(RepositoryError::Catalog(_))));
    }
}
