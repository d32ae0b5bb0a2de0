//! Helpers for integration tests.

use assessment_recommender::domain::assessment::AssessmentRecord;
use assessment_recommender::processing::embedding::{EmbeddingResult, TextEncoder};
use assessment_recommender::repository::{ArtifactPaths, FileRepository};
use tempfile::TempDir;

/// Temporary artifact directory used in integration tests.
pub struct TestDir {
    _dir: TempDir,
    repo: FileRepository,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temporary directory.");
        let root = dir.path();
        let paths = ArtifactPaths::new(
            &root.join("outputs"),
            root.join("raw.json"),
            root.join("cleaned.json"),
            root.join("eval_set.json"),
        );
        TestDir {
            repo: FileRepository::new(paths),
            _dir: dir,
        }
    }

    pub fn repo(&self) -> &FileRepository {
        &self.repo
    }

    pub fn paths(&self) -> &ArtifactPaths {
        self.repo.paths()
    }

    pub fn write_raw(&self, records: &serde_json::Value) {
        write(&self.paths().raw_metadata, records);
    }

    pub fn write_eval_set(&self, cases: &serde_json::Value) {
        write(&self.paths().eval_set, cases);
    }
}

fn write(path: &std::path::Path, value: &serde_json::Value) {
    let contents = serde_json::to_string_pretty(value).expect("Failed to serialize fixture.");
    std::fs::write(path, contents).expect("Failed to write fixture.");
}

/// Encoder that counts a few keywords, plus a constant bias dimension.
pub struct KeywordEncoder;

const VOCABULARY: [&str; 3] = ["java", "personality", "sales"];

impl TextEncoder for KeywordEncoder {
    fn encode(&mut self, inputs: &[(&str, &str)]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(inputs
            .iter()
            .map(|(_, text)| {
                let lowered = text.to_lowercase();
                std::iter::once(1.0)
                    .chain(
                        VOCABULARY
                            .iter()
                            .map(|word| lowered.matches(word).count() as f32),
                    )
                    .collect()
            })
            .collect())
    }
}

/// A small raw catalog as the crawler would write it.
pub fn raw_catalog() -> serde_json::Value {
    serde_json::json!([
        {
            "Assessment Name": "Java Coding Test",
            "URL": "https://example.com/view/java-coding-test/",
            "Duration": "Approximate Completion Time in minutes = 30",
            "Test Type": "Knowledge & Skills",
            "Remote Testing Support": "Yes",
            "Adaptive/IRT Support": "No"
        },
        {
            "Assessment Name": "Java Advanced Test",
            "URL": "https://example.com/view/java-advanced-test/",
            "Duration": "Approximate Completion Time in minutes = 60",
            "Test Type": "Knowledge & Skills",
            "Remote Testing Support": "Yes",
            "Adaptive/IRT Support": "Yes"
        },
        {
            "Assessment Name": "OPQ Personality Questionnaire",
            "URL": "https://example.com/view/opq/",
            "Duration": "Approximate Completion Time in minutes = 25",
            "Test Type": "Personality & Behavior",
            "Remote Testing Support": "Yes",
            "Adaptive/IRT Support": "No"
        },
        {
            "Assessment Name": "Sales Simulation",
            "URL": "https://example.com/view/sales-simulation/",
            "Duration": "Approximate Completion Time in minutes = 40",
            "Test Type": "Simulation",
            "Remote Testing Support": "No",
            "Adaptive/IRT Support": "No"
        },
        {
            "URL": "https://example.com/view/untitled/",
            "Duration": "N/A",
            "Test Type": "N/A"
        }
    ])
}

#[allow(dead_code)]
pub fn record_names(records: &[AssessmentRecord]) -> Vec<&str> {
    records
        .iter()
        .map(|record| record.name.as_deref().unwrap_or(""))
        .collect()
}
