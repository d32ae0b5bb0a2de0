use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::EMBEDDING_INSTRUCTION;
use crate::domain::assessment::Assessment;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model error: {0}")]
    Model(String),
    #[error("unknown embedding model `{0}`")]
    UnknownModel(String),
    #[error("encoder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
    #[error("vector {position} has {actual} dimensions, expected {expected}")]
    Dimensions {
        position: usize,
        expected: usize,
        actual: usize,
    },
    #[error("vector index error: {0}")]
    Index(String),
    #[error("no assessments could be prepared for embedding")]
    NoDocuments,
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Anything that turns `(instruction, text)` pairs into one vector per pair.
pub trait TextEncoder {
    fn encode(&mut self, inputs: &[(&str, &str)]) -> EmbeddingResult<Vec<Vec<f32>>>;
}

/// [`TextEncoder`] backed by a local `fastembed` model.
///
/// Loading the model is expensive, so one instance is created at startup and
/// lent to every stage that needs it.
pub struct FastEmbedder {
    model: TextEmbedding,
}

impl FastEmbedder {
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> EmbeddingResult<Self> {
        let mut options = InitOptions::new(embedding_model(model_name)?);
        if let Some(cache_dir) = cache_dir {
            options = options.with_cache_dir(cache_dir);
        }

        log::info!("Loading embedding model {model_name}");
        let model = TextEmbedding::try_new(options)
            .map_err(|error| EmbeddingError::Model(format!("{error:?}")))?;

        Ok(Self { model })
    }
}

impl TextEncoder for FastEmbedder {
    fn encode(&mut self, inputs: &[(&str, &str)]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let texts: Vec<String> = inputs
            .iter()
            .map(|(instruction, text)| format!("{instruction}: {text}"))
            .collect();

        self.model
            .embed(texts, None)
            .map_err(|error| EmbeddingError::Model(format!("{error:?}")))
    }
}

/// Resolve a configured model name to a `fastembed` model.
pub fn embedding_model(name: &str) -> EmbeddingResult<EmbeddingModel> {
    match name.trim().to_lowercase().as_str() {
        "multilingual-e5-large" => Ok(EmbeddingModel::MultilingualE5Large),
        "multilingual-e5-base" => Ok(EmbeddingModel::MultilingualE5Base),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        _ => Err(EmbeddingError::UnknownModel(name.to_string())),
    }
}

/// Build the sentence that represents an assessment in embedding space.
///
/// Fields in order: name, canonical categories, original label, duration,
/// remote support and adaptive support.
pub fn assessment_embedding_prompt(assessment: &Assessment) -> String {
    let standard = if assessment.categories.is_empty() {
        "unknown".to_string()
    } else {
        assessment
            .categories
            .iter()
            .map(|category| category.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let original = assessment.original_test_type.as_deref().unwrap_or("N/A");
    let duration = assessment
        .duration_minutes
        .map(|minutes| minutes.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "{name} | Standard Type: {standard} | Original Type: {original} | Duration: {duration} mins | Remote: {remote} | Adaptive: {adaptive}",
        name = assessment.name,
        remote = yes_no(assessment.remote_support),
        adaptive = yes_no(assessment.adaptive_support),
    )
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// Encode `texts` with the retrieval instruction and normalize the results.
pub fn encode_normalized<E>(encoder: &mut E, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>
where
    E: TextEncoder + ?Sized,
{
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let inputs: Vec<(&str, &str)> = texts
        .iter()
        .map(|text| (EMBEDDING_INSTRUCTION, text.as_str()))
        .collect();
    let vectors = encoder.encode(&inputs)?;

    if vectors.len() != inputs.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: inputs.len(),
            actual: vectors.len(),
        });
    }

    Ok(vectors.iter().map(|vector| normalize_embedding(vector)).collect())
}

/// Encode a single query into a unit vector.
pub fn embed_query<E>(encoder: &mut E, query: &str) -> EmbeddingResult<Vec<f32>>
where
    E: TextEncoder + ?Sized,
{
    encode_normalized(encoder, &[query.to_string()])?
        .into_iter()
        .next()
        .ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
}

/// Options shared by freshly built and reloaded indexes.
pub fn index_options(dimensions: usize) -> IndexOptions {
    IndexOptions {
        dimensions,
        metric: MetricKind::L2sq,
        quantization: ScalarKind::F32,
        ..Default::default()
    }
}

/// Build an index over `vectors`, keyed by position.
pub fn build_index(vectors: &[Vec<f32>]) -> EmbeddingResult<Index> {
    let dimensions = vectors
        .first()
        .map(Vec::len)
        .ok_or(EmbeddingError::NoDocuments)?;

    let index = Index::new(&index_options(dimensions))
        .map_err(|error| EmbeddingError::Index(error.to_string()))?;
    index
        .reserve(vectors.len())
        .map_err(|error| EmbeddingError::Index(error.to_string()))?;

    for (position, vector) in vectors.iter().enumerate() {
        if vector.len() != dimensions {
            return Err(EmbeddingError::Dimensions {
                position,
                expected: dimensions,
                actual: vector.len(),
            });
        }
        index
            .add(position as u64, vector.as_slice())
            .map_err(|error| EmbeddingError::Index(error.to_string()))?;
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::assessment::Category;

    struct ConstantEncoder {
        vector: Vec<f32>,
        seen: Vec<String>,
    }

    impl TextEncoder for ConstantEncoder {
        fn encode(&mut self, inputs: &[(&str, &str)]) -> EmbeddingResult<Vec<Vec<f32>>> {
            self.seen
                .extend(inputs.iter().map(|(instruction, text)| format!("{instruction}|{text}")));
            Ok(inputs.iter().map(|_| self.vector.clone()).collect())
        }
    }

    struct ShortEncoder;

    impl TextEncoder for ShortEncoder {
        fn encode(&mut self, _inputs: &[(&str, &str)]) -> EmbeddingResult<Vec<Vec<f32>>> {
            Ok(vec![])
        }
    }

    #[test]
    fn prompt_lists_every_field() {
        let assessment = Assessment {
            name: "Java 8 (New)".to_string(),
            url: "https://example.com/view/java-8-new/".to_string(),
            duration_minutes: Some(18),
            categories: BTreeSet::from([Category::Technical, Category::Simulation]),
            original_test_type: Some("Knowledge & Skills, Simulations".to_string()),
            remote_support: true,
            adaptive_support: false,
        };

        assert_eq!(
            assessment_embedding_prompt(&assessment),
            "Java 8 (New) | Standard Type: simulation, technical | Original Type: Knowledge & Skills, Simulations | Duration: 18 mins | Remote: Yes | Adaptive: No"
        );
    }

    #[test]
    fn prompt_falls_back_for_unknown_values() {
        let assessment = Assessment {
            name: "Mystery".to_string(),
            url: "https://example.com/view/mystery/".to_string(),
            duration_minutes: None,
            categories: BTreeSet::new(),
            original_test_type: None,
            remote_support: false,
            adaptive_support: true,
        };

        assert_eq!(
            assessment_embedding_prompt(&assessment),
            "Mystery | Standard Type: unknown | Original Type: N/A | Duration: N/A mins | Remote: No | Adaptive: Yes"
        );
    }

    #[test]
    fn normalize_embedding_produces_unit_vectors() {
        let normalized = normalize_embedding(&[3.0, 4.0]);

        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_embedding_keeps_zero_vector() {
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn encode_normalized_pairs_texts_with_instruction() {
        let mut encoder = ConstantEncoder {
            vector: vec![0.0, 2.0],
            seen: vec![],
        };

        let vectors =
            encode_normalized(&mut encoder, &["backend developer".to_string()]).expect("encodes");

        assert_eq!(vectors, vec![vec![0.0, 1.0]]);
        assert_eq!(
            encoder.seen,
            vec![format!("{EMBEDDING_INSTRUCTION}|backend developer")]
        );
    }

    #[test]
    fn encode_normalized_rejects_short_output() {
        let result = encode_normalized(&mut ShortEncoder, &["a".to_string(), "b".to_string()]);

        assert!(matches!(
            result,
            Err(EmbeddingError::CountMismatch {
                expected: 2,
                actual: 0
            })
        ));
    }

    #[test]
    fn build_index_rejects_ragged_vectors() {
        let result = build_index(&[vec![1.0, 0.0], vec![1.0]]);

        assert!(matches!(
            result,
            Err(EmbeddingError::Dimensions { position: 1, .. })
        ));
    }

    #[test]
    fn build_index_rejects_empty_input() {
        assert!(matches!(build_index(&[]), Err(EmbeddingError::NoDocuments)));
    }

    #[test]
    fn build_index_keys_vectors_by_position() {
        let index = build_index(&[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.6, 0.8]])
            .expect("index builds");

        let matches = index.exact_search(&[1.0_f32, 0.0], 1).expect("search succeeds");

        assert_eq!(index.size(), 3);
        assert_eq!(matches.keys, vec![1]);
    }

    #[test]
    fn embedding_model_rejects_unknown_names() {
        assert!(embedding_model("multilingual-e5-large").is_ok());
        assert!(matches!(
            embedding_model("instructor-xl"),
            Err(EmbeddingError::UnknownModel(_))
        ));
    }
}
