//! Assessments, their source texts and the vector index, kept in lockstep.

use thiserror::Error;
use usearch::Index;

use crate::domain::assessment::Assessment;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(
        "catalog artifacts are misaligned: {assessments} assessments, {texts} texts, {indexed} indexed vectors"
    )]
    Misaligned {
        assessments: usize,
        texts: usize,
        indexed: usize,
    },
    #[error("query has {actual} dimensions, index expects {expected}")]
    Dimensions { expected: usize, actual: usize },
    #[error("index search failed: {0}")]
    Search(String),
}

/// A neighbor returned by the index: position into the catalog and squared
/// L2 distance to the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Struct-of-arrays view over an embedded catalog snapshot.
///
/// Index key `i` always refers to `assessments[i]` and `texts[i]`; the
/// constructor rejects any snapshot where the three lengths disagree.
pub struct Catalog {
    assessments: Vec<Assessment>,
    texts: Vec<String>,
    index: Index,
}

impl Catalog {
    pub fn new(
        assessments: Vec<Assessment>,
        texts: Vec<String>,
        index: Index,
    ) -> Result<Self, CatalogError> {
        let indexed = index.size();
        if assessments.len() != texts.len() || assessments.len() != indexed {
            return Err(CatalogError::Misaligned {
                assessments: assessments.len(),
                texts: texts.len(),
                indexed,
            });
        }

        Ok(Self {
            assessments,
            texts,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn get(&self, position: usize) -> Option<&Assessment> {
        self.assessments.get(position)
    }

    /// Exact nearest neighbors of `query`, closest first.
    pub fn nearest(&self, query: &[f32], count: usize) -> Result<Vec<Neighbor>, CatalogError> {
        if self.is_empty() || count == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions() {
            return Err(CatalogError::Dimensions {
                expected: self.dimensions(),
                actual: query.len(),
            });
        }

        let matches = self
            .index
            .exact_search(query, count.min(self.len()))
            .map_err(|error| CatalogError::Search(error.to_string()))?;

        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(&key, &distance)| {
                let position = usize::try_from(key).ok()?;
                (position < self.len()).then_some(Neighbor { position, distance })
            })
            .collect())
    }
}
