//! Nearest-neighbor retrieval with duration and category post-filtering.

use crate::OVERFETCH_FACTOR;
use crate::domain::assessment::{Assessment, Category};
use crate::domain::catalog::{Catalog, CatalogError, Neighbor};

/// How candidates that match none of the required categories are treated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CategoryFilter {
    /// Drop them. Results keep index order and collection stops at `k`.
    Hard,
    /// Keep them with similarity scaled by `penalty`, then re-rank.
    ///
    /// Similarity is `1 - squared L2 distance` and goes negative for distant
    /// neighbors; scaling a negative score by `penalty < 1` raises it.
    Soft { penalty: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOptions {
    pub k: usize,
    pub max_duration: Option<u32>,
    /// No category filtering happens when empty.
    pub required_categories: Vec<Category>,
    pub filter: CategoryFilter,
}

/// A retrieved assessment with its raw index distance and adjusted score.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate<'a> {
    pub assessment: &'a Assessment,
    pub raw_distance: f32,
    pub similarity: f32,
}

/// Retrieve up to `options.k` assessments for a unit-length query vector.
///
/// Over-fetches `k * OVERFETCH_FACTOR` neighbors so that filtering still
/// leaves enough candidates.
pub fn search<'a>(
    catalog: &'a Catalog,
    query: &[f32],
    options: &SearchOptions,
) -> Result<Vec<Candidate<'a>>, CatalogError> {
    let neighbors = catalog.nearest(query, options.k.saturating_mul(OVERFETCH_FACTOR))?;
    Ok(filter_candidates(catalog.assessments(), &neighbors, options))
}

/// Apply the duration and category policies to neighbors sorted by
/// ascending distance.
pub fn filter_candidates<'a>(
    assessments: &'a [Assessment],
    neighbors: &[Neighbor],
    options: &SearchOptions,
) -> Vec<Candidate<'a>> {
    if options.k == 0 {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    for neighbor in neighbors {
        let Some(assessment) = assessments.get(neighbor.position) else {
            log::warn!("Index returned unknown position {}", neighbor.position);
            continue;
        };

        if let Some(max_duration) = options.max_duration
            && !assessment
                .duration_minutes
                .is_some_and(|minutes| minutes <= max_duration)
        {
            log::debug!(
                "Skipping {} due to duration: {:?}",
                assessment.name,
                assessment.duration_minutes
            );
            continue;
        }

        let matched = options.required_categories.is_empty()
            || assessment.matches_any(&options.required_categories);
        let mut similarity = 1.0 - neighbor.distance;

        match options.filter {
            CategoryFilter::Hard if !matched => {
                log::debug!(
                    "Skipping {} due to test type mismatch: {:?}",
                    assessment.name,
                    assessment.categories
                );
                continue;
            }
            CategoryFilter::Soft { penalty } if !matched => similarity *= penalty,
            _ => {}
        }

        candidates.push(Candidate {
            assessment,
            raw_distance: neighbor.distance,
            similarity,
        });

        if options.filter == CategoryFilter::Hard && candidates.len() == options.k {
            break;
        }
    }

    if let CategoryFilter::Soft { .. } = options.filter {
        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        candidates.truncate(options.k);
    }

    candidates
}
