use std::collections::HashSet;

use chrono::Utc;

use crate::OVERFETCH_FACTOR;
use crate::domain::assessment::Category;
use crate::domain::catalog::{Catalog, CatalogError};
use crate::domain::evaluation::{EvalCase, EvalReport, EvalRow, EvalSummary};
use crate::processing::ProcessingResult;
use crate::processing::embedding::{TextEncoder, encode_normalized};
use crate::processing::retrieval::{CategoryFilter, SearchOptions, search};
use crate::repository::{CatalogReader, EvalSetReader, ReportWriter};

/// Filters applied to every evaluation query. Evaluation always uses
/// [`CategoryFilter::Hard`].
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationOptions {
    pub k: usize,
    pub max_duration: Option<u32>,
    pub required_categories: Vec<Category>,
}

impl EvaluationOptions {
    fn search_options(&self) -> SearchOptions {
        SearchOptions {
            k: self.k,
            max_duration: self.max_duration,
            required_categories: self.required_categories.clone(),
            filter: CategoryFilter::Hard,
        }
    }
}

/// Marks each retrieved name as a hit the first time it appears in
/// `relevant`. Repeated names never count twice.
fn hit_flags(retrieved: &[&str], relevant: &HashSet<&str>) -> Vec<bool> {
    let mut seen = HashSet::new();
    retrieved
        .iter()
        .map(|name| relevant.contains(name) && seen.insert(*name))
        .collect()
}

/// Fraction of relevant names that were retrieved; 0 when nothing is relevant.
pub fn recall_at_k(retrieved: &[&str], relevant: &HashSet<&str>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let hits = hit_flags(retrieved, relevant)
        .into_iter()
        .filter(|&hit| hit)
        .count();
    hits as f64 / relevant.len() as f64
}

/// Average precision over hit positions, normalized by `min(k, |relevant|)`.
pub fn average_precision_at_k(retrieved: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    if relevant.is_empty() || k == 0 {
        return 0.0;
    }

    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for (position, hit) in hit_flags(retrieved, relevant).into_iter().enumerate().take(k) {
        if hit {
            hits += 1;
            precision_sum += hits as f64 / (position + 1) as f64;
        }
    }

    precision_sum / k.min(relevant.len()) as f64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Run one labeled query through hard-filter retrieval and score it.
pub fn evaluate_case(
    catalog: &Catalog,
    case: &EvalCase,
    query_vector: &[f32],
    options: &EvaluationOptions,
) -> Result<EvalRow, CatalogError> {
    let relevant: HashSet<&str> = case.relevant_ids.iter().map(String::as_str).collect();

    let raw: Vec<&str> = catalog
        .nearest(query_vector, options.k.saturating_mul(OVERFETCH_FACTOR))?
        .into_iter()
        .filter_map(|neighbor| catalog.get(neighbor.position))
        .map(|assessment| assessment.name.as_str())
        .collect();

    let results = search(catalog, query_vector, &options.search_options())?;
    let retrieved: Vec<&str> = results
        .iter()
        .map(|candidate| candidate.assessment.name.as_str())
        .collect();

    log::info!("Query: {}", case.query);
    log::info!("Expected (relevant ids): {:?}", case.relevant_ids);
    log::info!("Raw retrieved (all candidates): {raw:?}");
    log::info!("Filtered retrieved: {retrieved:?}");

    let recall = recall_at_k(&retrieved, &relevant);
    let average_precision = average_precision_at_k(&retrieved, &relevant, options.k);

    Ok(EvalRow {
        query: case.query.clone(),
        relevant: case.relevant_ids.clone(),
        retrieved: results
            .iter()
            .map(|candidate| {
                format!("{} ({:.4})", candidate.assessment.name, candidate.similarity)
            })
            .collect(),
        recall: round4(recall),
        average_precision: round4(average_precision),
    })
}

/// Score every case against `catalog`, given one query vector per case.
pub fn evaluate_cases(
    catalog: &Catalog,
    cases: &[EvalCase],
    query_vectors: &[Vec<f32>],
    options: &EvaluationOptions,
) -> Result<EvalReport, CatalogError> {
    let rows = cases
        .iter()
        .zip(query_vectors)
        .map(|(case, vector)| evaluate_case(catalog, case, vector, options))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = EvalSummary {
        total_cases: rows.len(),
        k: options.k,
        mean_recall: round4(mean(rows.iter().map(|row| row.recall))),
        mean_average_precision: round4(mean(rows.iter().map(|row| row.average_precision))),
    };

    Ok(EvalReport {
        generated_at: Utc::now(),
        summary,
        rows,
    })
}

/// Replay the labeled query set and persist the per-query report.
pub fn process_evaluation_message<R, E>(
    repo: &R,
    encoder: &mut E,
    options: &EvaluationOptions,
) -> ProcessingResult<EvalReport>
where
    R: CatalogReader + EvalSetReader + ReportWriter,
    E: TextEncoder + ?Sized,
{
    log::info!("Evaluating MAP@{k} and Recall@{k}", k = options.k);

    let catalog = repo.load_catalog()?;
    let cases = repo.list_eval_cases()?;
    if cases.is_empty() {
        log::warn!("Evaluation set is empty");
    }

    let queries: Vec<String> = cases.iter().map(|case| case.query.clone()).collect();
    let query_vectors = encode_normalized(encoder, &queries)?;

    let report = evaluate_cases(&catalog, &cases, &query_vectors, options)?;
    repo.save_eval_report(&report)?;

    log::info!(
        "Finished evaluation: cases={}, mean_recall@{k}={}, map@{k}={}",
        report.summary.total_cases,
        report.summary.mean_recall,
        report.summary.mean_average_precision,
        k = options.k
    );

    Ok(report)
}
