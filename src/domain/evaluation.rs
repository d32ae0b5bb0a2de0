use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One labeled query from the evaluation set.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EvalCase {
    pub query: String,
    #[serde(default)]
    pub relevant_ids: Vec<String>,
}

/// Per-query row of the evaluation report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvalRow {
    pub query: String,
    pub relevant: Vec<String>,
    /// `"name (similarity)"` entries in rank order.
    pub retrieved: Vec<String>,
    pub recall: f64,
    pub average_precision: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total_cases: usize,
    pub k: usize,
    pub mean_recall: f64,
    pub mean_average_precision: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvalReport {
    pub generated_at: DateTime<Utc>,
    pub summary: EvalSummary,
    pub rows: Vec<EvalRow>,
}
