pub mod crawlers;
pub mod domain;
pub mod models;
pub mod processing;
pub mod repository;

/// Neighbors fetched per requested result, leaving room for post-filtering.
pub const OVERFETCH_FACTOR: usize = 5;

/// Instruction paired with every text sent to the embedding model.
pub const EMBEDDING_INSTRUCTION: &str =
    "Represent the task: retrieve relevant assessments based on this job description";
