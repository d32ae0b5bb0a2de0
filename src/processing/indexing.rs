use crate::domain::assessment::{Assessment, AssessmentRecord};
use crate::processing::ProcessingResult;
use crate::processing::embedding::{
    EmbeddingError, TextEncoder, assessment_embedding_prompt, build_index, encode_normalized,
};
use crate::repository::{CatalogWriter, RecordReader};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmbedStats {
    pub embedded: usize,
    pub skipped: usize,
}

/// Validate cleaned records and build their embedding prompts.
///
/// Records missing a name or URL are logged and left out; the returned
/// vectors are parallel.
pub fn prepare_documents(records: &[AssessmentRecord]) -> (Vec<Assessment>, Vec<String>) {
    records
        .iter()
        .filter_map(|record| match Assessment::try_from(record) {
            Ok(assessment) => {
                let prompt = assessment_embedding_prompt(&assessment);
                Some((assessment, prompt))
            }
            Err(error) => {
                log::warn!("Skipping record without required data ({error}): {record:?}");
                None
            }
        })
        .unzip()
}

/// Embed the cleaned catalog and rebuild every catalog artifact from scratch.
pub fn process_embed_message<R, E>(repo: &R, encoder: &mut E) -> ProcessingResult<EmbedStats>
where
    R: RecordReader + CatalogWriter,
    E: TextEncoder + ?Sized,
{
    log::info!("Loading cleaned assessment metadata");
    let records = repo.list_cleaned_records()?;
    log::info!("Loaded {} assessments", records.len());

    let (assessments, texts) = prepare_documents(&records);
    let stats = EmbedStats {
        embedded: assessments.len(),
        skipped: records.len() - assessments.len(),
    };
    if assessments.is_empty() {
        return Err(EmbeddingError::NoDocuments.into());
    }
    log::info!("Prepared {} valid texts", texts.len());

    let vectors = encode_normalized(encoder, &texts)?;
    log::info!("Generated {} embeddings", vectors.len());

    let index = build_index(&vectors)?;
    repo.save_catalog(&assessments, &texts, &vectors, &index)?;

    log::info!(
        "Finished embedding pipeline: embedded={}, skipped={}",
        stats.embedded,
        stats.skipped
    );

    Ok(stats)
}
