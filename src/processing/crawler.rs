use crate::crawlers::CatalogCrawler;
use crate::processing::ProcessingResult;
use crate::repository::RecordWriter;

/// Crawls the full catalog and replaces the raw metadata snapshot.
///
/// Individual detail pages never abort the crawl; they come back as
/// placeholder records instead.
pub async fn process_crawler_message<C, R>(crawler: &C, repo: &R) -> ProcessingResult<usize>
where
    C: CatalogCrawler + ?Sized,
    R: RecordWriter,
{
    log::info!("Starting catalog crawl");

    let records = crawler.get_assessments().await;
    let saved = repo.save_raw_records(&records)?;

    log::info!("Finished catalog crawl: assessments={saved}");

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::process_crawler_message;
    use crate::crawlers::CatalogCrawler;
    use crate::domain::assessment::AssessmentRecord;
    use crate::repository::RecordWriter;
    use crate::repository::errors::RepositoryResult;

    struct FixedCrawler;

    #[async_trait]
    impl CatalogCrawler for FixedCrawler {
        async fn get_assessments(&self) -> Vec<AssessmentRecord> {
            vec![
                self.get_assessment("Java 8 (New)", "https://a").await,
                self.get_assessment("OPQ32r", "https://b").await,
            ]
        }

        async fn get_assessment(&self, name: &str, url: &str) -> AssessmentRecord {
            AssessmentRecord {
                name: Some(name.to_string()),
                url: Some(url.to_string()),
                ..Default::default()
            }
        }
    }

    #[derive(Default)]
    struct MemoryWriter {
        raw: Mutex<Vec<AssessmentRecord>>,
    }

    impl RecordWriter for MemoryWriter {
        fn save_raw_records(&self, records: &[AssessmentRecord]) -> RepositoryResult<usize> {
            let mut raw = self.raw.lock().expect("raw mutex poisoned");
            *raw = records.to_vec();
            Ok(records.len())
        }

        fn save_cleaned_records(&self, _records: &[AssessmentRecord]) -> RepositoryResult<usize> {
            unreachable!("crawl never writes cleaned records")
        }
    }

    #[tokio::test]
    async fn crawl_replaces_raw_snapshot() {
        let repo = MemoryWriter::default();

        let saved = process_crawler_message(&FixedCrawler, &repo)
            .await
            .expect("crawl succeeds");

        assert_eq!(saved, 2);
        let raw = repo.raw.lock().expect("raw mutex poisoned");
        assert_eq!(raw[1].name.as_deref(), Some("OPQ32r"));
    }
}
