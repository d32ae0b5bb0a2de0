use crate::domain::assessment::AssessmentRecord;
use crate::repository::errors::RepositoryResult;
use crate::repository::{FileRepository, RecordReader, RecordWriter, read_json, write_json};

impl RecordReader for FileRepository {
    fn list_raw_records(&self) -> RepositoryResult<Vec<AssessmentRecord>> {
        read_json(&self.paths.raw_metadata)
    }

    fn list_cleaned_records(&self) -> RepositoryResult<Vec<AssessmentRecord>> {
        read_json(&self.paths.cleaned_metadata)
    }
}

impl RecordWriter for FileRepository {
    fn save_raw_records(&self, records: &[AssessmentRecord]) -> RepositoryResult<usize> {
        write_json(&self.paths.raw_metadata, records)?;
        Ok(records.len())
    }

    fn save_cleaned_records(&self, records: &[AssessmentRecord]) -> RepositoryResult<usize> {
        write_json(&self.paths.cleaned_metadata, records)?;
        Ok(records.len())
    }
}
