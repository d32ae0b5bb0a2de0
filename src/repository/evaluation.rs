use crate::domain::evaluation::{EvalCase, EvalReport};
use crate::repository::errors::RepositoryResult;
use crate::repository::{EvalSetReader, FileRepository, ReportWriter, read_json, write_json};

impl EvalSetReader for FileRepository {
    fn list_eval_cases(&self) -> RepositoryResult<Vec<EvalCase>> {
        read_json(&self.paths.eval_set)
    }
}

impl ReportWriter for FileRepository {
    fn save_eval_report(&self, report: &EvalReport) -> RepositoryResult<()> {
        write_json(&self.paths.eval_report, report)?;
        log::info!(
            "Detailed results exported to {}",
            self.paths.eval_report.display()
        );
        Ok(())
    }
}
