use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::assessment::{AssessmentRecord, Category, DurationField, TestTypeField};
use crate::processing::ProcessingResult;
use crate::repository::{RecordReader, RecordWriter};

static DURATION_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{1,3})").unwrap());

/// Outcome of a cleaning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Records that ended up with a duration or at least one category.
    pub cleaned: usize,
    pub total: usize,
}

/// Extract the first run of one to three digits from a duration label and
/// interpret it as minutes.
///
/// Labels without digits (`"N/A"`, `"Untimed"`) yield `None`.
pub fn extract_duration(raw: &str) -> Option<u32> {
    let lowered = raw.to_lowercase();
    DURATION_DIGITS
        .captures(&lowered)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Map a free-text test type label onto the canonical categories whose
/// keywords it contains.
pub fn map_test_types(raw: &str) -> BTreeSet<Category> {
    let lowered = raw.to_lowercase();
    Category::ALL
        .into_iter()
        .filter(|category| {
            category
                .keywords()
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .collect()
}

/// Normalize a record's duration and test type in place.
///
/// A free-text test type is preserved under `Original Test Type` before being
/// replaced by canonical tags. Returns `true` when the record carries a
/// duration or at least one category afterwards.
pub fn clean_record(record: &mut AssessmentRecord) -> bool {
    let minutes = record.duration.as_ref().and_then(DurationField::minutes);
    record.duration = minutes.map(DurationField::Minutes);

    if let Some(TestTypeField::Text(text)) = &record.test_type
        && record.original_test_type.is_none()
    {
        record.original_test_type = Some(text.clone());
    }

    let categories = record
        .test_type
        .as_ref()
        .map(TestTypeField::categories)
        .unwrap_or_default();
    record.test_type = Some(TestTypeField::Tags(
        categories.iter().map(ToString::to_string).collect(),
    ));

    minutes.is_some() || !categories.is_empty()
}

pub fn clean_records(records: &mut [AssessmentRecord]) -> CleanStats {
    let cleaned = records
        .iter_mut()
        .map(clean_record)
        .filter(|&has_value| has_value)
        .count();

    CleanStats {
        cleaned,
        total: records.len(),
    }
}

/// Load the raw scraped metadata, clean it and persist the cleaned snapshot.
pub fn process_clean_message<R>(repo: &R) -> ProcessingResult<CleanStats>
where
    R: RecordReader + RecordWriter,
{
    log::info!("Cleaning scraped assessment metadata");

    let mut records = repo.list_raw_records()?;
    let stats = clean_records(&mut records);
    repo.save_cleaned_records(&records)?;

    log::info!(
        "Finished cleaning metadata: cleaned={}, total={}",
        stats.cleaned,
        stats.total
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_duration_takes_first_digit_run() {
        assert_eq!(
            extract_duration("Approximate Completion Time in minutes = 30"),
            Some(30)
        );
        assert_eq!(extract_duration("max 45 min, typically 20"), Some(45));
        assert_eq!(extract_duration("1234 minutes"), Some(123));
    }

    #[test]
    fn extract_duration_returns_none_without_digits() {
        assert_eq!(extract_duration("N/A"), None);
        assert_eq!(extract_duration(""), None);
        assert_eq!(extract_duration("Untimed"), None);
    }

    #[test]
    fn extract_duration_never_panics_on_odd_input() {
        let inputs = [
            "\u{0661}\u{0662} minutes",
            "-15",
            "   ",
            "🕒 30",
            "0",
            "999999999999",
        ];
        for input in inputs {
            let _ = extract_duration(input);
        }
        assert_eq!(extract_duration("-15"), Some(15));
        assert_eq!(extract_duration("0"), Some(0));
    }

    #[test]
    fn extract_duration_skips_non_ascii_digits() {
        assert_eq!(extract_duration("\u{0663} parts, 30 minutes"), Some(30));
        assert_eq!(extract_duration("\u{0661}\u{0662} minutes"), None);
    }

    #[test]
    fn map_test_types_matches_keywords() {
        let categories = map_test_types("Ability & Aptitude, Personality & Behavior");

        assert_eq!(
            categories.into_iter().collect::<Vec<_>>(),
            vec![Category::Cognitive, Category::Personality]
        );
    }

    #[test]
    fn map_test_types_is_sorted_and_unique() {
        let categories = map_test_types(
            "Simulations, Knowledge & Skills, Biodata & Situational Judgement, Competencies, Behaviour",
        );
        let as_vec: Vec<Category> = categories.iter().copied().collect();

        let mut sorted = as_vec.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(as_vec, sorted);
        assert_eq!(
            as_vec,
            vec![
                Category::Behavioral,
                Category::Personality,
                Category::Simulation,
                Category::Situational,
                Category::Technical,
            ]
        );
    }

    #[test]
    fn map_test_types_returns_empty_for_unknown_labels() {
        assert!(map_test_types("N/A").is_empty());
        assert!(map_test_types("Development & 360").is_empty());
    }

    #[test]
    fn clean_record_rewrites_fields_in_place() {
        let mut record = AssessmentRecord {
            name: Some("Verify - Numerical Ability".to_string()),
            duration: Some(DurationField::Text("Approximate Completion Time in minutes = 17".to_string())),
            test_type: Some(TestTypeField::Text("Ability & Aptitude".to_string())),
            ..Default::default()
        };

        assert!(clean_record(&mut record));
        assert_eq!(record.duration, Some(DurationField::Minutes(17)));
        assert_eq!(
            record.test_type,
            Some(TestTypeField::Tags(vec!["cognitive".to_string()]))
        );
        assert_eq!(
            record.original_test_type.as_deref(),
            Some("Ability & Aptitude")
        );
    }

    #[test]
    fn clean_record_is_idempotent() {
        let mut record = AssessmentRecord {
            name: Some("Java 8 (New)".to_string()),
            duration: Some(DurationField::Text("18 minutes".to_string())),
            test_type: Some(TestTypeField::Text("Knowledge & Skills, Simulations".to_string())),
            ..Default::default()
        };
        clean_record(&mut record);
        let once = record.clone();

        clean_record(&mut record);

        assert_eq!(record, once);
    }

    #[test]
    fn clean_record_drops_unknown_tags() {
        let mut record = AssessmentRecord {
            test_type: Some(TestTypeField::Tags(vec![
                "technical".to_string(),
                "language".to_string(),
            ])),
            ..Default::default()
        };

        clean_record(&mut record);

        assert_eq!(
            record.test_type,
            Some(TestTypeField::Tags(vec!["technical".to_string()]))
        );
    }

    #[test]
    fn clean_records_counts_records_with_values() {
        let mut records = vec![
            AssessmentRecord {
                duration: Some(DurationField::Text("30".to_string())),
                ..Default::default()
            },
            AssessmentRecord {
                test_type: Some(TestTypeField::Text("Personality & Behavior".to_string())),
                ..Default::default()
            },
            AssessmentRecord {
                duration: Some(DurationField::Text("N/A".to_string())),
                test_type: Some(TestTypeField::Text("N/A".to_string())),
                ..Default::default()
            },
        ];

        let stats = clean_records(&mut records);

        assert_eq!(stats, CleanStats { cleaned: 2, total: 3 });
        assert_eq!(records[2].duration, None);
    }
}
