use crate::types::ExamRecord;
use chrono::NaiveDate;

/// Accepted study and birth date layouts
const DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%Y-%m-%d"];

/// Parses a `YYYYMMDD` or `YYYY-MM-DD` date
///
/// # Example
///
/// ```
/// use drlcheck_core::ingest::parse_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
/// assert_eq!(parse_date("20240305"), expected);
/// assert_eq!(parse_date("2024-03-05"), expected);
/// assert_eq!(parse_date("05.03.2024"), None);
/// ```
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Inclusive study date window
///
/// An unbounded range keeps every record. Once either bound is set, records
/// without a study date are excluded.
///
/// # Example
///
/// ```
/// use drlcheck_core::ingest::StudyDateRange;
/// use chrono::NaiveDate;
///
/// let range = StudyDateRange::default()
///     .with_from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
///
/// assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 1)));
/// assert!(!range.contains(NaiveDate::from_ymd_opt(2023, 12, 31)));
/// assert!(!range.contains(None));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudyDateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl StudyDateRange {
    /// Builder: Set the earliest study date kept
    pub fn with_from(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    /// Builder: Set the latest study date kept
    pub fn with_to(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Keeps the records whose study date falls inside the range
    pub fn filter(&self, records: Vec<ExamRecord>) -> Vec<ExamRecord> {
        if self.is_unbounded() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| self.contains(r.study_date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Modality;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_rejects_invalid_calendar_dates() {
        assert_eq!(parse_date(" 20240229 "), Some(date(2024, 2, 29)));
        assert_eq!(parse_date("20230229"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let range = StudyDateRange::default()
            .with_from(date(2024, 1, 1))
            .with_to(date(2024, 1, 31));

        assert!(range.contains(Some(date(2024, 1, 1))));
        assert!(range.contains(Some(date(2024, 1, 31))));
        assert!(!range.contains(Some(date(2024, 2, 1))));
    }

    #[test]
    fn test_filter_drops_undated_records_only_when_bounded() {
        let records = vec![
            ExamRecord::new(Modality::Ct, "A").with_study_date(date(2024, 5, 1)),
            ExamRecord::new(Modality::Ct, "B"),
        ];

        assert_eq!(StudyDateRange::default().filter(records.clone()).len(), 2);

        let kept = StudyDateRange::default()
            .with_to(date(2024, 12, 31))
            .filter(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].protocol.as_deref(), Some("A"));
    }
}
