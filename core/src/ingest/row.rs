use crate::ingest::dates::parse_date;
use crate::types::{age_in_years, DoseMetrics, ExamRecord, Modality};
use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

/// Field names recognised in exam-record input
pub const RECORD_FIELDS: [&str; 12] = [
    "modality",
    "protocol",
    "device_model",
    "patient_age",
    "birth_date",
    "study_date",
    "body_part_thickness",
    "dlp",
    "ctdi_vol",
    "dap",
    "entrance_dose",
    "agd",
];

/// Modality code of a dose structured report
const STRUCTURED_REPORT: &str = "SR";

/// One exam-record row before validation; every field is raw text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExamRow {
    pub modality: Option<String>,
    pub protocol: Option<String>,
    pub device_model: Option<String>,
    pub patient_age: Option<String>,
    pub birth_date: Option<String>,
    pub study_date: Option<String>,
    pub body_part_thickness: Option<String>,
    pub dlp: Option<String>,
    pub ctdi_vol: Option<String>,
    pub dap: Option<String>,
    pub entrance_dose: Option<String>,
    pub agd: Option<String>,
}

impl RawExamRow {
    /// Builds a row by looking up each field name
    ///
    /// Blank values are stored as absent.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut field = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            modality: field("modality"),
            protocol: field("protocol"),
            device_model: field("device_model"),
            patient_age: field("patient_age"),
            birth_date: field("birth_date"),
            study_date: field("study_date"),
            body_part_thickness: field("body_part_thickness"),
            dlp: field("dlp"),
            ctdi_vol: field("ctdi_vol"),
            dap: field("dap"),
            entrance_dose: field("entrance_dose"),
            agd: field("agd"),
        }
    }

    /// Validates the row into a typed record for `modality`
    ///
    /// Returns `None` when the row belongs to another modality. A structured
    /// report (`SR`) or a blank modality counts as `modality`. Values that do
    /// not parse become absent.
    pub fn into_record(self, modality: Modality, row: usize) -> Option<ExamRecord> {
        if !accepts_modality(self.modality.as_deref(), modality) {
            debug!(
                "Row {}: skipping {} record in {} run",
                row,
                self.modality.as_deref().unwrap_or_default(),
                modality
            );
            return None;
        }

        let study_date = date_field(&self.study_date, row, "study_date");
        let birth_date = date_field(&self.birth_date, row, "birth_date");
        let patient_age = self
            .patient_age
            .as_deref()
            .and_then(|value| {
                let age = parse_age(value);
                if age.is_none() {
                    debug!("Row {}: ignoring patient_age '{}'", row, value);
                }
                age
            })
            .or_else(|| match (birth_date, study_date) {
                (Some(birth), Some(study)) => age_in_years(birth, study),
                _ => None,
            });

        Some(ExamRecord {
            modality,
            protocol: self.protocol,
            device_model: self.device_model,
            patient_age,
            body_part_thickness: number_field(
                &self.body_part_thickness,
                row,
                "body_part_thickness",
            ),
            study_date,
            doses: DoseMetrics {
                dlp: number_field(&self.dlp, row, "dlp"),
                ctdi_vol: number_field(&self.ctdi_vol, row, "ctdi_vol"),
                dap: number_field(&self.dap, row, "dap"),
                entrance_dose: number_field(&self.entrance_dose, row, "entrance_dose"),
                agd: number_field(&self.agd, row, "agd"),
            },
        })
    }
}

fn accepts_modality(value: Option<&str>, modality: Modality) -> bool {
    match value {
        None => true,
        Some(code) if code.eq_ignore_ascii_case(STRUCTURED_REPORT) => true,
        Some(code) => code.parse::<Modality>().map_or(false, |m| m == modality),
    }
}

fn number_field(value: &Option<String>, row: usize, column: &str) -> Option<f64> {
    let value = value.as_deref()?;
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Some(number),
        _ => {
            debug!("Row {}: ignoring {} '{}'", row, column, value);
            None
        }
    }
}

fn date_field(value: &Option<String>, row: usize, column: &str) -> Option<NaiveDate> {
    let value = value.as_deref()?;
    let date = parse_date(value);
    if date.is_none() {
        debug!("Row {}: ignoring {} '{}'", row, column, value);
    }
    date
}

static AGE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Parses a plain age in years or a DICOM age string (`045Y`, `006M`, `003W`, `010D`)
fn parse_age(value: &str) -> Option<u32> {
    let re = AGE_PATTERN.get_or_init(|| {
        Regex::new(r"^(?i)(\d+(?:\.\d+)?)\s*([DWMY])?$").expect("Failed to compile regex")
    });

    let caps = re.captures(value.trim())?;
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    let per_year = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        None => 1.0,
        Some(unit) => match unit.as_str() {
            "Y" => 1.0,
            "M" => 12.0,
            "W" => 52.0,
            _ => 365.0,
        },
    };

    let years = (amount / per_year).floor();
    if years.is_finite() && years <= f64::from(u32::MAX) {
        Some(years as u32)
    } else {
        None
    }
}
