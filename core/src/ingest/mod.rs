//! Exam-record input
//!
//! Records arrive as CSV (one header row) or as a JSON array of objects
//! using the field names in [`RECORD_FIELDS`]. Each row goes through one
//! validation pass into an [`ExamRecord`](crate::types::ExamRecord);
//! anything that does not parse becomes an absent value.

mod dates;
mod row;

pub use dates::{parse_date, StudyDateRange};
pub use row::{RawExamRow, RECORD_FIELDS};

use crate::error::{DrlError, Result};
use crate::types::{ExamRecord, Modality};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Reads the `modality` records of a `.csv` or `.json` file
///
/// Rows of other modalities are left out.
pub fn read_records(path: &Path, modality: Modality) -> Result<Vec<ExamRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let file = File::open(path)?;
    let records = match extension.as_deref() {
        Some("csv") => read_records_csv(file, modality)?,
        Some("json") => read_records_json(file, modality)?,
        _ => {
            return Err(DrlError::RecordParse(format!(
                "Unsupported exam record file {} (expected .csv or .json)",
                path.display()
            )))
        }
    };

    info!(
        "Read {} {} records from {}",
        records.len(),
        modality,
        path.display()
    );
    Ok(records)
}

/// Reads exam records from CSV with a header row
///
/// Header names are matched case-insensitively; unknown columns are ignored.
pub fn read_records_csv<R: io::Read>(reader: R, modality: Modality) -> Result<Vec<ExamRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let index: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
        .collect();

    for field in RECORD_FIELDS {
        if !index.contains_key(field) {
            debug!("Exam record CSV has no '{}' column", field);
        }
    }

    let mut records = Vec::new();
    for (offset, result) in reader.records().enumerate() {
        let row = result?;
        let raw = RawExamRow::from_lookup(|name| {
            index
                .get(name)
                .and_then(|&i| row.get(i))
                .map(String::from)
        });
        // header is line 1
        if let Some(record) = raw.into_record(modality, offset + 2) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Reads exam records from a JSON array of objects
///
/// Values may be strings or numbers; `null` means absent.
pub fn read_records_json<R: io::Read>(reader: R, modality: Modality) -> Result<Vec<ExamRecord>> {
    let document: Value = serde_json::from_reader(reader)
        .map_err(|e| DrlError::RecordParse(format!("Invalid exam record JSON: {}", e)))?;
    let Value::Array(items) = document else {
        return Err(DrlError::RecordParse(
            "Expected a JSON array of exam records".to_string(),
        ));
    };

    let mut records = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(DrlError::RecordParse(format!(
                "Exam record {} is not a JSON object",
                i + 1
            )));
        };

        let fields: HashMap<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        let raw = RawExamRow::from_lookup(|name| fields.get(name).and_then(json_text));
        if let Some(record) = raw.into_record(modality, i + 1) {
            records.push(record);
        }
    }

    Ok(records)
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
