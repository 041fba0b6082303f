use crate::types::{ExamRecord, Modality};
use log::debug;
use std::cmp::Ordering;
use std::fmt;

/// Grouping key: protocol label, plus thickness for mammography
///
/// Displays as `<label> (<thickness>mm)` for mammography, with the thickness
/// in shortest decimal form (`45mm`, `52.5mm`).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GroupKey {
    pub protocol: String,
    pub thickness: Option<f64>,
}

impl GroupKey {
    fn cmp_key(&self, other: &Self) -> Ordering {
        self.protocol.cmp(&other.protocol).then_with(|| {
            match (self.thickness, other.thickness) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            }
        })
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.thickness {
            Some(thickness) => write!(f, "{} ({}mm)", self.protocol, thickness),
            None => write!(f, "{}", self.protocol),
        }
    }
}

/// Summary statistics of one exam group
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DoseGroup {
    pub key: GroupKey,

    pub record_count: usize,

    /// Mean of the compared dose (DLP, DAP or AGD), rounded to 2 decimals
    pub mean_dose: Option<f64>,

    /// Mean of the secondary dose (CTDIvol or entrance dose)
    pub mean_secondary_dose: Option<f64>,

    /// First non-blank device model in the group
    pub device_model: Option<String>,

    /// Ages of the pediatric members, in record order
    pub pediatric_ages: Vec<u32>,
}

impl DoseGroup {
    pub fn has_pediatric_members(&self) -> bool {
        !self.pediatric_ages.is_empty()
    }
}

/// Groups exam records by protocol label and summarises each group
///
/// Missing dose values only drop that value from its mean; the record still
/// belongs to the group. Records without a protocol label, and mammography
/// records without a thickness, cannot be grouped and are skipped.
///
/// # Example
///
/// ```
/// use drlcheck_core::{DoseAggregator, DoseMetrics, ExamRecord, Modality};
///
/// let head = |dlp: f64| {
///     ExamRecord::new(Modality::Ct, "HEAD").with_doses(DoseMetrics {
///         dlp: Some(dlp),
///         ..Default::default()
///     })
/// };
/// let records = vec![head(900.0), head(1000.0), ExamRecord::new(Modality::Ct, "HEAD")];
///
/// let groups = DoseAggregator::new(Modality::Ct).aggregate(&records);
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].record_count, 3);
/// assert_eq!(groups[0].mean_dose, Some(950.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DoseAggregator {
    modality: Modality,
}

impl DoseAggregator {
    pub fn new(modality: Modality) -> Self {
        Self { modality }
    }

    /// Groups and summarises `records`, ordered by label then thickness
    pub fn aggregate(&self, records: &[ExamRecord]) -> Vec<DoseGroup> {
        let mut buckets: Vec<(GroupKey, Vec<&ExamRecord>)> = Vec::new();

        for record in records {
            if record.modality != self.modality {
                debug!(
                    "Skipping {} record in {} aggregation",
                    record.modality, self.modality
                );
                continue;
            }
            let Some(key) = self.group_key(record) else {
                continue;
            };

            match buckets.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(record),
                None => buckets.push((key, vec![record])),
            }
        }

        buckets.sort_by(|(a, _), (b, _)| a.cmp_key(b));

        buckets
            .into_iter()
            .map(|(key, members)| self.summarise(key, &members))
            .collect()
    }

    fn group_key(&self, record: &ExamRecord) -> Option<GroupKey> {
        // Labels group as recorded; only blank ones are dropped
        let protocol = match record.protocol.as_deref() {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ => {
                debug!("Skipping record without protocol label");
                return None;
            }
        };

        let thickness = if self.modality.groups_by_thickness() {
            match record.body_part_thickness {
                Some(thickness) => Some(thickness),
                None => {
                    debug!("Skipping '{}' record without thickness", protocol);
                    return None;
                }
            }
        } else {
            None
        };

        Some(GroupKey {
            protocol,
            thickness,
        })
    }

    fn summarise(&self, key: GroupKey, members: &[&ExamRecord]) -> DoseGroup {
        let modality = self.modality;

        DoseGroup {
            record_count: members.len(),
            mean_dose: mean(members.iter().filter_map(|r| r.compared_dose(modality))),
            mean_secondary_dose: mean(members.iter().filter_map(|r| r.secondary_dose(modality))),
            device_model: members
                .iter()
                .filter_map(|r| r.device_model.as_deref())
                .map(str::trim)
                .find(|m| !m.is_empty())
                .map(String::from),
            pediatric_ages: members
                .iter()
                .filter(|r| r.is_pediatric())
                .filter_map(|r| r.patient_age)
                .collect(),
            key,
        }
    }
}

/// Arithmetic mean rounded to 2 decimals; `None` for no values
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(round2(sum / count as f64))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
