//! DRL compliance comparison
//!
//! Exam records are grouped and summarised by [`DoseAggregator`], each group's
//! label is resolved by [`ProtocolMatcher`], [`DrlSelector`] picks the
//! applicable reference value and [`ComplianceClassifier`] rates the mean
//! dose against it. [`DrlComparison`] runs the whole chain.

mod aggregate;
mod classify;
mod matcher;
mod selector;

pub use aggregate::{DoseAggregator, DoseGroup, GroupKey};
pub use classify::{Classification, ComplianceClassifier, ACCEPTABLE_LIMIT, OPTIMAL_LIMIT};
pub use matcher::{MatchedProtocol, ProtocolMatcher};
pub use selector::{DrlSelector, ReferenceBasis, ReferenceSelection, SelectionContext};

use crate::config::ProtocolStore;
use crate::types::{ComparisonResult, ComplianceStatus, ExamRecord, Modality};
use log::{debug, info};

/// Outcome of one comparison run
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ComplianceReport {
    pub modality: Modality,

    /// Aggregated statistics of every group, matched or not
    pub groups: Vec<DoseGroup>,

    /// One entry per group that could be compared
    pub results: Vec<ComparisonResult>,

    /// Group labels no configured protocol recognised
    pub unmatched: Vec<String>,
}

impl ComplianceReport {
    /// Number of results with the given status
    pub fn count(&self, status: ComplianceStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Compares exam records of one modality with the configured DRLs
///
/// # Example
///
/// ```
/// use drlcheck_core::{
///     ComplianceStatus, CtProtocol, CtReference, DoseMetrics, DrlComparison, ExamRecord,
///     Modality, OrderedMap, Protocol, ProtocolStore, StoreConfig,
/// };
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = ProtocolStore::new(StoreConfig::default().with_config_dir(dir.path()));
/// store.add(Modality::Ct, "Head", Protocol::Ct(CtProtocol {
///     match_patterns: vec!["head".to_string()],
///     adult: CtReference { dlp: 1000.0, ctdi_vol: 60.0 },
///     child: OrderedMap::new(),
/// })).unwrap();
///
/// let records = vec![ExamRecord::new(Modality::Ct, "HEAD ROUTINE")
///     .with_doses(DoseMetrics { dlp: Some(800.0), ..Default::default() })];
///
/// let report = DrlComparison::new(&store, Modality::Ct).run(&records);
/// assert_eq!(report.results.len(), 1);
/// assert_eq!(report.results[0].status, ComplianceStatus::Optimal);
/// assert_eq!(report.results[0].percentage, 80.0);
/// ```
pub struct DrlComparison<'a> {
    store: &'a ProtocolStore,
    modality: Modality,
}

impl<'a> DrlComparison<'a> {
    pub fn new(store: &'a ProtocolStore, modality: Modality) -> Self {
        Self { store, modality }
    }

    /// Aggregates `records` and compares every group that can be compared
    ///
    /// Groups without a matching protocol, without any compared dose, or
    /// (mammography) outside every thickness band produce no result.
    pub fn run(&self, records: &[ExamRecord]) -> ComplianceReport {
        let groups = DoseAggregator::new(self.modality).aggregate(records);
        let matcher = self.store.matcher(self.modality);

        let mut results = Vec::new();
        let mut unmatched = Vec::new();

        for group in &groups {
            let Some(matched) = matcher.find(&group.key.protocol) else {
                unmatched.push(group.key.to_string());
                continue;
            };

            let Some(measured) = group.mean_dose else {
                debug!(
                    "Group '{}' has no {} values to compare",
                    group.key,
                    self.modality.compared_quantity()
                );
                continue;
            };

            let Some(reference) = DrlSelector::select(self.modality, group, matched.protocol)
            else {
                continue;
            };

            let classification = ComplianceClassifier::classify(measured, reference.value);
            results.push(ComparisonResult {
                protocol: group.key.to_string(),
                matched_protocol: matched.name.to_string(),
                device_model: group.device_model.clone(),
                average_value: measured,
                reference_value: reference.value,
                reference_basis: reference.basis.to_string(),
                percentage: classification.percentage,
                deviation: classification.deviation,
                status: classification.status,
                color: classification.status.color(),
            });
        }

        info!(
            "Compared {} of {} {} groups",
            results.len(),
            groups.len(),
            self.modality
        );

        ComplianceReport {
            modality: self.modality,
            groups,
            results,
            unmatched,
        }
    }
}
