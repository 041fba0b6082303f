use crate::types::ComplianceStatus;

/// Highest percentage of the reference still rated optimal
pub const OPTIMAL_LIMIT: f64 = 85.0;

/// Highest percentage of the reference still rated acceptable
pub const ACCEPTABLE_LIMIT: f64 = 100.0;

/// Measured dose relative to its reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Measured value as percent of the reference
    pub percentage: f64,
    /// `percentage - 100`
    pub deviation: f64,
    pub status: ComplianceStatus,
}

/// Rates a measured dose against a reference level
pub struct ComplianceClassifier;

impl ComplianceClassifier {
    /// Classifies `measured` against `reference`
    ///
    /// Band edges are inclusive from below: exactly 85% is optimal and
    /// exactly 100% is acceptable.
    ///
    /// # Example
    ///
    /// ```
    /// use drlcheck_core::{ComplianceClassifier, ComplianceStatus};
    ///
    /// let c = ComplianceClassifier::classify(120.0, 100.0);
    /// assert_eq!(c.status, ComplianceStatus::Exceeded);
    /// assert_eq!(c.deviation, 20.0);
    /// ```
    pub fn classify(measured: f64, reference: f64) -> Classification {
        let percentage = measured * 100.0 / reference;

        let status = if percentage <= OPTIMAL_LIMIT {
            ComplianceStatus::Optimal
        } else if percentage <= ACCEPTABLE_LIMIT {
            ComplianceStatus::Acceptable
        } else {
            ComplianceStatus::Exceeded
        };

        Classification {
            percentage,
            deviation: percentage - 100.0,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(85.0, 100.0, ComplianceStatus::Optimal)]
    #[case(85.01, 100.0, ComplianceStatus::Acceptable)]
    #[case(100.0, 100.0, ComplianceStatus::Acceptable)]
    #[case(100.01, 100.0, ComplianceStatus::Exceeded)]
    #[case(10.0, 100.0, ComplianceStatus::Optimal)]
    #[case(170.0, 200.0, ComplianceStatus::Optimal)]
    #[case(0.9, 1.0, ComplianceStatus::Acceptable)]
    fn test_classify_boundaries(
        #[case] measured: f64,
        #[case] reference: f64,
        #[case] expected: ComplianceStatus,
    ) {
        assert_eq!(ComplianceClassifier::classify(measured, reference).status, expected);
    }

    #[test]
    fn test_percentage_and_deviation() {
        let c = ComplianceClassifier::classify(50.0, 200.0);
        assert_eq!(c.percentage, 25.0);
        assert_eq!(c.deviation, -75.0);
    }
}
