use std::fmt;

/// Compliance of a measured dose relative to its reference level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    /// At most 85% of the reference
    Optimal,
    /// Above 85% and at most 100% of the reference
    Acceptable,
    /// Above the reference
    Exceeded,
}

impl ComplianceStatus {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            ComplianceStatus::Optimal => "Optimal",
            ComplianceStatus::Acceptable => "Acceptable",
            ComplianceStatus::Exceeded => "Exceeded",
        }
    }

    /// Display color for report rendering
    pub fn color(&self) -> StatusColor {
        match self {
            ComplianceStatus::Optimal => StatusColor::LightGreen,
            ComplianceStatus::Acceptable => StatusColor::Gold,
            ComplianceStatus::Exceeded => StatusColor::LightRed,
        }
    }

    /// Legend line describing the band
    pub fn legend(&self) -> &'static str {
        match self {
            ComplianceStatus::Optimal => "Optimal: <= 85% of DRL",
            ComplianceStatus::Acceptable => "Acceptable: 85-100% of DRL",
            ComplianceStatus::Exceeded => "Exceeded: > 100% of DRL",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Display color tag attached to a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusColor {
    LightGreen,
    Gold,
    LightRed,
}

impl StatusColor {
    /// Hex color code used by report renderers
    pub fn hex(&self) -> &'static str {
        match self {
            StatusColor::LightGreen => "#90EE90",
            StatusColor::Gold => "#FFD700",
            StatusColor::LightRed => "#FFB6C6",
        }
    }
}

/// Outcome of comparing one exam group against its reference level
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ComparisonResult {
    /// Device-reported protocol label; MG labels carry the thickness
    pub protocol: String,

    /// Name of the configured protocol the label matched
    pub matched_protocol: String,

    pub device_model: Option<String>,

    /// Mean measured dose of the group
    pub average_value: f64,

    /// Reference value the mean was compared against
    pub reference_value: f64,

    /// Which part of the protocol supplied the reference (adult, band, ...)
    pub reference_basis: String,

    /// Measured value as percent of the reference
    pub percentage: f64,

    /// `percentage - 100`
    pub deviation: f64,

    pub status: ComplianceStatus,

    pub color: StatusColor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_colors() {
        assert_eq!(ComplianceStatus::Optimal.color().hex(), "#90EE90");
        assert_eq!(ComplianceStatus::Acceptable.color().hex(), "#FFD700");
        assert_eq!(ComplianceStatus::Exceeded.color().hex(), "#FFB6C6");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ComplianceStatus::Exceeded).unwrap();
        assert_eq!(json, "\"exceeded\"");
        let json = serde_json::to_string(&StatusColor::LightGreen).unwrap();
        assert_eq!(json, "\"light-green\"");
    }
}
