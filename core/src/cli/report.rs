use crate::compliance::ComplianceReport;
use crate::types::ComplianceStatus;
use std::fmt;

const STATUSES: [ComplianceStatus; 3] = [
    ComplianceStatus::Optimal,
    ComplianceStatus::Acceptable,
    ComplianceStatus::Exceeded,
];

/// Text report formatter for a compliance run
pub struct TextReport<'a> {
    report: &'a ComplianceReport,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(report: &'a ComplianceReport) -> Self {
        Self { report }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modality = self.report.modality;
        let title = format!("DRL Compliance: {}", modality.display_name());
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f)?;
        writeln!(f, "Groups:         {}", self.report.groups.len())?;
        writeln!(f, "Compared:       {}", self.report.results.len())?;
        writeln!(f)?;

        if self.report.results.is_empty() {
            writeln!(f, "No groups could be compared.")?;
        } else {
            let quantity = modality.compared_quantity();
            writeln!(
                f,
                "{:<32} {:<20} {:<20} {:>10} {:>10} {:>8} {:>9}  {}",
                "Protocol", "DRL Protocol", "Device", quantity, "DRL", "%", "Deviation", "Status"
            )?;
            writeln!(f, "{}", "-".repeat(124))?;

            for result in &self.report.results {
                writeln!(
                    f,
                    "{:<32} {:<20} {:<20} {:>10.2} {:>10.2} {:>7.1}% {:>+8.1}%  {} ({})",
                    result.protocol,
                    result.matched_protocol,
                    result.device_model.as_deref().unwrap_or("unknown"),
                    result.average_value,
                    result.reference_value,
                    result.percentage,
                    result.deviation,
                    result.status.simple_name(),
                    result.reference_basis,
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Summary")?;
        writeln!(f, "-------")?;
        for status in STATUSES {
            writeln!(
                f,
                "{:<15} {}",
                format!("{}:", status.simple_name()),
                self.report.count(status)
            )?;
        }

        if !self.report.unmatched.is_empty() {
            writeln!(f)?;
            writeln!(f, "Unmatched protocols")?;
            writeln!(f, "-------------------")?;
            for label in &self.report.unmatched {
                writeln!(f, "  {}", label)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Legend")?;
        writeln!(f, "------")?;
        for status in STATUSES {
            writeln!(f, "  {}", status.legend())?;
        }

        Ok(())
    }
}
