use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Inclusive numeric band written as `"min-max"`
///
/// Used for pediatric age bands (years) and mammography compressed
/// thickness bands (mm). Both ends are part of the band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclusiveRange {
    pub min: f64,
    pub max: f64,
}

impl InclusiveRange {
    /// Creates a new InclusiveRange
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Pattern matching a band key, usable inside larger column headers
    pub(crate) const PATTERN: &'static str = r"\d+(?:\.\d+)?\s*-\s*\d+(?:\.\d+)?";

    /// Parses a band key
    ///
    /// Accepts formats like:
    /// - "0-1"
    /// - "41-50"
    /// - "2.5 - 7.5"
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not `min-max` or if `min > max`
    pub fn parse(s: &str) -> Result<Self, String> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| {
            Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*-\s*(\d+(?:\.\d+)?)\s*$")
                .expect("Failed to compile regex")
        });

        let caps = re
            .captures(s)
            .ok_or_else(|| format!("Failed to parse range from '{}'", s))?;

        let min: f64 = caps[1]
            .parse()
            .map_err(|e| format!("Failed to parse range minimum: {}", e))?;
        let max: f64 = caps[2]
            .parse()
            .map_err(|e| format!("Failed to parse range maximum: {}", e))?;

        if min > max {
            return Err(format!("Range '{}' has minimum above maximum", s));
        }

        Ok(InclusiveRange { min, max })
    }

    /// Checks whether a value falls inside the band, ends included
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for InclusiveRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}
