use std::fmt;
use std::str::FromStr;

/// Imaging modality with its own DRL schema
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Computed tomography
    Ct,
    /// X-ray angiography
    Xa,
    /// Digital radiography
    Dx,
    /// Mammography
    Mg,
}

/// All supported modalities, in configuration-file order
pub const ALL_MODALITIES: [Modality; 4] = [Modality::Ct, Modality::Xa, Modality::Mg, Modality::Dx];

impl Modality {
    /// Returns the DICOM modality code
    pub fn code(&self) -> &'static str {
        match self {
            Modality::Ct => "CT",
            Modality::Xa => "XA",
            Modality::Dx => "DX",
            Modality::Mg => "MG",
        }
    }

    /// Returns a human-readable name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Modality::Ct => "Computed Tomography",
            Modality::Xa => "X-ray Angiography",
            Modality::Dx => "Digital Radiography",
            Modality::Mg => "Mammography",
        }
    }

    /// Default persisted configuration file name
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Modality::Ct => "ct_drl_config.json",
            Modality::Xa => "xa_drl_config.json",
            Modality::Dx => "dx_drl_config.json",
            Modality::Mg => "mg_drl_config.json",
        }
    }

    /// Name of the dose quantity compared against the reference level
    pub fn compared_quantity(&self) -> &'static str {
        match self {
            Modality::Ct => "DLP",
            Modality::Xa | Modality::Dx => "DAP",
            Modality::Mg => "AGD",
        }
    }

    /// Whether exam groups are additionally split by body-part thickness
    pub fn groups_by_thickness(&self) -> bool {
        matches!(self, Modality::Mg)
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CT" => Ok(Modality::Ct),
            "XA" => Ok(Modality::Xa),
            "DX" => Ok(Modality::Dx),
            "MG" => Ok(Modality::Mg),
            other => Err(format!("Unsupported modality '{}'", other)),
        }
    }
}
