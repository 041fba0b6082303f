use crate::error::{DrlError, Result};
use crate::types::{InclusiveRange, Modality, OrderedMap};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// CT reference pair (mGy·cm, mGy)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CtReference {
    #[serde(rename = "DLP")]
    pub dlp: f64,
    #[serde(rename = "CTDIvol")]
    pub ctdi_vol: f64,
}

/// CT protocol with adult reference and age-banded pediatric references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtProtocol {
    #[serde(rename = "protocol_match")]
    pub match_patterns: Vec<String>,
    pub adult: CtReference,
    /// Age band key (`"min-max"` years) to reference, scanned in order
    #[serde(default)]
    pub child: OrderedMap<CtReference>,
}

/// X-ray angiography reference bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XaReference {
    #[serde(rename = "DAP")]
    pub dap: f64,
    #[serde(rename = "AirKerma", default, skip_serializing_if = "Option::is_none")]
    pub air_kerma: Option<f64>,
    #[serde(rename = "FluoroTime", default, skip_serializing_if = "Option::is_none")]
    pub fluoro_time: Option<f64>,
}

/// X-ray angiography protocol with an optional single pediatric bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XaProtocol {
    #[serde(rename = "protocol_match")]
    pub match_patterns: Vec<String>,
    pub adult: XaReference,
    #[serde(
        default,
        deserialize_with = "empty_object_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub child: Option<XaReference>,
}

/// Digital radiography reference bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DxReference {
    #[serde(rename = "DAP")]
    pub dap: f64,
    #[serde(rename = "ESD", default, skip_serializing_if = "Option::is_none")]
    pub esd: Option<f64>,
}

/// Digital radiography protocol with an optional single pediatric bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DxProtocol {
    #[serde(rename = "protocol_match")]
    pub match_patterns: Vec<String>,
    pub adult: DxReference,
    #[serde(
        default,
        deserialize_with = "empty_object_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub child: Option<DxReference>,
}

/// Mammography protocol with thickness-banded AGD references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MgProtocol {
    #[serde(rename = "protocol_match")]
    pub match_patterns: Vec<String>,
    /// Base AGD (mGy)
    #[serde(rename = "AGD")]
    pub agd: f64,
    /// Thickness band key (`"min-max"` mm) to AGD, scanned in order
    #[serde(default)]
    pub thickness_ranges: OrderedMap<f64>,
}

/// A configured DRL protocol, one variant per modality schema
///
/// The persisted document does not carry the variant tag; the modality
/// owning the document decides which schema is read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Protocol {
    Ct(CtProtocol),
    Xa(XaProtocol),
    Dx(DxProtocol),
    Mg(MgProtocol),
}

impl Protocol {
    /// Reads one protocol object using the schema of `modality`
    pub fn from_value(modality: Modality, value: Value) -> serde_json::Result<Self> {
        Ok(match modality {
            Modality::Ct => Protocol::Ct(serde_json::from_value(value)?),
            Modality::Xa => Protocol::Xa(serde_json::from_value(value)?),
            Modality::Dx => Protocol::Dx(serde_json::from_value(value)?),
            Modality::Mg => Protocol::Mg(serde_json::from_value(value)?),
        })
    }

    /// Modality whose schema this protocol follows
    pub fn modality(&self) -> Modality {
        match self {
            Protocol::Ct(_) => Modality::Ct,
            Protocol::Xa(_) => Modality::Xa,
            Protocol::Dx(_) => Modality::Dx,
            Protocol::Mg(_) => Modality::Mg,
        }
    }

    /// Case-insensitive substrings recognising device-reported labels
    pub fn match_patterns(&self) -> &[String] {
        match self {
            Protocol::Ct(p) => &p.match_patterns,
            Protocol::Xa(p) => &p.match_patterns,
            Protocol::Dx(p) => &p.match_patterns,
            Protocol::Mg(p) => &p.match_patterns,
        }
    }

    fn match_patterns_mut(&mut self) -> &mut Vec<String> {
        match self {
            Protocol::Ct(p) => &mut p.match_patterns,
            Protocol::Xa(p) => &mut p.match_patterns,
            Protocol::Dx(p) => &mut p.match_patterns,
            Protocol::Mg(p) => &mut p.match_patterns,
        }
    }

    /// Trims match patterns and drops blank ones
    pub fn normalize(&mut self) {
        let patterns = self.match_patterns_mut();
        let cleaned: Vec<String> = patterns
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        *patterns = cleaned;
    }

    /// Checks the protocol can be persisted under `name`
    ///
    /// # Errors
    ///
    /// Returns [`DrlError::Validation`] if:
    /// - the name is blank
    /// - no non-blank match pattern exists
    /// - a reference value is not a positive finite number
    /// - a band key is not a valid `min-max` range
    pub fn validate(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(DrlError::validation(name, "protocol name is required"));
        }

        if self.match_patterns().iter().all(|p| p.trim().is_empty()) {
            return Err(DrlError::validation(
                name,
                "at least one match pattern is required",
            ));
        }

        match self {
            Protocol::Ct(p) => {
                check_value(name, "adult DLP", p.adult.dlp)?;
                check_value(name, "adult CTDIvol", p.adult.ctdi_vol)?;
                for (band, reference) in p.child.iter() {
                    check_band(name, band)?;
                    check_value(name, &format!("child {} DLP", band), reference.dlp)?;
                    check_value(name, &format!("child {} CTDIvol", band), reference.ctdi_vol)?;
                }
            }
            Protocol::Xa(p) => {
                check_xa(name, "adult", &p.adult)?;
                if let Some(child) = &p.child {
                    check_xa(name, "child", child)?;
                }
            }
            Protocol::Dx(p) => {
                check_dx(name, "adult", &p.adult)?;
                if let Some(child) = &p.child {
                    check_dx(name, "child", child)?;
                }
            }
            Protocol::Mg(p) => {
                check_value(name, "AGD", p.agd)?;
                for (band, agd) in p.thickness_ranges.iter() {
                    check_band(name, band)?;
                    check_value(name, &format!("AGD {}", band), *agd)?;
                }
            }
        }

        Ok(())
    }
}

/// Reads a whole per-modality document
pub(crate) fn parse_document(
    modality: Modality,
    text: &str,
) -> serde_json::Result<OrderedMap<Protocol>> {
    Ok(match modality {
        Modality::Ct => {
            serde_json::from_str::<OrderedMap<CtProtocol>>(text)?.map_values(Protocol::Ct)
        }
        Modality::Xa => {
            serde_json::from_str::<OrderedMap<XaProtocol>>(text)?.map_values(Protocol::Xa)
        }
        Modality::Dx => {
            serde_json::from_str::<OrderedMap<DxProtocol>>(text)?.map_values(Protocol::Dx)
        }
        Modality::Mg => {
            serde_json::from_str::<OrderedMap<MgProtocol>>(text)?.map_values(Protocol::Mg)
        }
    })
}

fn check_value(name: &str, field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DrlError::validation(
            name,
            format!("{} must be a positive number, got {}", field, value),
        ))
    }
}

fn check_optional(name: &str, field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) => check_value(name, field, v),
        None => Ok(()),
    }
}

fn check_band(name: &str, band: &str) -> Result<()> {
    InclusiveRange::parse(band)
        .map(|_| ())
        .map_err(|e| DrlError::validation(name, e))
}

fn check_xa(name: &str, bucket: &str, reference: &XaReference) -> Result<()> {
    check_value(name, &format!("{} DAP", bucket), reference.dap)?;
    check_optional(name, &format!("{} AirKerma", bucket), reference.air_kerma)?;
    check_optional(name, &format!("{} FluoroTime", bucket), reference.fluoro_time)
}

fn check_dx(name: &str, bucket: &str, reference: &DxReference) -> Result<()> {
    check_value(name, &format!("{} DAP", bucket), reference.dap)?;
    check_optional(name, &format!("{} ESD", bucket), reference.esd)
}

/// Older documents write an absent pediatric bucket as `{}`
fn empty_object_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        other => T::deserialize(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
