use crate::types::Modality;
use chrono::NaiveDate;

/// Age at or below which a patient counts as pediatric (years)
pub const PEDIATRIC_AGE_LIMIT: u32 = 18;

/// Dose metrics reported for one exam; each may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DoseMetrics {
    /// Dose-length product (mGy·cm)
    pub dlp: Option<f64>,
    /// Volume CT dose index (mGy)
    pub ctdi_vol: Option<f64>,
    /// Dose-area product
    pub dap: Option<f64>,
    /// Entrance dose
    pub entrance_dose: Option<f64>,
    /// Average glandular dose (mGy)
    pub agd: Option<f64>,
}

/// One exam as supplied by the dose extraction step
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExamRecord {
    pub modality: Modality,

    /// Acquisition protocol label as reported by the device
    pub protocol: Option<String>,

    /// Device observer model name
    pub device_model: Option<String>,

    /// Patient age in whole years
    pub patient_age: Option<u32>,

    /// Compressed body-part thickness (mm)
    pub body_part_thickness: Option<f64>,

    pub study_date: Option<NaiveDate>,

    pub doses: DoseMetrics,
}

impl ExamRecord {
    /// Creates a record with only modality and protocol label set
    pub fn new(modality: Modality, protocol: impl Into<String>) -> Self {
        Self {
            modality,
            protocol: Some(protocol.into()),
            device_model: None,
            patient_age: None,
            body_part_thickness: None,
            study_date: None,
            doses: DoseMetrics::default(),
        }
    }

    /// Builder: Set device model
    pub fn with_device_model(mut self, model: impl Into<String>) -> Self {
        self.device_model = Some(model.into());
        self
    }

    /// Builder: Set patient age
    pub fn with_age(mut self, age: u32) -> Self {
        self.patient_age = Some(age);
        self
    }

    /// Builder: Set body-part thickness
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.body_part_thickness = Some(thickness);
        self
    }

    /// Builder: Set study date
    pub fn with_study_date(mut self, date: NaiveDate) -> Self {
        self.study_date = Some(date);
        self
    }

    /// Builder: Set dose metrics
    pub fn with_doses(mut self, doses: DoseMetrics) -> Self {
        self.doses = doses;
        self
    }

    /// Whether the patient is known to be pediatric
    ///
    /// Records without an age are never pediatric.
    pub fn is_pediatric(&self) -> bool {
        self.patient_age
            .map(|age| age <= PEDIATRIC_AGE_LIMIT)
            .unwrap_or(false)
    }

    /// The dose compared against the reference level for `modality`
    pub fn compared_dose(&self, modality: Modality) -> Option<f64> {
        match modality {
            Modality::Ct => self.doses.dlp,
            Modality::Xa | Modality::Dx => self.doses.dap,
            Modality::Mg => self.doses.agd,
        }
    }

    /// The secondary dose averaged alongside the compared dose
    pub fn secondary_dose(&self, modality: Modality) -> Option<f64> {
        match modality {
            Modality::Ct => self.doses.ctdi_vol,
            Modality::Xa | Modality::Dx | Modality::Mg => self.doses.entrance_dose,
        }
    }
}

/// Age in whole years, counted as elapsed days divided by 365
pub fn age_in_years(birth_date: NaiveDate, study_date: NaiveDate) -> Option<u32> {
    let days = (study_date - birth_date).num_days();
    if days < 0 {
        None
    } else {
        u32::try_from(days / 365).ok()
    }
}
