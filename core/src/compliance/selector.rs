use crate::compliance::DoseGroup;
use crate::types::{InclusiveRange, Modality, Protocol};
use log::{debug, warn};
use std::fmt;

/// Group facts the reference selection depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionContext<'a> {
    /// Ages of the group's pediatric members
    pub pediatric_ages: &'a [u32],
    /// Compressed thickness shared by the group (mammography)
    pub thickness: Option<f64>,
}

impl<'a> From<&'a DoseGroup> for SelectionContext<'a> {
    fn from(group: &'a DoseGroup) -> Self {
        Self {
            pediatric_ages: &group.pediatric_ages,
            thickness: group.key.thickness,
        }
    }
}

/// Part of a protocol that supplied the reference value
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceBasis {
    Adult,
    /// Single pediatric bucket (XA/DX)
    Child,
    /// Pediatric age band (CT)
    ChildBand(String),
    /// Thickness band (MG)
    Thickness(String),
}

impl fmt::Display for ReferenceBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceBasis::Adult => write!(f, "adult"),
            ReferenceBasis::Child => write!(f, "child"),
            ReferenceBasis::ChildBand(band) => write!(f, "child {}", band),
            ReferenceBasis::Thickness(band) => write!(f, "{} mm", band),
        }
    }
}

/// Selected reference value and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSelection {
    pub value: f64,
    pub basis: ReferenceBasis,
}

impl ReferenceSelection {
    fn new(value: f64, basis: ReferenceBasis) -> Self {
        Self { value, basis }
    }
}

impl Protocol {
    /// Picks the applicable reference value for a group
    ///
    /// - CT: the DLP of the first age band (stored order) holding any
    ///   pediatric member, else the adult DLP
    /// - XA/DX: the child DAP when pediatric members exist and a child
    ///   bucket is configured, else the adult DAP
    /// - MG: the AGD of the first thickness band containing the group's
    ///   thickness; `None` when no band covers it
    pub fn reference_value(&self, ctx: &SelectionContext<'_>) -> Option<ReferenceSelection> {
        match self {
            Protocol::Ct(p) => {
                if !ctx.pediatric_ages.is_empty() {
                    for (band, reference) in p.child.iter() {
                        let Some(range) = parse_band(band) else {
                            continue;
                        };
                        if ctx
                            .pediatric_ages
                            .iter()
                            .any(|&age| range.contains(f64::from(age)))
                        {
                            return Some(ReferenceSelection::new(
                                reference.dlp,
                                ReferenceBasis::ChildBand(band.to_string()),
                            ));
                        }
                    }
                }
                Some(ReferenceSelection::new(p.adult.dlp, ReferenceBasis::Adult))
            }
            Protocol::Xa(p) => Some(match (&p.child, ctx.pediatric_ages.is_empty()) {
                (Some(child), false) => ReferenceSelection::new(child.dap, ReferenceBasis::Child),
                _ => ReferenceSelection::new(p.adult.dap, ReferenceBasis::Adult),
            }),
            Protocol::Dx(p) => Some(match (&p.child, ctx.pediatric_ages.is_empty()) {
                (Some(child), false) => ReferenceSelection::new(child.dap, ReferenceBasis::Child),
                _ => ReferenceSelection::new(p.adult.dap, ReferenceBasis::Adult),
            }),
            Protocol::Mg(p) => {
                let thickness = ctx.thickness?;
                p.thickness_ranges.iter().find_map(|(band, &agd)| {
                    let range = parse_band(band)?;
                    range.contains(thickness).then(|| {
                        ReferenceSelection::new(agd, ReferenceBasis::Thickness(band.to_string()))
                    })
                })
            }
        }
    }
}

fn parse_band(band: &str) -> Option<InclusiveRange> {
    match InclusiveRange::parse(band) {
        Ok(range) => Some(range),
        Err(e) => {
            warn!("Ignoring band: {}", e);
            None
        }
    }
}

/// Chooses the adult, pediatric or thickness-specific reference for a group
pub struct DrlSelector;

impl DrlSelector {
    /// Selects the reference value for `group` from `protocol`
    ///
    /// Returns `None` when the protocol belongs to another modality or no
    /// thickness band covers a mammography group.
    pub fn select(
        modality: Modality,
        group: &DoseGroup,
        protocol: &Protocol,
    ) -> Option<ReferenceSelection> {
        if protocol.modality() != modality {
            warn!(
                "{} protocol cannot supply a reference for {} group '{}'",
                protocol.modality(),
                modality,
                group.key
            );
            return None;
        }

        let selection = protocol.reference_value(&SelectionContext::from(group));
        match &selection {
            Some(s) => debug!("Group '{}' uses {} reference {}", group.key, s.basis, s.value),
            None => debug!("No reference band covers group '{}'", group.key),
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::GroupKey;
    use crate::types::{
        CtProtocol, CtReference, DxProtocol, DxReference, MgProtocol, OrderedMap, XaProtocol,
        XaReference,
    };

    fn group(ages: Vec<u32>, thickness: Option<f64>) -> DoseGroup {
        DoseGroup {
            key: GroupKey {
                protocol: "LABEL".to_string(),
                thickness,
            },
            record_count: 1,
            mean_dose: Some(1.0),
            mean_secondary_dose: None,
            device_model: None,
            pediatric_ages: ages,
        }
    }

    fn ct_band(dlp: f64, ctdi_vol: f64) -> CtReference {
        CtReference { dlp, ctdi_vol }
    }

    fn xa(dap: f64) -> XaReference {
        XaReference {
            dap,
            air_kerma: None,
            fluoro_time: None,
        }
    }

    fn ct_with_bands() -> Protocol {
        let mut child = OrderedMap::new();
        child.insert("0-1", ct_band(200.0, 20.0));
        child.insert("1-5", ct_band(300.0, 25.0));
        child.insert("5-10", ct_band(400.0, 30.0));
        Protocol::Ct(CtProtocol {
            match_patterns: vec!["head".to_string()],
            adult: ct_band(970.0, 60.0),
            child,
        })
    }

    #[test]
    fn test_ct_skips_empty_band_and_uses_occupied_one() {
        let selection =
            DrlSelector::select(Modality::Ct, &group(vec![3, 4], None), &ct_with_bands()).unwrap();
        assert_eq!(selection.value, 300.0);
        assert_eq!(
            selection.basis,
            ReferenceBasis::ChildBand("1-5".to_string())
        );
    }

    #[test]
    fn test_ct_first_occupied_band_in_stored_order_wins() {
        // age 1 sits in both "0-1" and "1-5"; age 7 only in "5-10"
        let selection =
            DrlSelector::select(Modality::Ct, &group(vec![7, 1], None), &ct_with_bands()).unwrap();
        assert_eq!(selection.value, 200.0);
    }

    #[test]
    fn test_ct_adult_when_no_pediatric_members() {
        let selection =
            DrlSelector::select(Modality::Ct, &group(vec![], None), &ct_with_bands()).unwrap();
        assert_eq!(selection.value, 970.0);
        assert_eq!(selection.basis, ReferenceBasis::Adult);
    }

    #[test]
    fn test_ct_adult_when_no_band_occupied() {
        let selection =
            DrlSelector::select(Modality::Ct, &group(vec![16], None), &ct_with_bands()).unwrap();
        assert_eq!(selection.value, 970.0);
    }

    #[test]
    fn test_xa_child_bucket() {
        let protocol = Protocol::Xa(XaProtocol {
            match_patterns: vec!["coronary".to_string()],
            adult: xa(50.0),
            child: Some(xa(10.0)),
        });

        let child = DrlSelector::select(Modality::Xa, &group(vec![12], None), &protocol).unwrap();
        assert_eq!(child.value, 10.0);
        assert_eq!(child.basis, ReferenceBasis::Child);

        let adult = DrlSelector::select(Modality::Xa, &group(vec![], None), &protocol).unwrap();
        assert_eq!(adult.value, 50.0);
    }

    #[test]
    fn test_dx_without_child_bucket_uses_adult() {
        let protocol = Protocol::Dx(DxProtocol {
            match_patterns: vec!["chest".to_string()],
            adult: DxReference {
                dap: 0.15,
                esd: None,
            },
            child: None,
        });

        let selection =
            DrlSelector::select(Modality::Dx, &group(vec![6], None), &protocol).unwrap();
        assert_eq!(selection.value, 0.15);
        assert_eq!(selection.basis, ReferenceBasis::Adult);
    }

    #[test]
    fn test_mg_thickness_lookup() {
        let mut thickness_ranges = OrderedMap::new();
        thickness_ranges.insert("41-50", 1.8);
        thickness_ranges.insert("51-60", 2.1);
        let protocol = Protocol::Mg(MgProtocol {
            match_patterns: vec!["cc".to_string()],
            agd: 2.5,
            thickness_ranges,
        });

        let selection =
            DrlSelector::select(Modality::Mg, &group(vec![], Some(45.0)), &protocol).unwrap();
        assert_eq!(selection.value, 1.8);
        assert_eq!(
            selection.basis,
            ReferenceBasis::Thickness("41-50".to_string())
        );

        let too_thick = group(vec![], Some(200.0));
        assert!(DrlSelector::select(Modality::Mg, &too_thick, &protocol).is_none());
        assert!(DrlSelector::select(Modality::Mg, &group(vec![], None), &protocol).is_none());
    }

    #[test]
    fn test_mismatched_modality_selects_nothing() {
        let mg_group = group(vec![], Some(45.0));
        assert!(DrlSelector::select(Modality::Mg, &mg_group, &ct_with_bands()).is_none());
    }
}
