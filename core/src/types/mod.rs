//! Core type definitions for DRL compliance checking
//!
//! This module provides the fundamental types used throughout the drlcheck library:
//! - [`Modality`]: Imaging modalities with their own DRL schema (CT, XA, DX, MG)
//! - [`Protocol`]: Configured reference levels, one variant per modality
//! - [`InclusiveRange`]: `"min-max"` age and thickness bands
//! - [`OrderedMap`]: Insertion-ordered mapping used for protocols and bands
//! - [`ExamRecord`]: One exam's dose metrics as supplied by extraction
//! - [`ComparisonResult`]: Per-group outcome with [`ComplianceStatus`]

mod modality;
mod ordered;
mod protocol;
mod range;
mod record;
mod result;

pub use modality::{Modality, ALL_MODALITIES};
pub use ordered::OrderedMap;
pub(crate) use protocol::parse_document;
pub use protocol::{
    CtProtocol, CtReference, DxProtocol, DxReference, MgProtocol, Protocol, XaProtocol,
    XaReference,
};
pub use range::InclusiveRange;
pub use record::{age_in_years, DoseMetrics, ExamRecord, PEDIATRIC_AGE_LIMIT};
pub use result::{ComparisonResult, ComplianceStatus, StatusColor};
