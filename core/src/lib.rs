pub mod cli;
pub mod compliance;
pub mod config;
pub mod error;
pub mod ingest;
pub mod types;

pub use cli::report::TextReport;
pub use compliance::{
    Classification, ComplianceClassifier, ComplianceReport, DoseAggregator, DoseGroup,
    DrlComparison, DrlSelector, GroupKey, MatchedProtocol, ProtocolMatcher, ReferenceBasis,
    ReferenceSelection, SelectionContext, ACCEPTABLE_LIMIT, OPTIMAL_LIMIT,
};
pub use config::{
    document_exists, MalformedPolicy, ProtocolSet, ProtocolStore, StoreConfig, StoreDiagnostic,
    DEFAULT_CONFIG_DIR,
};
pub use error::{DrlError, Result};
pub use types::*;
