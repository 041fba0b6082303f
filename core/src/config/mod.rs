//! Persisted DRL configuration
//!
//! One JSON document per modality, loaded whole and rewritten whole on every
//! change. [`ProtocolStore`] owns the in-memory mappings; [`table`] moves them
//! to and from CSV.

mod settings;
mod store;
pub mod table;

pub use settings::{MalformedPolicy, StoreConfig, DEFAULT_CONFIG_DIR};
pub use store::{document_exists, ProtocolSet, ProtocolStore, StoreDiagnostic};
