use crate::types::Modality;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default directory holding the per-modality documents
pub const DEFAULT_CONFIG_DIR: &str = "drl_configs";

/// How a present but unreadable configuration document is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Load an empty mapping and record a diagnostic
    #[default]
    TreatAsEmpty,
    /// Return the parse error to the caller
    Fail,
}

/// Configuration for where and how protocol documents are persisted
///
/// # Example
///
/// ```
/// use drlcheck_core::{MalformedPolicy, Modality, StoreConfig};
///
/// let config = StoreConfig::default()
///     .with_config_dir("/tmp/drl")
///     .with_file_name(Modality::Ct, "ct.json")
///     .on_malformed(MalformedPolicy::Fail);
///
/// assert_eq!(config.path_for(Modality::Ct), std::path::PathBuf::from("/tmp/drl/ct.json"));
/// assert_eq!(
///     config.path_for(Modality::Mg),
///     std::path::PathBuf::from("/tmp/drl/mg_drl_config.json")
/// );
/// assert_eq!(config.malformed_policy, MalformedPolicy::Fail);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Directory containing one JSON document per modality
    pub config_dir: PathBuf,

    /// File name overrides; modalities not listed use their default name
    pub file_names: HashMap<Modality, String>,

    pub malformed_policy: MalformedPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            file_names: HashMap::new(),
            malformed_policy: MalformedPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Builder: Set the configuration directory
    pub fn with_config_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Builder: Override the document file name for one modality
    pub fn with_file_name(mut self, modality: Modality, name: impl Into<String>) -> Self {
        self.file_names.insert(modality, name.into());
        self
    }

    /// Builder: Set the malformed document policy
    pub fn on_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    /// Full path of the document for `modality`
    pub fn path_for(&self, modality: Modality) -> PathBuf {
        let name = self
            .file_names
            .get(&modality)
            .map(String::as_str)
            .unwrap_or_else(|| modality.default_file_name());
        self.config_dir.join(name)
    }
}
