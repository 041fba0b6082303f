use crate::compliance::ProtocolMatcher;
use crate::config::{MalformedPolicy, StoreConfig};
use crate::error::{DrlError, Result};
use crate::types::{parse_document, Modality, OrderedMap, Protocol, ALL_MODALITIES};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// All protocols configured for one modality, in stored order
pub type ProtocolSet = OrderedMap<Protocol>;

/// A problem noticed while loading that did not abort the load
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDiagnostic {
    pub modality: Modality,
    pub path: PathBuf,
    pub message: String,
}

/// Per-modality DRL protocol configuration
///
/// Owns one in-memory mapping per modality. Each mapping is loaded whole and
/// rewritten whole on every mutation. Failures on one modality leave the
/// others usable.
///
/// # Example
///
/// ```
/// use drlcheck_core::{
///     CtProtocol, CtReference, Modality, OrderedMap, Protocol, ProtocolStore, StoreConfig,
/// };
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = StoreConfig::default().with_config_dir(dir.path());
/// let mut store = ProtocolStore::new(config);
/// store.load(Modality::Ct).unwrap();
///
/// let head = Protocol::Ct(CtProtocol {
///     match_patterns: vec!["head".to_string()],
///     adult: CtReference {
///         dlp: 970.0,
///         ctdi_vol: 60.0,
///     },
///     child: OrderedMap::new(),
/// });
/// store.add(Modality::Ct, "Head", head).unwrap();
///
/// let matched = store.matcher(Modality::Ct).find("HEAD ROUTINE").unwrap();
/// assert_eq!(matched.name, "Head");
/// ```
#[derive(Debug)]
pub struct ProtocolStore {
    config: StoreConfig,
    protocols: [ProtocolSet; 4],
    diagnostics: Vec<StoreDiagnostic>,
}

impl ProtocolStore {
    /// Creates a store with empty mappings; nothing is read yet
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            protocols: Default::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Creates a store and loads every modality
    ///
    /// Modalities that fail to load stay empty; their errors are returned
    /// alongside the store.
    pub fn open(config: StoreConfig) -> (Self, Vec<(Modality, DrlError)>) {
        let mut store = Self::new(config);
        let errors = store.load_all();
        (store, errors)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Problems surfaced by loads that fell back to an empty mapping
    ///
    /// Holds at most one entry per modality, from its latest load.
    pub fn diagnostics(&self) -> &[StoreDiagnostic] {
        &self.diagnostics
    }

    /// Loads every modality, collecting per-modality failures
    pub fn load_all(&mut self) -> Vec<(Modality, DrlError)> {
        let mut errors = Vec::new();
        for modality in ALL_MODALITIES {
            if let Err(e) = self.load(modality) {
                warn!("Could not load {} configuration: {}", modality, e);
                errors.push((modality, e));
            }
        }
        errors
    }

    /// Reads the persisted mapping for `modality`
    ///
    /// A missing document yields an empty mapping. A malformed document is
    /// handled according to [`MalformedPolicy`]; when it is treated as empty,
    /// the modality refuses mutations until a later load succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DrlError::ConfigIo`] if the document exists but cannot be
    /// read, or [`DrlError::ConfigParse`] under [`MalformedPolicy::Fail`].
    /// The in-memory mapping is unchanged on error.
    pub fn load(&mut self, modality: Modality) -> Result<&ProtocolSet> {
        let path = self.config.path_for(modality);

        let text = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => {
                return Err(DrlError::ConfigIo {
                    modality,
                    path,
                    source,
                })
            }
        };

        let mut diagnostic = None;
        let protocols = match text {
            None => {
                info!(
                    "No {} configuration at {}, starting empty",
                    modality,
                    path.display()
                );
                ProtocolSet::new()
            }
            Some(text) => match parse_document(modality, &text) {
                Ok(protocols) => protocols,
                Err(source) => match self.config.malformed_policy {
                    MalformedPolicy::Fail => {
                        return Err(DrlError::ConfigParse {
                            modality,
                            path,
                            source,
                        })
                    }
                    MalformedPolicy::TreatAsEmpty => {
                        warn!(
                            "Malformed {} configuration at {} treated as empty: {}",
                            modality,
                            path.display(),
                            source
                        );
                        diagnostic = Some(StoreDiagnostic {
                            modality,
                            path: path.clone(),
                            message: source.to_string(),
                        });
                        ProtocolSet::new()
                    }
                },
            },
        };

        info!("Loaded {} {} protocols", protocols.len(), modality);
        self.diagnostics.retain(|d| d.modality != modality);
        self.diagnostics.extend(diagnostic);
        let entry = &mut self.protocols[slot(modality)];
        *entry = protocols;
        Ok(&*entry)
    }

    /// Overwrites the persisted document with the in-memory mapping
    ///
    /// The document is written to a temporary file in the same directory
    /// and then renamed over the target.
    ///
    /// # Errors
    ///
    /// Returns [`DrlError::ConfigIo`] if the directory or file cannot be written
    pub fn save(&self, modality: Modality) -> Result<()> {
        let path = self.config.path_for(modality);
        let io_err = |source: std::io::Error| DrlError::ConfigIo {
            modality,
            path: path.clone(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let document = render_document(self.list_all(modality)).map_err(io_err)?;

        let mut file = NamedTempFile::new_in(&dir).map_err(io_err)?;
        file.write_all(&document).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&path).map_err(|e| io_err(e.error))?;

        info!(
            "Saved {} {} protocols to {}",
            self.list_all(modality).len(),
            modality,
            path.display()
        );
        Ok(())
    }

    /// Validates and inserts (or overwrites) a protocol, then persists
    ///
    /// An overwritten protocol keeps its position in the stored order.
    ///
    /// # Errors
    ///
    /// Returns [`DrlError::ConfigParse`] if the document was loaded as empty
    /// because it was malformed, [`DrlError::Validation`] before anything is
    /// written, or [`DrlError::ConfigIo`] if persisting fails, in which case
    /// the in-memory mapping is restored.
    pub fn add(&mut self, modality: Modality, name: &str, mut protocol: Protocol) -> Result<()> {
        self.ensure_writable(modality)?;
        let name = name.trim();
        if protocol.modality() != modality {
            return Err(DrlError::validation(
                name,
                format!(
                    "{} protocol cannot be stored in the {} configuration",
                    protocol.modality(),
                    modality
                ),
            ));
        }
        protocol.normalize();
        protocol.validate(name)?;

        let snapshot = self.list_all(modality).clone();
        self.protocols[slot(modality)].insert(name, protocol);
        self.commit(modality, snapshot)?;

        debug!("Stored {} protocol '{}'", modality, name);
        Ok(())
    }

    /// Removes a protocol if present and persists the removal
    ///
    /// Returns `false` without writing anything when `name` is not stored.
    pub fn delete(&mut self, modality: Modality, name: &str) -> Result<bool> {
        self.ensure_writable(modality)?;
        if !self.list_all(modality).contains_key(name) {
            debug!("No {} protocol '{}' to delete", modality, name);
            return Ok(false);
        }

        let snapshot = self.list_all(modality).clone();
        self.protocols[slot(modality)].remove(name);
        self.commit(modality, snapshot)?;

        debug!("Deleted {} protocol '{}'", modality, name);
        Ok(true)
    }

    /// Replaces the whole mapping for `modality` and persists it
    ///
    /// Every protocol is validated first; on any failure nothing changes.
    pub fn replace_all(&mut self, modality: Modality, protocols: ProtocolSet) -> Result<()> {
        self.ensure_writable(modality)?;
        let mut cleaned = ProtocolSet::new();
        for (name, mut protocol) in protocols {
            if protocol.modality() != modality {
                return Err(DrlError::validation(
                    &name,
                    format!("not a {} protocol", modality),
                ));
            }
            protocol.normalize();
            protocol.validate(&name)?;
            cleaned.insert(name.trim(), protocol);
        }

        let snapshot = std::mem::replace(&mut self.protocols[slot(modality)], cleaned);
        self.commit(modality, snapshot)
    }

    pub fn get(&self, modality: Modality, name: &str) -> Option<&Protocol> {
        self.list_all(modality).get(name)
    }

    pub fn list_all(&self, modality: Modality) -> &ProtocolSet {
        &self.protocols[slot(modality)]
    }

    /// Matcher over the stored protocols of `modality`
    pub fn matcher(&self, modality: Modality) -> ProtocolMatcher<'_> {
        ProtocolMatcher::new(self.list_all(modality))
    }

    /// Rejects writes over a document that was loaded as empty because it
    /// could not be parsed
    fn ensure_writable(&self, modality: Modality) -> Result<()> {
        match self.diagnostics.iter().find(|d| d.modality == modality) {
            Some(diagnostic) => Err(DrlError::ConfigParse {
                modality,
                path: diagnostic.path.clone(),
                source: serde::de::Error::custom(format!(
                    "{} (fix the document and reload before editing)",
                    diagnostic.message
                )),
            }),
            None => Ok(()),
        }
    }

    /// Persists the current mapping, restoring `snapshot` if that fails
    fn commit(&mut self, modality: Modality, snapshot: ProtocolSet) -> Result<()> {
        if let Err(e) = self.save(modality) {
            self.protocols[slot(modality)] = snapshot;
            return Err(e);
        }
        Ok(())
    }
}

fn slot(modality: Modality) -> usize {
    match modality {
        Modality::Ct => 0,
        Modality::Xa => 1,
        Modality::Mg => 2,
        Modality::Dx => 3,
    }
}

/// Pretty JSON with four-space indentation
fn render_document(protocols: &ProtocolSet) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    protocols
        .serialize(&mut serializer)
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
    Ok(buffer)
}

/// Whether a configuration document exists for `modality`
pub fn document_exists(config: &StoreConfig, modality: Modality) -> bool {
    config.path_for(modality).is_file()
}
