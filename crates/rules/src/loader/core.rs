//! Core [`RuleLoader`] struct: filesystem-backed rule and threat loading.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use threatlens_core::Threat;
use tracing::{info, warn};

use crate::schema::{RuleDocument, RuleEnvelope, ThreatRule};

use super::error::{LoadResult, LoadStatus, Result, RuleError};

/// Filesystem-backed document loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files and
/// deserializes them into [`RuleDocument`] instances via two-pass
/// deserialization. Documents are kept in load order, which is sorted path
/// order, so scans are deterministic.
#[derive(Debug)]
pub struct RuleLoader {
    /// Root directory containing YAML files.
    rules_dir: PathBuf,
    /// Loaded documents in load order.
    documents: Vec<RuleDocument>,
    /// `metadata.id` to position in `documents`.
    index: HashMap<String, usize>,
}

impl RuleLoader {
    pub fn new(rules_dir: PathBuf) -> Self {
        Self {
            rules_dir,
            documents: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles (filenames starting with `.`) and non-YAML files are skipped.
    /// Parse errors and duplicate ids are reported per-file but do not abort
    /// the scan.
    pub fn load_all(&mut self) -> Result<Vec<LoadResult>> {
        if !self.rules_dir.is_dir() {
            return Err(RuleError::Validation(format!(
                "rules directory '{}' does not exist",
                self.rules_dir.display()
            )));
        }
        let mut results = Vec::new();
        let root = self.rules_dir.clone();
        self.scan_dir_recursive(&root, &mut results)?;
        info!(
            path = %self.rules_dir.display(),
            documents = self.documents.len(),
            failed = results.iter().filter(|r| r.is_failed()).count(),
            "rules directory loaded"
        );
        Ok(results)
    }

    fn scan_dir_recursive(&mut self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let mut paths = match fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let loaded = self.load_file(&path).and_then(|doc| {
                let id = doc.metadata().id.clone();
                let kind = doc.kind();
                self.insert(doc)?;
                Ok((id, kind))
            });

            match loaded {
                Ok((id, kind)) => {
                    info!(id = %id, kind = %kind, path = %path.display(), "loaded document");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { id, kind },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load document");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse a single YAML file into a [`RuleDocument`] via two-pass deserialization.
    ///
    /// First pass: deserialize as [`RuleEnvelope`] to read the `kind` field.
    /// Second pass: reconstruct and deserialize into the kind-specific type.
    pub fn load_file(&self, path: &Path) -> Result<RuleDocument> {
        let contents = fs::read_to_string(path)?;
        parse_document(&contents)
    }

    /// Add a document, rejecting an id that is already loaded.
    pub fn insert(&mut self, doc: RuleDocument) -> Result<()> {
        let id = doc.metadata().id.clone();
        if self.index.contains_key(&id) {
            return Err(RuleError::Validation(format!(
                "duplicate document id '{}'",
                id
            )));
        }
        self.index.insert(id, self.documents.len());
        self.documents.push(doc);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RuleDocument> {
        self.index.get(id).map(|&i| &self.documents[i])
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// All loaded documents in load order.
    pub fn documents(&self) -> &[RuleDocument] {
        &self.documents
    }

    /// Loaded rules in load order, enabled or not.
    pub fn rules(&self) -> Vec<ThreatRule> {
        self.documents
            .iter()
            .filter_map(RuleDocument::as_rule)
            .cloned()
            .collect()
    }

    /// The threat catalog assembled from every loaded `Threat` document.
    pub fn threats(&self) -> Vec<Threat> {
        self.documents
            .iter()
            .filter_map(RuleDocument::as_threat)
            .map(|doc| doc.to_threat())
            .collect()
    }
}

/// Parse YAML text into a [`RuleDocument`].
pub(super) fn parse_document(contents: &str) -> Result<RuleDocument> {
    // First pass: extract envelope (kind + metadata).
    let envelope: RuleEnvelope = serde_yaml::from_str(contents)?;

    if envelope.metadata.id.trim().is_empty() {
        return Err(RuleError::Validation(
            "metadata.id must not be empty".to_string(),
        ));
    }

    // Second pass: deserialize into kind-specific type.
    envelope.parse_full().map_err(|e| {
        RuleError::Validation(format!(
            "failed to parse '{}': {}",
            envelope.metadata.id, e
        ))
    })
}
