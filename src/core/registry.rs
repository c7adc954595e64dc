//! Document type registry.
//!
//! Definitions are parsed from a [`DefinitionSource`] into an immutable
//! catalog. Readers take a cheap `Arc` snapshot of the current catalog;
//! `reload` builds a complete replacement off to the side and publishes it
//! with a single swap, so a reader never observes a half-built table.

use crate::core::{DefinitionRecord, DefinitionSource, DocumentType, RecordFormat};
use crate::utils::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// What to do when two records declare the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The record applied later replaces the earlier one.
    #[default]
    LastWins,
    /// The whole load fails.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Entries in the published table.
    pub loaded: usize,
    /// Origins of records that could not be read or parsed.
    pub skipped: Vec<String>,
    /// Ids that were declared more than once.
    pub duplicates: Vec<String>,
}

#[derive(Debug, Default)]
struct Catalog {
    entries: Vec<Arc<DocumentType>>,
    origins: Vec<String>,
    index: HashMap<String, usize>,
}

impl Catalog {
    fn build(records: Vec<DefinitionRecord>, policy: DuplicatePolicy) -> Result<(Self, LoadReport)> {
        let mut catalog = Catalog::default();
        let mut report = LoadReport::default();

        for record in records {
            let doc = match parse_record(&record) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(origin = %record.origin, error = %e, "Skipping document type definition");
                    report.skipped.push(record.origin);
                    continue;
                }
            };

            tracing::debug!(id = %doc.id, name = %doc.name, origin = %record.origin, "Loaded document type");

            match catalog.index.get(&doc.id).copied() {
                Some(pos) => {
                    let first = &catalog.origins[pos];
                    if policy == DuplicatePolicy::Reject {
                        return Err(ScanError::DuplicateDocumentType {
                            id: doc.id,
                            first: first.clone(),
                            second: record.origin,
                        });
                    }
                    tracing::warn!(
                        id = %doc.id,
                        replaced = %first,
                        by = %record.origin,
                        "Duplicate document type id, keeping the later definition"
                    );
                    report.duplicates.push(doc.id.clone());
                    catalog.entries[pos] = Arc::new(doc);
                    catalog.origins[pos] = record.origin;
                }
                None => {
                    catalog.index.insert(doc.id.clone(), catalog.entries.len());
                    catalog.entries.push(Arc::new(doc));
                    catalog.origins.push(record.origin);
                }
            }
        }

        report.loaded = catalog.entries.len();
        Ok((catalog, report))
    }
}

/// Parses one record. Missing required attributes or an unknown processing
/// mode fail just this record.
pub fn parse_record(record: &DefinitionRecord) -> Result<DocumentType> {
    let parsed = match (&record.contents, record.format) {
        (Err(reason), _) => Err(format!("unreadable: {}", reason)),
        (Ok(text), RecordFormat::Json) => serde_json::from_str(text).map_err(|e| e.to_string()),
        (Ok(text), RecordFormat::Toml) => toml::from_str(text).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| ScanError::DefinitionParseError {
        origin: record.origin.clone(),
        message,
    })
}

pub struct DocumentTypeRegistry {
    source: Box<dyn DefinitionSource>,
    policy: DuplicatePolicy,
    catalog: RwLock<Arc<Catalog>>,
}

impl DocumentTypeRegistry {
    /// Scans `source` and builds the initial table.
    pub fn load<S: DefinitionSource + 'static>(source: S, policy: DuplicatePolicy) -> Result<Self> {
        let (catalog, report) = Self::scan(&source, policy)?;
        tracing::info!(
            source = %source.describe(),
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "Document type registry loaded"
        );

        Ok(Self {
            source: Box::new(source),
            policy,
            catalog: RwLock::new(Arc::new(catalog)),
        })
    }

    fn scan(source: &dyn DefinitionSource, policy: DuplicatePolicy) -> Result<(Catalog, LoadReport)> {
        let records = source.records()?;
        Catalog::build(records, policy)
    }

    fn snapshot(&self) -> Arc<Catalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<DocumentType>> {
        let catalog = self.snapshot();
        catalog.index.get(id).map(|&pos| catalog.entries[pos].clone())
    }

    /// All entries in insertion order, optionally only the enabled ones.
    pub fn list(&self, enabled_only: bool) -> Vec<Arc<DocumentType>> {
        self.snapshot()
            .entries
            .iter()
            .filter(|doc| !enabled_only || doc.enabled)
            .cloned()
            .collect()
    }

    /// Enabled entries of exactly `category`.
    pub fn list_by_category(&self, category: &str) -> Vec<Arc<DocumentType>> {
        self.snapshot()
            .entries
            .iter()
            .filter(|doc| doc.enabled && doc.category == category)
            .cloned()
            .collect()
    }

    /// Rescans the source and swaps in the new table. On error the current
    /// table stays published.
    pub fn reload(&self) -> Result<LoadReport> {
        let (catalog, report) = Self::scan(self.source.as_ref(), self.policy)?;

        *self
            .catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);

        tracing::info!(
            source = %self.source.describe(),
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "Document type registry reloaded"
        );
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.snapshot().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered, mutable in-memory definition store. Clones share the same
/// records.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Arc<RwLock<Vec<DefinitionRecord>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, origin: &str, value: serde_json::Value) {
        self.push(DefinitionRecord::new(origin, RecordFormat::Json, value.to_string()));
    }

    pub fn push(&self, record: DefinitionRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    pub fn remove(&self, origin: &str) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| r.origin != origin);
    }
}

impl DefinitionSource for MemorySource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn records(&self) -> Result<Vec<DefinitionRecord>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
