//! File Organizer
//!
//! Turns a batch of classification results into a category-based folder
//! layout with collision-free, sequentially numbered filenames. Folder
//! realization is the only fatal step; everything after it records per-item
//! failures and keeps going. Sources are copied, never moved.

pub mod summary;

pub use summary::{ConfidenceStats, OrganizationSummary};

use crate::classify::ClassificationResult;
use crate::taxonomy;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal, pre-loop organizer failures
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("failed to create output directory {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a document's bytes come from
pub enum DocumentSource {
    /// In-memory buffer (e.g. an upload)
    Bytes(Vec<u8>),
    /// Path to an existing file on disk
    Path(PathBuf),
}

/// One resolved placement decision
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeEntry {
    pub original_name: String,
    pub new_name: String,
    /// Category code
    pub category: String,
    pub target_folder: String,
    pub document_number: u32,
    pub confidence: f32,
}

/// One document the organizer could not place
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEntry {
    pub filename: String,
    pub error: String,
}

/// Result of one organize run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeReport {
    pub organized: Vec<OrganizeEntry>,
    pub failed: Vec<FailedEntry>,
    pub summary: OrganizationSummary,
}

/// Per-run, per-category running counters. Counters default to 1 and are
/// consumed only by successful placements; the state is discarded with the
/// run, so concurrent runs must each own their own instance.
#[derive(Debug, Default)]
pub struct NumberingState {
    counters: HashMap<String, u32>,
}

impl NumberingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from caller-supplied initial values; unlisted categories still
    /// default to 1.
    pub fn with_overrides(overrides: HashMap<String, u32>) -> Self {
        Self { counters: overrides }
    }

    /// Current number for a category
    pub fn current(&mut self, code: &str) -> u32 {
        *self.counters.entry(code.to_string()).or_insert(1)
    }

    /// Consume the current number after a successful placement
    pub fn advance(&mut self, code: &str) {
        *self.counters.entry(code.to_string()).or_insert(1) += 1;
    }
}

pub struct Organizer {
    base_dir: PathBuf,
}

impl Organizer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Realize one directory per category. Idempotent: pre-existing
    /// directories are left untouched.
    pub fn create_folder_structure(&self) -> Result<(), OrganizeError> {
        for category in taxonomy::CATEGORIES.iter() {
            let path = self.base_dir.join(category.folder_name);
            fs::create_dir_all(&path).map_err(|source| OrganizeError::Setup {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Place every successfully classified document into its category
    /// folder, assigning sequential numbers per category and resolving
    /// duplicate destination names.
    pub fn organize(
        &self,
        results: &[ClassificationResult],
        sources: &HashMap<String, DocumentSource>,
        numbering_overrides: Option<HashMap<String, u32>>,
    ) -> Result<OrganizeReport, OrganizeError> {
        self.create_folder_structure()?;

        let mut numbering = numbering_overrides
            .map(NumberingState::with_overrides)
            .unwrap_or_default();
        let mut organized: Vec<OrganizeEntry> = Vec::new();
        let mut failed: Vec<FailedEntry> = Vec::new();

        for result in results {
            if !result.success {
                failed.push(FailedEntry {
                    filename: result.filename.clone(),
                    error: result
                        .error
                        .clone()
                        .unwrap_or_else(|| "classification failed".to_string()),
                });
                continue;
            }

            let Some(category) = taxonomy::by_code(&result.category) else {
                failed.push(FailedEntry {
                    filename: result.filename.clone(),
                    error: format!("no folder mapped for category '{}'", result.category),
                });
                continue;
            };

            let Some(source) = sources.get(&result.filename) else {
                failed.push(FailedEntry {
                    filename: result.filename.clone(),
                    error: format!("source bytes not found for '{}'", result.filename),
                });
                continue;
            };

            let number = numbering.current(category.code);
            let requester = sanitize_requester(&result.requester);
            let extension = Path::new(&result.filename)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e))
                .unwrap_or_default();

            let base_name = format!(
                "{}{:03} - {}{}",
                category.file_prefix, number, requester, extension
            );
            let folder = self.base_dir.join(category.folder_name);
            let (new_name, destination) = next_free_path(&folder, &base_name);

            match place(source, &destination) {
                Ok(()) => {
                    tracing::debug!(
                        "[Organizer] {} -> {}",
                        result.filename,
                        destination.display()
                    );
                    organized.push(OrganizeEntry {
                        original_name: result.filename.clone(),
                        new_name,
                        category: category.code.to_string(),
                        target_folder: category.folder_name.to_string(),
                        document_number: number,
                        confidence: result.confidence,
                    });
                    // A number is consumed only by a successful placement.
                    numbering.advance(category.code);
                }
                Err(e) => {
                    failed.push(FailedEntry {
                        filename: result.filename.clone(),
                        error: format!("failed to copy to {}: {}", destination.display(), e),
                    });
                }
            }
        }

        let summary = OrganizationSummary::compute(&organized, &failed);

        tracing::info!(
            "[Organizer] Run complete: {} organized, {} failed",
            organized.len(),
            failed.len()
        );

        Ok(OrganizeReport {
            organized,
            failed,
            summary,
        })
    }
}

/// The requester is free text from the model; strip anything that would
/// change where the file lands. Separators become underscores, and an empty
/// or unextracted requester falls back to "Unknown".
fn sanitize_requester(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw == "N/A" {
        return "Unknown".to_string();
    }
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();
    if cleaned.chars().all(|c| c == '_' || c.is_whitespace()) {
        return "Unknown".to_string();
    }
    cleaned
}

/// First-available-slot duplicate resolution: "name.pdf", "name_2.pdf",
/// "name_3.pdf", ... The exists-then-write check is not atomic across
/// processes; a single run is the supported writer.
fn next_free_path(folder: &Path, name: &str) -> (String, PathBuf) {
    let candidate = folder.join(name);
    if !candidate.exists() {
        return (name.to_string(), candidate);
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot..]),
        None => (name, ""),
    };

    let mut suffix = 2u32;
    loop {
        let disambiguated = format!("{}_{}{}", stem, suffix, extension);
        let path = folder.join(&disambiguated);
        if !path.exists() {
            return (disambiguated, path);
        }
        suffix += 1;
    }
}

/// Non-destructive copy of the source bytes to the destination
fn place(source: &DocumentSource, destination: &Path) -> Result<(), String> {
    match source {
        DocumentSource::Bytes(bytes) => {
            fs::write(destination, bytes).map_err(|e| e.to_string())
        }
        DocumentSource::Path(path) => {
            if !path.exists() {
                return Err(format!("source not found: {}", path.display()));
            }
            fs::copy(path, destination).map(|_| ()).map_err(|e| e.to_string())
        }
    }
}
