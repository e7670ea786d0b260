use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One SQL field whose text was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentChange {
    pub field: String,
    pub index: usize,
    pub before: String,
    pub after: String,
    pub cdata: bool,
}

/// A discovered report file, or the reason it could not be read.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub content: std::result::Result<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Unchanged,
    Changed { fragments: Vec<FragmentChange> },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
    pub converted: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub documents: Vec<DocumentResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Unchanged,
    Changed,
    /// Dry run: would have changed
    Previewed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub status: DocumentStatus,
    pub fragments_changed: usize,
    pub backup: Option<PathBuf>,
    pub error: Option<String>,
    pub changes: Vec<FragmentChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationTotals {
    pub scanned: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub fragments_rewritten: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub documents: Vec<DocumentReport>,
    pub totals: MigrationTotals,
}

impl MigrationReport {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool, documents: Vec<DocumentReport>) -> Self {
        let mut totals = MigrationTotals {
            scanned: documents.len(),
            ..Default::default()
        };

        for doc in &documents {
            match doc.status {
                DocumentStatus::Changed | DocumentStatus::Previewed => totals.changed += 1,
                DocumentStatus::Unchanged => totals.unchanged += 1,
                DocumentStatus::Failed => totals.failed += 1,
            }
            totals.fragments_rewritten += doc.fragments_changed;
        }

        Self {
            started_at,
            finished_at: Utc::now(),
            dry_run,
            documents,
            totals,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.totals.failed > 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
