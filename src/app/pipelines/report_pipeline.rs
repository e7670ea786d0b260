use crate::document::rewrite_fields;
use crate::domain::model::{
    DocumentOutcome, DocumentReport, DocumentResult, DocumentStatus, MigrationReport,
    SourceDocument, TransformResult,
};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::sql;
use crate::utils::error::{MigrateError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Migrates every report definition under the configured root.
pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    started_at: DateTime<Utc>,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            started_at: Utc::now(),
        }
    }

    fn has_report_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .extensions()
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    fn is_backup(&self, path: &Path) -> bool {
        let suffix = self.config.backup_suffix();
        !suffix.is_empty()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.ends_with(suffix))
                .unwrap_or(false)
    }

    /// 找出根目錄下所有報表檔 (依路徑排序，回傳相對路徑)
    pub fn discover(&self) -> Vec<PathBuf> {
        let root = self.config.root_dir();
        let mut found = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.has_report_extension(path) || self.is_backup(path) {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path);
            found.push(relative.to_path_buf());
        }

        found
    }

    fn convert_document(&self, path: &Path, xml: &str) -> (DocumentOutcome, Option<String>) {
        let format = self.config.format_sql();

        match rewrite_fields(
            path,
            xml,
            self.config.sql_fields(),
            self.config.prefer_cdata(),
            |fragment| sql::convert(fragment, format),
        ) {
            Ok(rewrite) if rewrite.is_changed() => (
                DocumentOutcome::Changed {
                    fragments: rewrite.changes,
                },
                Some(rewrite.content),
            ),
            Ok(_) => (DocumentOutcome::Unchanged, None),
            Err(e) => (
                DocumentOutcome::Failed {
                    reason: e.to_string(),
                },
                None,
            ),
        }
    }

    /// 先備份再寫入；寫入失敗時仍回傳已建立的備份
    async fn save(&self, path: &Path, content: &str) -> (Option<PathBuf>, Result<()>) {
        let backup = if self.config.backup_enabled() {
            match self
                .storage
                .backup_file(path, self.config.backup_suffix())
                .await
            {
                Ok(backup) => Some(backup),
                Err(e) => return (None, Err(e)),
            }
        } else {
            None
        };

        let written = self.storage.write_file(path, content).await;
        (backup, written)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceDocument>> {
        let root = self.config.root_dir();
        if !root.is_dir() {
            return Err(MigrateError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("report root {} is not a directory", root.display()),
            )));
        }

        let paths = self.discover();
        tracing::debug!(
            "🔍 Found {} report files under {}",
            paths.len(),
            self.config.root_dir().display()
        );

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let content = self
                .storage
                .read_file(&path)
                .await
                .map_err(|e| e.to_string());

            if let Err(reason) = &content {
                tracing::warn!("⚠️ Cannot read {}: {}", path.display(), reason);
            }

            documents.push(SourceDocument { path, content });
        }

        Ok(documents)
    }

    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<TransformResult> {
        let mut result = TransformResult::default();

        for document in documents {
            let SourceDocument { path, content } = document;

            let (outcome, converted) = match content {
                Err(reason) => (DocumentOutcome::Failed { reason }, None),
                Ok(xml) => self.convert_document(&path, &xml),
            };

            match &outcome {
                DocumentOutcome::Changed { fragments } => {
                    tracing::debug!(
                        "✏️ {}: {} SQL fragment(s) rewritten",
                        path.display(),
                        fragments.len()
                    )
                }
                DocumentOutcome::Unchanged => {
                    tracing::debug!("{}: nothing to rewrite", path.display())
                }
                DocumentOutcome::Failed { reason } => {
                    tracing::warn!("❌ {}: {}", path.display(), reason)
                }
            }

            result.documents.push(DocumentResult {
                path,
                outcome,
                converted,
            });
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<MigrationReport> {
        let dry_run = self.config.dry_run();
        let mut reports = Vec::with_capacity(result.documents.len());

        for document in result.documents {
            let DocumentResult {
                path,
                outcome,
                converted,
            } = document;

            let report = match (outcome, converted) {
                (DocumentOutcome::Unchanged, _) => DocumentReport {
                    path,
                    status: DocumentStatus::Unchanged,
                    fragments_changed: 0,
                    backup: None,
                    error: None,
                    changes: Vec::new(),
                },
                (DocumentOutcome::Failed { reason }, _) => DocumentReport {
                    path,
                    status: DocumentStatus::Failed,
                    fragments_changed: 0,
                    backup: None,
                    error: Some(reason),
                    changes: Vec::new(),
                },
                (DocumentOutcome::Changed { fragments }, Some(content)) if !dry_run => {
                    let (backup, written) = self.save(&path, &content).await;
                    match written {
                        Ok(()) => {
                            tracing::info!("✅ Migrated {}", path.display());
                            DocumentReport {
                                path,
                                status: DocumentStatus::Changed,
                                fragments_changed: fragments.len(),
                                backup,
                                error: None,
                                changes: fragments,
                            }
                        }
                        Err(e) => {
                            tracing::error!("❌ Failed to write {}: {}", path.display(), e);
                            DocumentReport {
                                path,
                                status: DocumentStatus::Failed,
                                fragments_changed: 0,
                                backup,
                                error: Some(e.to_string()),
                                changes: fragments,
                            }
                        }
                    }
                }
                (DocumentOutcome::Changed { fragments }, _) => {
                    tracing::info!("💡 Would migrate {}", path.display());
                    DocumentReport {
                        path,
                        status: DocumentStatus::Previewed,
                        fragments_changed: fragments.len(),
                        backup: None,
                        error: None,
                        changes: fragments,
                    }
                }
            };

            reports.push(report);
        }

        Ok(MigrationReport::new(self.started_at, dry_run, reports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalStorage;
    use crate::config::TomlConfig;
    use tempfile::TempDir;

    const JRXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jasperReport name="orders">
    <queryString><![CDATA[SELECT * FROM orders WHERE d > CURRENT DATE - 7 DAYS WITH UR]]></queryString>
</jasperReport>
"#;

    fn config_for(dir: &TempDir) -> TomlConfig {
        let mut config = TomlConfig::default();
        config.migration.root = dir.path().to_path_buf();
        config
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.jrxml", JRXML);
        write(&dir, "a/c.JRXML", JRXML);
        write(&dir, "b.jrxml.bak", JRXML);
        write(&dir, "notes.txt", "SELECT 1");

        let config = config_for(&dir);
        let pipeline = ReportPipeline::new(LocalStorage::new(dir.path()), config);

        assert_eq!(
            pipeline.discover(),
            vec![PathBuf::from("a/c.JRXML"), PathBuf::from("b.jrxml")]
        );
    }

    #[tokio::test]
    async fn test_full_run_rewrites_and_backs_up() {
        let dir = TempDir::new().unwrap();
        write(&dir, "orders.jrxml", JRXML);

        let config = config_for(&dir);
        let pipeline = ReportPipeline::new(LocalStorage::new(dir.path()), config);

        let documents = pipeline.extract().await.unwrap();
        let result = pipeline.transform(documents).await.unwrap();
        let report = pipeline.load(result).await.unwrap();

        assert_eq!(report.totals.changed, 1);
        assert_eq!(report.documents[0].fragments_changed, 1);
        assert_eq!(
            report.documents[0].backup,
            Some(PathBuf::from("orders.jrxml.bak"))
        );

        let migrated = std::fs::read_to_string(dir.path().join("orders.jrxml")).unwrap();
        assert!(migrated.contains(
            "<![CDATA[SELECT * FROM orders WHERE d > current_date - INTERVAL '7 day']]>"
        ));
        let backup = std::fs::read_to_string(dir.path().join("orders.jrxml.bak")).unwrap();
        assert_eq!(backup, JRXML);
    }

    #[tokio::test]
    async fn test_missing_root_aborts_extract() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir);
        config.migration.root = dir.path().join("missing");
        let pipeline = ReportPipeline::new(LocalStorage::new(dir.path()), config);

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, MigrateError::IoError(_)));
    }

    #[tokio::test]
    async fn test_dry_run_previews_only() {
        let dir = TempDir::new().unwrap();
        write(&dir, "orders.jrxml", JRXML);

        let mut config = config_for(&dir);
        config.output.dry_run = true;
        let pipeline = ReportPipeline::new(LocalStorage::new(dir.path()), config);

        let documents = pipeline.extract().await.unwrap();
        let result = pipeline.transform(documents).await.unwrap();
        let report = pipeline.load(result).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.documents[0].status, DocumentStatus::Previewed);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("orders.jrxml")).unwrap(),
            JRXML
        );
        assert!(!dir.path().join("orders.jrxml.bak").exists());
    }
}
