use crate::document::FieldSelector;
use crate::domain::model::{MigrationReport, SourceDocument, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
    fn write_file(
        &self,
        path: &Path,
        data: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Copies `path` aside before its first rewrite. An existing backup is kept.
    fn backup_file(
        &self,
        path: &Path,
        suffix: &str,
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn root_dir(&self) -> &Path;
    fn extensions(&self) -> &[String];
    fn sql_fields(&self) -> &[FieldSelector];
    fn backup_enabled(&self) -> bool;
    fn backup_suffix(&self) -> &str;
    fn format_sql(&self) -> bool;
    fn prefer_cdata(&self) -> bool;
    fn dry_run(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceDocument>>;
    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<MigrationReport>;
}
