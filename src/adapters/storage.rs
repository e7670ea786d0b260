use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at the report directory. Relative paths
/// resolve against the root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &Path) -> Result<String> {
        let data = tokio::fs::read_to_string(self.resolve(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &Path, data: &str) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn backup_file(&self, path: &Path, suffix: &str) -> Result<PathBuf> {
        let backup = with_suffix(path, suffix);
        let full_backup = self.resolve(&backup);

        // 保留第一次的備份，重跑不覆蓋原始檔
        if tokio::fs::try_exists(&full_backup).await? {
            tracing::debug!("Backup already exists: {}", full_backup.display());
            return Ok(backup);
        }

        tokio::fs::copy(self.resolve(path), &full_backup).await?;
        tracing::debug!("Backed up {} -> {}", path.display(), full_backup.display());
        Ok(backup)
    }
}
