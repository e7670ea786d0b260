use crate::document::FieldSelector;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MigrateError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub name: Option<String>,
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "FieldSelector::defaults")]
    pub sql_fields: Vec<FieldSelector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub backup: bool,
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
    #[serde(default)]
    pub format_sql: bool,
    #[serde(default)]
    pub prefer_cdata: bool,
    #[serde(default)]
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "compact" 或 "json"
    pub log_format: Option<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_extensions() -> Vec<String> {
    vec!["jrxml".to_string(), "rptdesign".to_string(), "xml".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            name: None,
            root: default_root(),
            extensions: default_extensions(),
            sql_fields: FieldSelector::defaults(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backup: true,
            backup_suffix: default_backup_suffix(),
            format_sql: false,
            prefer_cdata: false,
            dry_run: false,
            report_path: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| MigrateError::ConfigError {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MigrateError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REPORT_ROOT})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let root = self.migration.root.to_string_lossy();
        validation::validate_path("migration.root", &root)?;

        validation::validate_extensions("migration.extensions", &self.migration.extensions)?;

        if self.migration.sql_fields.is_empty() {
            return Err(MigrateError::MissingConfigError {
                field: "migration.sql_fields".to_string(),
            });
        }

        if self.output.backup {
            validation::validate_backup_suffix("output.backup_suffix", &self.output.backup_suffix)?;
        }

        if let Some(report) = &self.output.report_path {
            validation::validate_path("output.report_path", &report.to_string_lossy())?;
        }

        if let Some(format) = self.log_format() {
            if !matches!(format, "compact" | "json") {
                return Err(MigrateError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        self.migration.name.as_deref().unwrap_or("report-sql-migrate")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_format.as_deref())
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.output.report_path.as_deref()
    }
}

impl ConfigProvider for TomlConfig {
    fn root_dir(&self) -> &Path {
        &self.migration.root
    }

    fn extensions(&self) -> &[String] {
        &self.migration.extensions
    }

    fn sql_fields(&self) -> &[FieldSelector] {
        &self.migration.sql_fields
    }

    fn backup_enabled(&self) -> bool {
        self.output.backup
    }

    fn backup_suffix(&self) -> &str {
        &self.output.backup_suffix
    }

    fn format_sql(&self) -> bool {
        self.output.format_sql
    }

    fn prefer_cdata(&self) -> bool {
        self.output.prefer_cdata
    }

    fn dry_run(&self) -> bool {
        self.output.dry_run
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
