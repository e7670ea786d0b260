pub mod toml_config;

pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "report-sql-migrate")]
#[command(about = "Rewrite DB2 SQL embedded in report definitions to PostgreSQL")]
pub struct CliConfig {
    #[arg(long, help = "Report directory to scan (default: current directory)")]
    pub root: Option<PathBuf>,

    #[arg(short, long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Show the rewritten SQL without touching any file")]
    pub dry_run: bool,

    #[arg(long, help = "Pretty-print rewritten SQL")]
    pub format: bool,

    #[arg(long, help = "Do not keep a backup copy of changed reports")]
    pub no_backup: bool,

    #[arg(long, value_delimiter = ',', help = "Report file extensions, e.g. jrxml,rptdesign")]
    pub extensions: Vec<String>,

    #[arg(long, help = "Write a JSON migration report to this path")]
    pub report: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML (如有指定) 後套用命令列參數
    ///
    /// 此時日誌尚未初始化，錯誤一律以回傳值交給呼叫端。
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// 命令列參數優先於 TOML 設定；未指定的旗標不覆蓋
    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(root) = &self.root {
            config.migration.root = root.clone();
        }
        if !self.extensions.is_empty() {
            config.migration.extensions = self.extensions.clone();
        }
        if self.dry_run {
            config.output.dry_run = true;
        }
        if self.format {
            config.output.format_sql = true;
        }
        if self.no_backup {
            config.output.backup = false;
        }
        if let Some(report) = &self.report {
            config.output.report_path = Some(report.clone());
        }
        if self.monitor {
            config.monitoring.get_or_insert_with(Default::default).enabled = true;
        }
    }
}
