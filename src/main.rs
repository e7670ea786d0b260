use clap::Parser;
use report_sql_migrate::domain::model::{DocumentReport, DocumentStatus, MigrationReport};
use report_sql_migrate::domain::ports::ConfigProvider;
use report_sql_migrate::utils::error::ErrorSeverity;
use report_sql_migrate::utils::{logger, validation::Validate};
use report_sql_migrate::{CliConfig, LocalStorage, MigrationEngine, ReportPipeline, TomlConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 先載入配置，才知道日誌格式
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match config.log_format() {
        Some("json") => logger::init_json_logger(cli.verbose),
        _ => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting report-sql-migrate");
    if let Some(path) = &cli.config {
        tracing::info!("📄 Configuration loaded from {}", path.display());
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let report_path = config.report_path().map(|p| p.to_path_buf());

    // 創建存儲和管道
    let storage = LocalStorage::new(config.root_dir());
    let pipeline = ReportPipeline::new(storage, config);

    let engine = MigrationEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            print_summary(&report);

            if let Some(path) = report_path {
                let json = report.to_json()?;
                tokio::fs::write(&path, json).await?;
                tracing::info!("📁 Migration report saved to: {}", path.display());
                println!("📁 Migration report saved to: {}", path.display());
            }

            if report.has_failures() {
                std::process::exit(2);
            }
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Migration: {}", config.name());
    tracing::info!("  📁 Root: {}", config.root_dir().display());
    tracing::info!("  📄 Extensions: {}", config.extensions().join(", "));
    let fields: Vec<String> = config.sql_fields().iter().map(|f| f.to_string()).collect();
    tracing::info!("  🔎 SQL fields: {}", fields.join(", "));
    tracing::info!(
        "  💾 Backup: {}",
        if config.backup_enabled() {
            config.backup_suffix()
        } else {
            "off"
        }
    );
    if config.format_sql() {
        tracing::info!("  ✨ Pretty-printing converted SQL");
    }
    if config.dry_run() {
        tracing::info!("🔍 DRY RUN MODE - no file will be written");
    }
}

fn print_summary(report: &MigrationReport) {
    for doc in &report.documents {
        print_document(doc);
    }

    let totals = &report.totals;
    println!();
    println!(
        "{} Scanned {} report(s): {} {}, {} unchanged, {} failed ({} SQL fragment(s))",
        if report.has_failures() { "⚠️" } else { "✅" },
        totals.scanned,
        totals.changed,
        if report.dry_run { "to migrate" } else { "migrated" },
        totals.unchanged,
        totals.failed,
        totals.fragments_rewritten
    );
}

fn print_document(doc: &DocumentReport) {
    match doc.status {
        DocumentStatus::Unchanged => {
            tracing::debug!("  {} (unchanged)", doc.path.display());
        }
        DocumentStatus::Changed => {
            println!(
                "✅ {} ({} fragment(s))",
                doc.path.display(),
                doc.fragments_changed
            );
        }
        DocumentStatus::Previewed => {
            println!(
                "💡 {} ({} fragment(s) would change)",
                doc.path.display(),
                doc.fragments_changed
            );
            for change in &doc.changes {
                println!("  --- {} #{}", change.field, change.index);
                println!("  - {}", change.before);
                println!("  + {}", change.after);
            }
        }
        DocumentStatus::Failed => {
            println!(
                "❌ {}: {}",
                doc.path.display(),
                doc.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
