use crate::core::Pipeline;
use crate::domain::model::MigrationReport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a [`Pipeline`] through extract, transform and load.
pub struct MigrationEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> MigrationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<MigrationReport> {
        tracing::info!("🚀 Starting report SQL migration...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("🔍 Scanning report files...");
        let documents = self.pipeline.extract().await?;
        tracing::info!("📄 Found {} report files", documents.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("✏️ Rewriting embedded SQL...");
        let result = self.pipeline.transform(documents).await?;
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Saving migrated reports...");
        let report = self.pipeline.load(result).await?;
        self.monitor.log_stats("Load");

        let totals = &report.totals;
        tracing::info!(
            "📊 Scanned: {}, Changed: {}, Unchanged: {}, Failed: {}, Fragments: {}",
            totals.scanned,
            totals.changed,
            totals.unchanged,
            totals.failed,
            totals.fragments_rewritten
        );
        if report.has_failures() {
            tracing::warn!("⚠️ {} report(s) could not be migrated", totals.failed);
        }

        self.monitor.log_final_stats();
        Ok(report)
    }
}
