use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting stats collection...");
        self.monitor.log_stats("start");

        // Extract
        let table = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} rows across {} year(s)",
            table.len(),
            table.years.len()
        );
        if !table.is_complete() {
            tracing::warn!(
                "⚠️ Pagination stopped early for years {:?}; output is partial",
                table.truncated_years()
            );
        }
        self.monitor.log_stats("extract");

        // Transform
        let rendered = self.pipeline.transform(table).await?;
        tracing::info!("Rendered {} columns", rendered.table.columns().len());
        self.monitor.log_stats("transform");

        // Load
        let output_path = self.pipeline.load(rendered).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
