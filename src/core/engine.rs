use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting feeding report...");

        tracing::info!("Fetching lots and plans...");
        let snapshot = self.pipeline.extract().await?;
        tracing::info!(
            "Fetched {} lots, {} plans, {} products",
            snapshot.lots.len(),
            snapshot.plans.len(),
            snapshot.products.len()
        );

        tracing::info!("Resolving feeding stages...");
        let report = self.pipeline.transform(snapshot).await?;
        tracing::info!("Resolved {} lots", report.lines.len());
        if !report.skipped.is_empty() {
            tracing::warn!(
                "⚠️ {} lots skipped: {}",
                report.skipped.len(),
                report.skipped.join(", ")
            );
        }

        tracing::info!("Writing report...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Report saved to: {}", output_path);

        Ok(output_path)
    }
}
