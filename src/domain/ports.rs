use crate::domain::model::{FarmSnapshot, Lot, Plan, Product, RationReport};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Key/value file persistence for exports and the session file.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Removing a file that does not exist is not an error.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn report_filename(&self) -> &str;
    fn fallback_policy(&self) -> crate::core::resolver::FallbackPolicy;
}

/// Read side of the farm backend as the report pipeline sees it.
#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn fetch_lots(&self) -> Result<Vec<Lot>>;
    async fn fetch_plan_for_animal(&self, animal_id: &str) -> Result<Option<Plan>>;
    async fn fetch_products(&self) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<FarmSnapshot>;
    async fn transform(&self, snapshot: FarmSnapshot) -> Result<RationReport>;
    async fn load(&self, report: RationReport) -> Result<String>;
}
