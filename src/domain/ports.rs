use crate::domain::model::{PageOutcome, ResultTable, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Fetches one page of a year's stats starting at `cursor`.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, year: i32, cursor: u64, verbose: bool) -> Result<PageOutcome>;
}

/// Pause between page requests.
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn years(&self) -> &[i32];
    fn sleep_seconds(&self) -> f64;
    fn workers(&self) -> Option<usize>;
    fn timeout_seconds(&self) -> Option<u64>;
    fn verbose(&self) -> bool;
    fn show_progress(&self) -> bool;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn file_stem(&self) -> &str;
    fn strict(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ResultTable>;
    async fn transform(&self, table: ResultTable) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
