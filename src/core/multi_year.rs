use crate::core::page_fetcher::{StatsClient, DEFAULT_STATS_ENDPOINT};
use crate::core::year_collector::{collect_year, CollectOptions, TokioThrottle};
use crate::core::{PageSource, Throttle};
use crate::domain::model::{ResultTable, YearTable};
use crate::utils::error::{EtlError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Collects several years, one after another or on a bounded pool of tasks.
pub struct MultiYearCollector<S: ?Sized, T: ?Sized> {
    source: Arc<S>,
    throttle: Arc<T>,
    options: CollectOptions,
}

impl<S, T> MultiYearCollector<S, T>
where
    S: PageSource + ?Sized + 'static,
    T: Throttle + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, throttle: Arc<T>, options: CollectOptions) -> Self {
        Self {
            source,
            throttle,
            options,
        }
    }

    /// Rows of every year in `years` order. Any failing year fails the call.
    pub async fn collect(&self, years: &[i32]) -> Result<ResultTable> {
        let progress = self.progress_bar(years.len());

        let outcome = match self.options.pool_size() {
            None => self.collect_sequential(years, &progress).await,
            Some(workers) => self.collect_pooled(years, workers, &progress).await,
        };

        match outcome {
            Ok(tables) => {
                progress.finish_and_clear();
                Ok(ResultTable::from_years(tables))
            }
            Err(e) => {
                progress.abandon_with_message("collection failed");
                Err(e)
            }
        }
    }

    async fn collect_sequential(&self, years: &[i32], progress: &ProgressBar) -> Result<Vec<YearTable>> {
        let mut tables = Vec::with_capacity(years.len());
        for &year in years {
            let table = collect_year(&*self.source, &*self.throttle, year, &self.options).await?;
            progress.set_message(format!("{} done", year));
            progress.inc(1);
            tables.push(table);
        }
        Ok(tables)
    }

    async fn collect_pooled(
        &self,
        years: &[i32],
        workers: usize,
        progress: &ProgressBar,
    ) -> Result<Vec<YearTable>> {
        // 工作數不超過年份數，避免超出 Semaphore 上限
        let workers = workers.min(years.len().max(1));
        tracing::debug!("collecting {} years on {} workers", years.len(), workers);

        let permits = Arc::new(Semaphore::new(workers));
        let mut handles: Vec<(i32, JoinHandle<Result<YearTable>>)> = Vec::with_capacity(years.len());

        for &year in years {
            let source = Arc::clone(&self.source);
            let throttle = Arc::clone(&self.throttle);
            let options = self.options.clone();
            let permits = Arc::clone(&permits);
            let progress = progress.clone();

            let handle = tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| EtlError::WorkerError {
                        year,
                        message: e.to_string(),
                    })?;
                let table = collect_year(&*source, &*throttle, year, &options).await?;
                progress.set_message(format!("{} done", year));
                progress.inc(1);
                Ok(table)
            });
            handles.push((year, handle));
        }

        // 依原始年份順序收集；任一年份失敗就中止其餘工作
        let mut tables = Vec::with_capacity(handles.len());
        let mut pending = handles.into_iter();
        while let Some((year, handle)) = pending.next() {
            let joined = handle.await.map_err(|e| EtlError::WorkerError {
                year,
                message: e.to_string(),
            });
            match joined.and_then(|result| result) {
                Ok(table) => tables.push(table),
                Err(e) => {
                    for (_, rest) in pending.by_ref() {
                        rest.abort();
                    }
                    tracing::error!("❌ year {} failed, aborting remaining workers", year);
                    return Err(e);
                }
            }
        }
        Ok(tables)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} years {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(len as u64);
        bar.set_style(style);
        bar
    }
}

/// Collects `years` from the public stats endpoint with `api_key`.
pub async fn collect_years(api_key: &str, years: &[i32], options: CollectOptions) -> Result<ResultTable> {
    let source = Arc::new(StatsClient::new(DEFAULT_STATS_ENDPOINT, api_key));
    MultiYearCollector::new(source, Arc::new(TokioThrottle), options)
        .collect(years)
        .await
}
