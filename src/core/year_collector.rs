use crate::core::{PageSource, Throttle};
use crate::domain::model::{Completion, PageOutcome, YearTable};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

/// Settings shared by every year of a collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Pause before every page after the first.
    pub sleep: Duration,
    /// `None` or `Some(0)` collects years one after another.
    pub workers: Option<usize>,
    pub verbose: bool,
    pub show_progress: bool,
}

impl CollectOptions {
    pub fn with_sleep_seconds(mut self, seconds: f64) -> Self {
        self.sleep = if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds)
        } else {
            Duration::ZERO
        };
        self
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub(crate) fn pool_size(&self) -> Option<usize> {
        self.workers.filter(|n| *n > 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioThrottle;

#[async_trait]
impl Throttle for TokioThrottle {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Follows the cursor chain for one year until the API runs out of pages.
///
/// A non-2xx page stops pagination; the rows gathered so far are returned
/// with a [`Completion::Truncated`] marker instead of an error.
pub async fn collect_year<S, T>(
    source: &S,
    throttle: &T,
    year: i32,
    options: &CollectOptions,
) -> Result<YearTable>
where
    S: PageSource + ?Sized,
    T: Throttle + ?Sized,
{
    let mut records = Vec::new();
    let mut pages = 0usize;
    let mut cursor = 0u64;
    let mut requested = HashSet::from([cursor]);

    let completion = loop {
        if pages > 0 && !options.sleep.is_zero() {
            throttle.pause(options.sleep).await;
        }

        let outcome = source.fetch_page(year, cursor, options.verbose).await?;
        pages += 1;

        let next = match outcome {
            PageOutcome::Page(page) => {
                records.extend(page.records);
                page.next_cursor
            }
            PageOutcome::Exhausted => None,
            PageOutcome::TransportFault(fault) => {
                tracing::warn!(
                    "⚠️ year {} stopped after {} rows: {}",
                    year,
                    records.len(),
                    fault
                );
                break Completion::Truncated { fault };
            }
        };

        if options.verbose {
            tracing::info!("year={}, iteration {}", year, pages);
        }

        match next {
            // 游標回到已請求過的位置會無限循環
            Some(next) if !requested.insert(next) => {
                return Err(EtlError::MalformedResponse {
                    year,
                    cursor,
                    reason: format!("next_cursor {} was already requested", next),
                });
            }
            Some(next) => cursor = next,
            None => break Completion::Exhausted,
        }
    };

    tracing::debug!("year {} collected: {} rows in {} pages", year, records.len(), pages);

    Ok(YearTable {
        year,
        records,
        pages,
        completion,
    })
}
