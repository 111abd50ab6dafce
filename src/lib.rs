pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LocalStorage, TomlConfig};

pub use core::{
    etl::EtlEngine,
    multi_year::{collect_years, MultiYearCollector},
    page_fetcher::{StatsClient, DEFAULT_STATS_ENDPOINT},
    pipeline::StatsPipeline,
    year_collector::{collect_year, CollectOptions, TokioThrottle},
};
pub use domain::model::{
    Completion, Page, PageOutcome, ResultTable, StatRecord, TransportFault, YearSummary, YearTable,
};
pub use utils::error::{EtlError, Result};
