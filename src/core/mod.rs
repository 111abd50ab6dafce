pub mod etl;
pub mod flatten;
pub mod multi_year;
pub mod page_fetcher;
pub mod pipeline;
pub mod year_collector;

pub use crate::domain::model::{
    Completion, Page, PageOutcome, ResultTable, StatRecord, TransformResult, TransportFault,
    YearSummary, YearTable,
};
pub use crate::domain::ports::{ConfigProvider, PageSource, Pipeline, Storage, Throttle};
pub use crate::utils::error::Result;
