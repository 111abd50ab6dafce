use crate::core::multi_year::MultiYearCollector;
use crate::core::page_fetcher::StatsClient;
use crate::core::year_collector::{CollectOptions, TokioThrottle};
use crate::core::{ConfigProvider, Pipeline, ResultTable, Storage, TransformResult};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Collects the configured years and writes them out in the configured formats.
pub struct StatsPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> StatsPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn collect_options(&self) -> CollectOptions {
        CollectOptions::default()
            .with_sleep_seconds(self.config.sleep_seconds())
            .with_workers(self.config.workers())
            .with_verbose(self.config.verbose())
            .with_progress(self.config.show_progress())
    }

    fn client(&self) -> Result<StatsClient> {
        let api_key = self
            .config
            .api_key()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "api_key".to_string(),
            })?;

        match self.config.timeout_seconds() {
            Some(seconds) => StatsClient::with_timeout(
                self.config.api_endpoint(),
                api_key,
                Duration::from_secs(seconds),
            ),
            None => Ok(StatsClient::new(self.config.api_endpoint(), api_key)),
        }
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Renders the table with a header row of [`ResultTable::columns`].
pub fn render_delimited(table: &ResultTable, delimiter: u8) -> Result<String> {
    let columns = table.columns();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for record in &table.records {
        writer.write_record(columns.iter().map(|c| cell(record.get(c))))?;
    }

    let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("failed to flush delimited output: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("delimited output is not UTF-8: {}", e),
    })
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for StatsPipeline<S, C> {
    async fn extract(&self) -> Result<ResultTable> {
        let client = self.client()?;
        let years = self.config.years();
        tracing::info!(
            "Collecting {} year(s) {:?} from {}",
            years.len(),
            years,
            client.endpoint()
        );

        let collector = MultiYearCollector::new(
            Arc::new(client),
            Arc::new(TokioThrottle),
            self.collect_options(),
        );
        let table = collector.collect(years).await?;

        for summary in &table.years {
            if summary.completion.is_exhausted() {
                tracing::info!(
                    "📅 {}: {} rows in {} pages",
                    summary.year,
                    summary.rows,
                    summary.pages
                );
            } else {
                tracing::warn!(
                    "📅 {}: {} rows in {} pages (incomplete: {:?})",
                    summary.year,
                    summary.rows,
                    summary.pages,
                    summary.completion
                );
            }
        }

        if self.config.strict() && !table.is_complete() {
            return Err(EtlError::IncompleteCollection {
                years: table.truncated_years(),
            });
        }

        Ok(table)
    }

    async fn transform(&self, table: ResultTable) -> Result<TransformResult> {
        let mut result = TransformResult {
            table,
            csv_output: None,
            tsv_output: None,
            json_output: None,
        };

        for format in self.config.output_formats() {
            match format.as_str() {
                "csv" => result.csv_output = Some(render_delimited(&result.table, b',')?),
                "tsv" => result.tsv_output = Some(render_delimited(&result.table, b'\t')?),
                "json" => result.json_output = Some(serde_json::to_string_pretty(&result.table.records)?),
                other => {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "output_formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported format. Valid formats: csv, tsv, json".to_string(),
                    })
                }
            }
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let stem = self.config.file_stem();
        let outputs = [
            ("csv", &result.csv_output),
            ("tsv", &result.tsv_output),
            ("json", &result.json_output),
        ];

        for (extension, content) in outputs {
            if let Some(content) = content {
                let file_name = format!("{}.{}", stem, extension);
                tracing::debug!("Writing {} ({} bytes)", file_name, content.len());
                self.storage.write_file(&file_name, content.as_bytes()).await?;
            }
        }

        // 每年的完成狀態一併寫出，讓下游知道哪些年份被截斷
        let summary = serde_json::to_string_pretty(&result.table.years)?;
        self.storage
            .write_file(&format!("{}_summary.json", stem), summary.as_bytes())
            .await?;

        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Completion, StatRecord, YearSummary};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|bytes| String::from_utf8(bytes.clone()).unwrap())
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        api_endpoint: String,
        api_key: Option<String>,
        years: Vec<i32>,
        output_formats: Vec<String>,
        strict: bool,
    }

    impl MockConfig {
        fn new(api_endpoint: String) -> Self {
            Self {
                api_endpoint,
                api_key: Some("test-key".to_string()),
                years: vec![2023],
                output_formats: vec!["csv".to_string(), "tsv".to_string(), "json".to_string()],
                strict: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn api_key(&self) -> Option<&str> {
            self.api_key.as_deref()
        }

        fn years(&self) -> &[i32] {
            &self.years
        }

        fn sleep_seconds(&self) -> f64 {
            0.0
        }

        fn workers(&self) -> Option<usize> {
            None
        }

        fn timeout_seconds(&self) -> Option<u64> {
            Some(5)
        }

        fn verbose(&self) -> bool {
            false
        }

        fn show_progress(&self) -> bool {
            false
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }

        fn file_stem(&self) -> &str {
            "stats"
        }

        fn strict(&self) -> bool {
            self.strict
        }
    }

    fn record(value: Value) -> StatRecord {
        StatRecord::new(value.as_object().cloned().unwrap())
    }

    fn sample_table() -> ResultTable {
        ResultTable {
            records: vec![
                record(json!({"id": 1, "min": "34", "pts": 30, "fg_pct": 0.5, "player_id": 237, "team_id": 14, "game_id": 9})),
                record(json!({"id": 2, "min": "12, garbage", "pts": null, "player_id": 15, "team_id": 14, "game_id": 9})),
            ],
            years: vec![YearSummary {
                year: 2023,
                rows: 2,
                pages: 1,
                completion: Completion::Exhausted,
            }],
        }
    }

    #[test]
    fn test_render_csv() {
        let csv = render_delimited(&sample_table(), b',').unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,min,pts,fg_pct,player_id,team_id,game_id");
        assert_eq!(lines[1], "1,34,30,0.5,237,14,9");
        assert_eq!(lines[2], "2,\"12, garbage\",,,15,14,9");
    }

    #[test]
    fn test_render_tsv() {
        let tsv = render_delimited(&sample_table(), b'\t').unwrap();
        assert!(tsv.starts_with("id\tmin\tpts\tfg_pct\tplayer_id\tteam_id\tgame_id\n"));
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_delimited(&ResultTable::default(), b',').unwrap(), "");
    }

    #[tokio::test]
    async fn test_extract_requires_api_key() {
        let mut config = MockConfig::new("http://localhost:1/stats".to_string());
        config.api_key = None;
        let pipeline = StatsPipeline::new(MockStorage::default(), config);

        let result = pipeline.extract().await;

        assert!(matches!(result, Err(EtlError::MissingConfigError { field }) if field == "api_key"));
    }

    #[tokio::test]
    async fn test_extract_strict_rejects_truncated_year() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/stats");
            then.status(429).body("Too Many Requests");
        });

        let mut config = MockConfig::new(server.url("/stats"));
        config.strict = true;
        let pipeline = StatsPipeline::new(MockStorage::default(), config);

        let result = pipeline.extract().await;

        api_mock.assert();
        assert!(matches!(result, Err(EtlError::IncompleteCollection { years }) if years == vec![2023]));
    }

    #[tokio::test]
    async fn test_transform_and_load_all_formats() {
        let storage = MockStorage::default();
        let config = MockConfig::new("http://test.com".to_string());
        let pipeline = StatsPipeline::new(storage.clone(), config);

        let result = pipeline.transform(sample_table()).await.unwrap();
        assert!(result.csv_output.is_some());
        assert!(result.tsv_output.is_some());
        assert!(result.json_output.is_some());

        let output_path = pipeline.load(result).await.unwrap();
        assert_eq!(output_path, "test_output");

        let json_rows: Value = serde_json::from_str(&storage.get_file("stats.json").await.unwrap()).unwrap();
        assert_eq!(json_rows.as_array().unwrap().len(), 2);
        assert_eq!(json_rows[0]["player_id"], 237);

        assert!(storage.get_file("stats.csv").await.is_some());
        assert!(storage.get_file("stats.tsv").await.is_some());

        let summary: Value =
            serde_json::from_str(&storage.get_file("stats_summary.json").await.unwrap()).unwrap();
        assert_eq!(summary[0]["year"], 2023);
        assert_eq!(summary[0]["completion"]["status"], "exhausted");
    }

    #[tokio::test]
    async fn test_transform_only_requested_formats() {
        let mut config = MockConfig::new("http://test.com".to_string());
        config.output_formats = vec!["json".to_string()];
        let pipeline = StatsPipeline::new(MockStorage::default(), config);

        let result = pipeline.transform(sample_table()).await.unwrap();

        assert!(result.csv_output.is_none());
        assert!(result.tsv_output.is_none());
        assert!(result.json_output.is_some());
    }

    #[tokio::test]
    async fn test_transform_rejects_unknown_format() {
        let mut config = MockConfig::new("http://test.com".to_string());
        config.output_formats = vec!["parquet".to_string()];
        let pipeline = StatsPipeline::new(MockStorage::default(), config);

        assert!(pipeline.transform(sample_table()).await.is_err());
    }
}
