use crate::config::API_KEY_ENV_VAR;
use crate::core::page_fetcher::DEFAULT_STATS_ENDPOINT;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::str::FromStr;

/// Years given on the command line, e.g. `2021,2023` or `2018-2022`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct YearList(pub Vec<i32>);

impl FromStr for YearList {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        validation::parse_years(s).map(YearList)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "stats-etl")]
#[command(about = "Collect per-game player stats for one or more seasons")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_STATS_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, env = API_KEY_ENV_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, help = "Years to collect, e.g. 2023 or 2019-2022,2024")]
    pub years: YearList,

    #[arg(long, default_value = "0", help = "Seconds to wait between pages")]
    pub sleep: f64,

    #[arg(long, help = "Collect years concurrently on this many workers")]
    pub workers: Option<usize>,

    #[arg(long, help = "HTTP request timeout in seconds")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "csv")]
    pub formats: Vec<String>,

    #[arg(long, default_value = "stats")]
    pub file_stem: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory per phase")]
    pub monitor: bool,

    #[arg(long, help = "Show a per-year progress bar")]
    pub progress: bool,

    #[arg(long, help = "Fail when any year stops paginating early")]
    pub strict: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn years(&self) -> &[i32] {
        &self.years.0
    }

    fn sleep_seconds(&self) -> f64 {
        self.sleep
    }

    fn workers(&self) -> Option<usize> {
        self.workers
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn verbose(&self) -> bool {
        self.verbose
    }

    fn show_progress(&self) -> bool {
        self.progress
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn file_stem(&self) -> &str {
        &self.file_stem
    }

    fn strict(&self) -> bool {
        self.strict
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        let api_key = validation::validate_required_field("api_key", &self.api_key)?;
        validation::validate_api_key("api_key", api_key)?;
        validation::validate_years("years", &self.years.0)?;
        validation::validate_sleep("sleep", self.sleep)?;
        validation::validate_workers("workers", self.workers)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("formats", &self.formats)?;
        validation::validate_non_empty_string("file_stem", &self.file_stem)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["stats-etl", "--api-key", "secret"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--years", "2023"]);

        assert_eq!(config.api_endpoint, DEFAULT_STATS_ENDPOINT);
        assert_eq!(config.years(), &[2023]);
        assert_eq!(config.sleep_seconds(), 0.0);
        assert_eq!(config.workers(), None);
        assert_eq!(config.output_formats(), &["csv".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_year_ranges_and_workers() {
        let config = parse(&[
            "--years",
            "2019-2021,2023",
            "--workers",
            "2",
            "--sleep",
            "0.5",
            "--formats",
            "csv,json",
        ]);

        assert_eq!(config.years(), &[2019, 2020, 2021, 2023]);
        assert_eq!(config.workers(), Some(2));
        assert_eq!(config.sleep_seconds(), 0.5);
        assert_eq!(config.output_formats(), &["csv".to_string(), "json".to_string()]);
    }

    #[test]
    fn test_invalid_year_spec_is_rejected() {
        let result = CliConfig::try_parse_from(["stats-etl", "--years", "last-year"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_catches_bad_values() {
        let mut config = parse(&["--years", "2023", "--sleep=-1"]);
        assert!(config.validate().is_err());

        config.sleep = 0.0;
        config.formats = vec!["xml".to_string()];
        assert!(config.validate().is_err());

        config.formats = vec!["tsv".to_string()];
        config.api_key = None;
        assert!(matches!(
            config.validate(),
            Err(EtlError::MissingConfigError { .. })
        ));
    }
}
