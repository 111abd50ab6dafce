use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Malformed response for year {year} at cursor {cursor}: {reason}")]
    MalformedResponse { year: i32, cursor: u64, reason: String },

    #[error("Worker for year {year} failed: {message}")]
    WorkerError { year: i32, message: String },

    #[error("Collection incomplete for years {years:?}")]
    IncompleteCollection { years: Vec<i32> },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::IncompleteCollection { .. } => ErrorCategory::Network,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::MalformedResponse { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) | EtlError::WorkerError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 分頁中斷：已取得的資料仍然有效，可重跑
            EtlError::IncompleteCollection { .. } | EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::MalformedResponse { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::WorkerError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check network connectivity and the API endpoint, then retry",
            EtlError::IncompleteCollection { .. } => {
                "Increase --sleep to stay under the rate limit and rerun the truncated years"
            }
            EtlError::MalformedResponse { .. } | EtlError::SerializationError(_) => {
                "The API returned an unexpected payload; verify the endpoint points at the stats API"
            }
            EtlError::CsvError(_) | EtlError::ProcessingError { .. } => {
                "Try a different output format (--formats json)"
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the configuration value and run again",
            EtlError::IoError(_) => "Check that the output path exists and is writable",
            EtlError::WorkerError { .. } => "Rerun without --workers to collect years sequentially",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) if e.is_timeout() => "The stats API timed out".to_string(),
            EtlError::ApiError(_) => "Could not reach the stats API".to_string(),
            EtlError::MissingConfigError { field } => format!("Missing required setting '{}'", field),
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            EtlError::IncompleteCollection { years } => format!(
                "Pagination stopped early for {} year(s): {:?}",
                years.len(),
                years
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = EtlError::MissingConfigError {
            field: "api_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.user_friendly_message(), "Missing required setting 'api_key'");
    }

    #[test]
    fn test_incomplete_collection_is_recoverable() {
        let err = EtlError::IncompleteCollection {
            years: vec![2021, 2023],
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.severity() < ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("2 year(s)"));
    }

    #[test]
    fn test_malformed_response_display() {
        let err = EtlError::MalformedResponse {
            year: 2023,
            cursor: 42,
            reason: "record 3 has no 'game' object".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed response for year 2023 at cursor 42: record 3 has no 'game' object"
        );
    }
}
