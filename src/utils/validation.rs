use crate::utils::error::{EtlError, Result};
use url::Url;

pub const OUTPUT_FORMATS: [&str; 3] = ["csv", "tsv", "json"];
pub const FIRST_SEASON: i32 = 1946;
pub const LAST_SEASON: i32 = 2100;
pub const MAX_WORKERS: usize = 256;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

/// The API key is sent verbatim as a header value.
pub fn validate_api_key(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if value.chars().any(|c| c.is_control()) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "<redacted>".to_string(),
            reason: "Value contains control characters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_years(field_name: &str, years: &[i32]) -> Result<()> {
    if years.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    for &year in years {
        validate_range(field_name, year, FIRST_SEASON, LAST_SEASON)?;
    }
    Ok(())
}

pub fn validate_sleep(field_name: &str, seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: seconds.to_string(),
            reason: "Sleep must be a non-negative number of seconds".to_string(),
        });
    }
    Ok(())
}

pub fn validate_workers(field_name: &str, workers: Option<usize>) -> Result<()> {
    match workers {
        Some(n) => validate_range(field_name, n, 0, MAX_WORKERS),
        None => Ok(()),
    }
}

pub fn validate_output_formats(field_name: &str, formats: &[String]) -> Result<()> {
    if formats.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    for format in formats {
        if !OUTPUT_FORMATS.contains(&format.as_str()) {
            return Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format.clone(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    OUTPUT_FORMATS.join(", ")
                ),
            });
        }
    }
    Ok(())
}

/// Parses `2021,2023` or `2019-2022` style year lists.
pub fn parse_years(spec: &str) -> Result<Vec<i32>> {
    let invalid = |part: &str, reason: &str| EtlError::InvalidConfigValueError {
        field: "years".to_string(),
        value: part.to_string(),
        reason: reason.to_string(),
    };

    let mut years = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: i32 = start.trim().parse().map_err(|_| invalid(part, "Invalid range start"))?;
                let end: i32 = end.trim().parse().map_err(|_| invalid(part, "Invalid range end"))?;
                if start > end {
                    return Err(invalid(part, "Range start is after range end"));
                }
                if i64::from(end) - i64::from(start) > i64::from(LAST_SEASON - FIRST_SEASON) {
                    return Err(invalid(part, "Range spans more seasons than exist"));
                }
                years.extend(start..=end);
            }
            None => years.push(part.parse().map_err(|_| invalid(part, "Not a year"))?),
        }
    }
    Ok(years)
}
