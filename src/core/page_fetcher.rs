use crate::core::flatten::flatten_record;
use crate::core::PageSource;
use crate::domain::model::{Page, PageOutcome, TransportFault};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_STATS_ENDPOINT: &str = "https://api.balldontlie.io/v1/stats";
pub const PER_PAGE: u32 = 100;

// 錯誤回應只保留前段內容，避免日誌被整頁 HTML 灌爆
const FAULT_BODY_LIMIT: usize = 200;

/// `reqwest` client for the paginated `/stats` endpoint.
#[derive(Debug, Clone)]
pub struct StatsClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl StatsClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query parameters for one page of `year`.
    pub fn query_for(year: i32, cursor: u64) -> Result<Vec<(&'static str, String)>> {
        let (start_date, end_date) = season_bounds(year)?;
        Ok(vec![
            ("per_page", PER_PAGE.to_string()),
            ("cursor", cursor.to_string()),
            ("start_date", start_date.format("%Y-%m-%d").to_string()),
            ("end_date", end_date.format("%Y-%m-%d").to_string()),
        ])
    }
}

/// First and last calendar day of `year`.
pub fn season_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(EtlError::InvalidConfigValueError {
            field: "years".to_string(),
            value: year.to_string(),
            reason: "Year is outside the supported calendar range".to_string(),
        }),
    }
}

/// Turns a successful response body into a page of flattened records.
pub fn parse_page(body: Value, year: i32, cursor: u64) -> Result<PageOutcome> {
    let malformed = |reason: String| EtlError::MalformedResponse {
        year,
        cursor,
        reason,
    };

    let Value::Object(mut body) = body else {
        return Err(malformed("response body is not a JSON object".to_string()));
    };

    let items = match body.remove("data") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(malformed("'data' is not an array".to_string())),
        None => return Err(malformed("response has no 'data' field".to_string())),
    };

    // next_cursor 缺少、為 null 或為 0 都視為沒有下一頁
    let next_cursor = match body.get("meta").and_then(|meta| meta.get("next_cursor")) {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_u64() {
            Some(0) => None,
            Some(next) => Some(next),
            None => {
                return Err(malformed(format!(
                    "'next_cursor' is not a non-negative integer: {}",
                    value
                )))
            }
        },
    };

    if items.is_empty() && next_cursor.is_none() {
        return Ok(PageOutcome::Exhausted);
    }

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            flatten_record(item).map_err(|e| malformed(format!("record {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PageOutcome::Page(Page {
        records,
        next_cursor,
    }))
}

#[async_trait]
impl PageSource for StatsClient {
    async fn fetch_page(&self, year: i32, cursor: u64, verbose: bool) -> Result<PageOutcome> {
        let params = Self::query_for(year, cursor)?;

        tracing::debug!("GET {} year={} cursor={}", self.endpoint, year, cursor);
        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, self.api_key.as_str())
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > FAULT_BODY_LIMIT {
                let mut end = FAULT_BODY_LIMIT;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            let fault = TransportFault {
                status: status.as_u16(),
                cursor,
                body,
            };
            if verbose {
                tracing::warn!("❌ FAIL year={} cursor={}: {}", year, cursor, fault);
            }
            return Ok(PageOutcome::TransportFault(fault));
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;

        if verbose {
            let meta = body.get("meta").cloned().unwrap_or(Value::Null);
            tracing::info!("got cursor {} (year {}), meta: {}", cursor, year, meta);
        }

        parse_page(body, year, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(id: i64) -> Value {
        json!({
            "id": id,
            "pts": 12,
            "player": {"id": id * 10},
            "team": {"id": 3},
            "game": {"id": 500}
        })
    }

    #[test]
    fn test_query_for_year_and_cursor() {
        let params = StatsClient::query_for(2023, 5).unwrap();
        assert_eq!(
            params,
            vec![
                ("per_page", "100".to_string()),
                ("cursor", "5".to_string()),
                ("start_date", "2023-01-01".to_string()),
                ("end_date", "2023-12-31".to_string()),
            ]
        );
    }

    #[test]
    fn test_season_bounds_out_of_range() {
        assert!(season_bounds(i32::MAX).is_err());
    }

    #[test]
    fn test_parse_page_with_next_cursor() {
        let body = json!({"data": [line(1), line(2)], "meta": {"next_cursor": 77, "per_page": 100}});

        match parse_page(body, 2023, 0).unwrap() {
            PageOutcome::Page(page) => {
                assert_eq!(page.records.len(), 2);
                assert_eq!(page.next_cursor, Some(77));
                assert_eq!(page.records[1].player_id(), Some(20));
            }
            other => panic!("expected a page, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_page_without_meta_has_no_cursor() {
        let body = json!({"data": [line(1)]});

        match parse_page(body, 2023, 0).unwrap() {
            PageOutcome::Page(page) => assert_eq!(page.next_cursor, None),
            other => panic!("expected a page, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_page_null_and_zero_cursor_end_pagination() {
        for meta in [json!({"next_cursor": null}), json!({"next_cursor": 0})] {
            let body = json!({"data": [line(1)], "meta": meta});
            match parse_page(body, 2023, 9).unwrap() {
                PageOutcome::Page(page) => assert_eq!(page.next_cursor, None),
                other => panic!("expected a page, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_page_rejects_non_integer_cursor() {
        for bad in [json!("100"), json!(-3), json!(2.5), json!(true)] {
            let body = json!({"data": [line(1)], "meta": {"next_cursor": bad}});
            match parse_page(body, 2023, 0) {
                Err(EtlError::MalformedResponse { reason, .. }) => {
                    assert!(reason.contains("next_cursor"))
                }
                other => panic!("expected malformed response, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_empty_last_page_is_exhausted() {
        let body = json!({"data": [], "meta": {"per_page": 100}});
        assert_eq!(parse_page(body, 2023, 0).unwrap(), PageOutcome::Exhausted);
    }

    #[test]
    fn test_parse_page_malformed_record() {
        let body = json!({"data": [line(1), {"id": 2, "team": {"id": 1}, "game": {"id": 1}}]});

        match parse_page(body, 2021, 40) {
            Err(EtlError::MalformedResponse { year, cursor, reason }) => {
                assert_eq!(year, 2021);
                assert_eq!(cursor, 40);
                assert!(reason.contains("record 1"));
                assert!(reason.contains("player"));
            }
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_page_missing_data() {
        let body = json!({"meta": {"next_cursor": 4}});
        assert!(matches!(
            parse_page(body, 2023, 0),
            Err(EtlError::MalformedResponse { .. })
        ));
    }
}
