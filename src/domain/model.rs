use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// One flattened stat line: the API's scalar fields plus `player_id`,
/// `team_id` and `game_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatRecord {
    pub data: Map<String, Value>,
}

impl StatRecord {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    pub fn player_id(&self) -> Option<i64> {
        self.data.get("player_id").and_then(Value::as_i64)
    }

    pub fn team_id(&self) -> Option<i64> {
        self.data.get("team_id").and_then(Value::as_i64)
    }

    pub fn game_id(&self) -> Option<i64> {
        self.data.get("game_id").and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<StatRecord>,
    pub next_cursor: Option<u64>,
}

/// A non-2xx answer from the stats API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportFault {
    pub status: u16,
    pub cursor: u64,
    pub body: String,
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} at cursor {}", self.status, self.cursor)?;
        if !self.body.is_empty() {
            write!(f, ": {}", self.body)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Page(Page),
    /// Successful response with no rows and no further cursor.
    Exhausted,
    TransportFault(TransportFault),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion {
    /// The API reported no further pages.
    Exhausted,
    /// Pagination stopped because a page could not be fetched.
    Truncated { fault: TransportFault },
}

impl Completion {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Completion::Exhausted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearTable {
    pub year: i32,
    pub records: Vec<StatRecord>,
    pub pages: usize,
    pub completion: Completion,
}

impl YearTable {
    pub fn summary(&self) -> YearSummary {
        YearSummary {
            year: self.year,
            rows: self.records.len(),
            pages: self.pages,
            completion: self.completion.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub rows: usize,
    pub pages: usize,
    pub completion: Completion,
}

/// Rows of every requested year, concatenated in the order the years were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub records: Vec<StatRecord>,
    pub years: Vec<YearSummary>,
}

impl ResultTable {
    pub fn from_years(tables: Vec<YearTable>) -> Self {
        let mut result = ResultTable::default();
        for table in tables {
            result.years.push(table.summary());
            result.records.extend(table.records);
        }
        result
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names in first-seen order across all rows.
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for record in &self.records {
            for key in record.data.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    pub fn is_complete(&self) -> bool {
        self.years.iter().all(|y| y.completion.is_exhausted())
    }

    pub fn truncated_years(&self) -> Vec<i32> {
        self.years
            .iter()
            .filter(|y| !y.completion.is_exhausted())
            .map(|y| y.year)
            .collect()
    }
}

/// Rendered outputs handed from transform to load.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: ResultTable,
    pub csv_output: Option<String>,
    pub tsv_output: Option<String>,
    pub json_output: Option<String>,
}
