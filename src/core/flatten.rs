use crate::domain::model::StatRecord;
use serde_json::Value;
use thiserror::Error;

/// Nested objects replaced by `<key>_id` columns.
pub const NESTED_KEYS: [&str; 3] = ["player", "team", "game"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlattenError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no '{0}' object")]
    MissingNested(&'static str),

    #[error("'{0}' object has no 'id'")]
    MissingId(&'static str),
}

/// Replaces `player`, `team` and `game` with their ids.
///
/// Remaining fields keep their API order; the id columns are appended.
pub fn flatten_record(value: Value) -> Result<StatRecord, FlattenError> {
    let Value::Object(mut data) = value else {
        return Err(FlattenError::NotAnObject);
    };

    let mut ids = Vec::with_capacity(NESTED_KEYS.len());
    for key in NESTED_KEYS {
        let id = match data.get(key) {
            Some(Value::Object(nested)) => nested
                .get("id")
                .cloned()
                .ok_or(FlattenError::MissingId(key))?,
            _ => return Err(FlattenError::MissingNested(key)),
        };
        ids.push((key, id));
    }

    for (key, id) in ids {
        data.shift_remove(key);
        data.insert(format!("{}_id", key), id);
    }

    Ok(StatRecord::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stat_line() -> Value {
        json!({
            "id": 9001,
            "min": "32",
            "pts": 27,
            "player": {"id": 237, "first_name": "LeBron", "last_name": "James"},
            "team": {"id": 14, "abbreviation": "LAL"},
            "game": {"id": 1038184, "date": "2023-10-24"},
            "reb": 8
        })
    }

    #[test]
    fn test_flatten_extracts_ids_and_drops_objects() {
        let record = flatten_record(stat_line()).unwrap();

        assert_eq!(record.player_id(), Some(237));
        assert_eq!(record.team_id(), Some(14));
        assert_eq!(record.game_id(), Some(1038184));
        for key in NESTED_KEYS {
            assert!(record.get(key).is_none(), "{} should be dropped", key);
        }
        assert!(record.data.values().all(|v| !v.is_object()));
    }

    #[test]
    fn test_flatten_preserves_column_order() {
        let record = flatten_record(stat_line()).unwrap();
        let columns: Vec<&str> = record.data.keys().map(String::as_str).collect();

        assert_eq!(
            columns,
            vec!["id", "min", "pts", "reb", "player_id", "team_id", "game_id"]
        );
    }

    #[test]
    fn test_flatten_missing_nested_object() {
        let mut line = stat_line();
        line.as_object_mut().unwrap().remove("team");

        assert_eq!(
            flatten_record(line),
            Err(FlattenError::MissingNested("team"))
        );
    }

    #[test]
    fn test_flatten_nested_without_id() {
        let mut line = stat_line();
        line["game"] = json!({"date": "2023-10-24"});

        assert_eq!(flatten_record(line), Err(FlattenError::MissingId("game")));
    }

    #[test]
    fn test_flatten_rejects_non_object() {
        assert_eq!(flatten_record(json!([1, 2])), Err(FlattenError::NotAnObject));
    }
}
