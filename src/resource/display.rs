//! Display helpers
//!
//! Turns raw list responses into records and records into table rows.

use super::model::{ResourceKind, ResourceRecord};
use super::registry::ResourceDef;
use crate::api::error::{ApiError, ApiResult};
use serde_json::Value;

/// Extract the record array from a list response using `response_path`
pub fn extract_records(
    response: &Value,
    kind: ResourceKind,
    resource_def: &ResourceDef,
) -> ApiResult<Vec<ResourceRecord>> {
    let mut current = response;
    if !resource_def.response_path.is_empty() {
        for part in resource_def.response_path.split('.') {
            current = current.get(part).ok_or_else(|| {
                ApiError::Decode(format!("list response has no '{}'", resource_def.response_path))
            })?;
        }
    }

    let Some(raw_items) = current.as_array() else {
        return Err(ApiError::Decode(format!(
            "expected a list of {}",
            resource_def.display_name.to_lowercase()
        )));
    };

    raw_items
        .iter()
        .map(|item| ResourceRecord::from_value(kind, item.clone()).map_err(ApiError::from))
        .collect()
}

/// Record as JSON with derived display fields added
pub fn display_row(record: &ResourceRecord) -> Value {
    let mut row = record.to_value();

    if let Value::Object(ref mut map) = row {
        match record {
            ResourceRecord::User(user) => {
                let role = if user.is_superuser { "Superuser" } else { "User" };
                map.insert("role_display".to_string(), Value::String(role.to_string()));
                let status = if user.is_active { "Active" } else { "Inactive" };
                map.insert("status_display".to_string(), Value::String(status.to_string()));
            }
            ResourceRecord::Questionnaire(q) => {
                let answer = match q.answer {
                    Some(true) => "Yes",
                    Some(false) => "No",
                    None => "N/A",
                };
                map.insert("answer_display".to_string(), Value::String(answer.to_string()));
                if let Some(date) = q.notification_date {
                    map.insert(
                        "notification_date_short".to_string(),
                        Value::String(date.format("%Y-%m-%d").to_string()),
                    );
                }
            }
            ResourceRecord::Item(_) | ResourceRecord::Mentor(_) => {}
        }
    }

    row
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        let next = if let Ok(idx) = part.parse::<usize>() {
            current.get(idx)
        } else {
            current.get(part)
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) if s.is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::registry::get_resource;
    use serde_json::json;

    #[test]
    fn test_extract_paginated_envelope() {
        let response = json!({
            "data": [{"id": "a", "title": "First"}, {"id": "b", "title": "Second"}],
            "count": 2
        });
        let records =
            extract_records(&response, ResourceKind::Item, get_resource(ResourceKind::Item))
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label(), "Second");
    }

    #[test]
    fn test_extract_bare_array() {
        let response = json!([{"id": "m1", "mentor_email": "a@b.com"}]);
        let records =
            extract_records(&response, ResourceKind::Mentor, get_resource(ResourceKind::Mentor))
                .unwrap();
        assert_eq!(records[0].label(), "a@b.com");
    }

    #[test]
    fn test_extract_wrong_shape_is_decode_error() {
        let response = json!({"unexpected": true});
        let err =
            extract_records(&response, ResourceKind::Mentor, get_resource(ResourceKind::Mentor))
                .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_questionnaire_answer_display() {
        let record = ResourceRecord::from_value(
            ResourceKind::Questionnaire,
            json!({"id": "q", "question": "Ready?", "answer": false}),
        )
        .unwrap();
        let row = display_row(&record);
        assert_eq!(extract_json_value(&row, "answer_display"), "No");
        assert_eq!(extract_json_value(&row, "notification_date_short"), "-");
    }

    #[test]
    fn test_extract_json_value_paths() {
        let value = json!({"a": {"b": [1, 2]}, "empty": ""});
        assert_eq!(extract_json_value(&value, "a.b.1"), "2");
        assert_eq!(extract_json_value(&value, "a.b"), "[2 items]");
        assert_eq!(extract_json_value(&value, "a.missing"), "-");
        assert_eq!(extract_json_value(&value, "empty"), "-");
    }
}
