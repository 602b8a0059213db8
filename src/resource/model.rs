//! Resource Records
//!
//! Typed records returned by the mentorship API and the payloads sent back
//! on create and update.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Resource type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Item,
    User,
    Questionnaire,
    Mentor,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Item,
        ResourceKind::User,
        ResourceKind::Questionnaire,
        ResourceKind::Mentor,
    ];

    /// Registry key, also used as the command name
    pub fn key(self) -> &'static str {
        match self {
            Self::Item => "items",
            Self::User => "users",
            Self::Questionnaire => "questionnaires",
            Self::Mentor => "mentors",
        }
    }

    /// Singular display name ("Questionnaire")
    pub fn name(self) -> &'static str {
        match self {
            Self::Item => "Item",
            Self::User => "User",
            Self::Questionnaire => "Questionnaire",
            Self::Mentor => "Mentor",
        }
    }

    /// Parse a command argument. Accepts singular or plural, any case.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == key || kind.name().to_lowercase() == key)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record identifier
///
/// The API hands out UUID strings, but some payloads carry numeric ids.
/// Equality and hashing go through [`RecordId::normalized`] so `7` and `"7"`
/// name the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Numeric(i64),
    Text(String),
}

impl RecordId {
    pub fn normalized(&self) -> String {
        match self {
            Self::Numeric(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

fn default_true() -> bool {
    true
}

/// `null` and missing both become an empty string
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts naive timestamps, RFC 3339 and bare dates
fn flexible_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_datetime(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {}", raw)))
}

/// Parse the timestamp shapes the backend and the forms produce
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: RecordId,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written_answer: Option<String>,
    #[serde(
        default,
        deserialize_with = "flexible_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mentor {
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub mentor_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentee_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor_id: Option<RecordId>,
}

/// A record of any kind, as held in the page cache
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceRecord {
    Item(Item),
    User(User),
    Questionnaire(Questionnaire),
    Mentor(Mentor),
}

impl ResourceRecord {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Item(_) => ResourceKind::Item,
            Self::User(_) => ResourceKind::User,
            Self::Questionnaire(_) => ResourceKind::Questionnaire,
            Self::Mentor(_) => ResourceKind::Mentor,
        }
    }

    pub fn id(&self) -> &RecordId {
        match self {
            Self::Item(item) => &item.id,
            Self::User(user) => &user.id,
            Self::Questionnaire(q) => &q.id,
            Self::Mentor(mentor) => &mentor.id,
        }
    }

    /// Identifier the delete endpoint expects.
    ///
    /// Mentor rows are removed by the mentor's user id, not the row id.
    pub fn delete_id(&self) -> RecordId {
        match self {
            Self::Mentor(mentor) => mentor.mentor_id.clone().unwrap_or_else(|| mentor.id.clone()),
            other => other.id().clone(),
        }
    }

    /// Human readable name used in confirmation prompts
    pub fn label(&self) -> String {
        let label = match self {
            Self::Item(item) => item.title.clone(),
            Self::User(user) => user.email.clone(),
            Self::Questionnaire(q) => q.question.clone(),
            Self::Mentor(mentor) => mentor.mentor_email.clone(),
        };
        if label.trim().is_empty() {
            self.id().normalized()
        } else {
            label
        }
    }

    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::Item(item) => serde_json::to_value(item),
            Self::User(user) => serde_json::to_value(user),
            Self::Questionnaire(q) => serde_json::to_value(q),
            Self::Mentor(mentor) => serde_json::to_value(mentor),
        };
        value.unwrap_or(Value::Null)
    }

    /// Decode a raw API record as the given kind
    pub fn from_value(kind: ResourceKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ResourceKind::Item => Self::Item(serde_json::from_value(value)?),
            ResourceKind::User => Self::User(serde_json::from_value(value)?),
            ResourceKind::Questionnaire => Self::Questionnaire(serde_json::from_value(value)?),
            ResourceKind::Mentor => Self::Mentor(serde_json::from_value(value)?),
        })
    }
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCreate {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemUpdate {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserUpdate {
    pub email: String,
    pub full_name: Option<String>,
    /// Left out of the body when unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

/// Body for both questionnaire create and update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionnaireInput {
    pub question: String,
    pub answer: Option<bool>,
    pub written_answer: Option<String>,
    pub notification_date: Option<NaiveDateTime>,
}

/// Mentors are assigned by email; the email travels in the URL path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorAssign {
    pub mentor_email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateInput {
    Item(ItemCreate),
    User(UserCreate),
    Questionnaire(QuestionnaireInput),
    Mentor(MentorAssign),
}

impl CreateInput {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Item(_) => ResourceKind::Item,
            Self::User(_) => ResourceKind::User,
            Self::Questionnaire(_) => ResourceKind::Questionnaire,
            Self::Mentor(_) => ResourceKind::Mentor,
        }
    }
}

/// Update bodies. Mentors have no update endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateInput {
    Item(ItemUpdate),
    User(UserUpdate),
    Questionnaire(QuestionnaireInput),
}

impl UpdateInput {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Item(_) => ResourceKind::Item,
            Self::User(_) => ResourceKind::User,
            Self::Questionnaire(_) => ResourceKind::Questionnaire,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_ids_compare_normalized() {
        assert_eq!(RecordId::from(7), RecordId::from("7"));
        assert_eq!(RecordId::from(" abc "), RecordId::from("abc"));
        assert_ne!(RecordId::from(7), RecordId::from("8"));
    }

    #[test]
    fn test_record_id_deserializes_both_shapes() {
        let numeric: RecordId = serde_json::from_value(json!(42)).unwrap();
        let text: RecordId = serde_json::from_value(json!("42")).unwrap();
        assert!(matches!(numeric, RecordId::Numeric(42)));
        assert!(matches!(text, RecordId::Text(_)));
        assert_eq!(numeric, text);
    }

    #[test]
    fn test_kind_from_key_accepts_singular_and_plural() {
        assert_eq!(ResourceKind::from_key("mentors"), Some(ResourceKind::Mentor));
        assert_eq!(ResourceKind::from_key("Questionnaire"), Some(ResourceKind::Questionnaire));
        assert_eq!(ResourceKind::from_key("USERS"), Some(ResourceKind::User));
        assert_eq!(ResourceKind::from_key("widgets"), None);
    }

    #[test]
    fn test_questionnaire_decodes_backend_shape() {
        let value = json!({
            "id": "5b1c",
            "question": "How was your week?",
            "answer": null,
            "written_answer": "Busy",
            "notification_date": "2024-03-01T09:30:00",
            "user_id": "u1"
        });
        let record = ResourceRecord::from_value(ResourceKind::Questionnaire, value).unwrap();
        let ResourceRecord::Questionnaire(q) = record else {
            panic!("expected questionnaire");
        };
        assert_eq!(q.answer, None);
        assert_eq!(
            q.notification_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(9, 30, 0))
        );
    }

    #[test]
    fn test_mentor_null_email_becomes_empty() {
        let value = json!({"id": "m1", "mentor_email": null, "mentor_id": "u9"});
        let record = ResourceRecord::from_value(ResourceKind::Mentor, value).unwrap();
        assert_eq!(record.label(), "m1");
        assert_eq!(record.delete_id(), RecordId::from("u9"));
    }

    #[test]
    fn test_parse_datetime_shapes() {
        assert!(parse_datetime("2024-01-02").is_some());
        assert!(parse_datetime("2024-01-02 10:15").is_some());
        assert!(parse_datetime("2024-01-02T10:15:00Z").is_some());
        assert!(parse_datetime("next tuesday").is_none());
    }
}
