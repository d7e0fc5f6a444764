use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const TITLE_MAX_CHARS: usize = 200;
const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Offset-less layouts accepted for due dates, read as UTC.
const NAIVE_DUE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0}")]
    Invalid(String),

    #[error("invalid due date: {0:?}")]
    InvalidDueDate(String),

    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),

    #[error("unknown status: {0:?}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ModelError::UnknownPriority(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl FromStr for Status {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "completed" => Ok(Status::Completed),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: Status,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDeadlineRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Option<Status>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeadline {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: Status,
}

impl NewDeadlineRequest {
    pub fn validate(self) -> Result<NewDeadline, ModelError> {
        let title = validate_title(self.title)?;
        let description = validate_description(self.description)?;
        let due_date = parse_due_date(&self.due_date)?;

        Ok(NewDeadline {
            title,
            description,
            due_date,
            priority: self.priority,
            status: self.status.unwrap_or_default(),
        })
    }
}

/// `description: null` clears the field, an absent `description` keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeadlineRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadlinePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl UpdateDeadlineRequest {
    pub fn validate(self) -> Result<DeadlinePatch, ModelError> {
        let title = self.title.map(validate_title).transpose()?;
        let description = match self.description {
            Some(d) => Some(validate_description(d)?),
            None => None,
        };
        let due_date = self.due_date.as_deref().map(parse_due_date).transpose()?;

        Ok(DeadlinePatch {
            title,
            description,
            due_date,
            priority: self.priority,
            status: self.status,
        })
    }
}

impl DeadlinePatch {
    pub fn apply(self, deadline: &mut Deadline) {
        if let Some(title) = self.title {
            deadline.title = title;
        }
        if let Some(description) = self.description {
            deadline.description = description;
        }
        if let Some(due_date) = self.due_date {
            deadline.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            deadline.priority = priority;
        }
        if let Some(status) = self.status {
            deadline.status = status;
        }
    }
}

/// Parses a due date from request or storage text.
///
/// RFC 3339 with any offset is normalized to UTC. Offset-less
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]` is taken as UTC.
pub fn parse_due_date(text: &str) -> Result<DateTime<Utc>, ModelError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModelError::Invalid("due_date is required".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_DUE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ModelError::InvalidDueDate(text.to_string()))
}

/// Storage form of a timestamp: RFC 3339, UTC, millisecond precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn validate_title(title: String) -> Result<String, ModelError> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(ModelError::Invalid("Title is required".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ModelError::Invalid("Title is too long".to_string()));
    }
    Ok(title)
}

fn validate_description(description: Option<String>) -> Result<Option<String>, ModelError> {
    match description {
        Some(d) if d.chars().count() > DESCRIPTION_MAX_CHARS => {
            Err(ModelError::Invalid("Description is too long".to_string()))
        }
        Some(d) if d.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_date_accepts_rfc3339_and_local_input() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_due_date("2025-06-01T12:00:00Z").unwrap(), expected);
        assert_eq!(parse_due_date("2025-06-01T12:00:00.000Z").unwrap(), expected);
        assert_eq!(parse_due_date("2025-06-01T14:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_due_date("2025-06-01T12:00").unwrap(), expected);
        assert_eq!(parse_due_date(" 2025-06-01T12:00:00 ").unwrap(), expected);
    }

    #[test]
    fn due_date_rejects_garbage() {
        assert!(matches!(parse_due_date(""), Err(ModelError::Invalid(_))));
        assert!(matches!(parse_due_date("next tuesday"), Err(ModelError::InvalidDueDate(_))));
        assert!(matches!(parse_due_date("2025-13-01T00:00"), Err(ModelError::InvalidDueDate(_))));
    }

    #[test]
    fn timestamps_round_trip_through_storage_text() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let text = format_timestamp(&ts);
        assert_eq!(text, "2024-02-29T23:59:59.000Z");
        assert_eq!(parse_due_date(&text).unwrap(), ts);
    }

    #[test]
    fn new_request_defaults() {
        let req: NewDeadlineRequest = serde_json::from_value(serde_json::json!({
            "title": "  Tax return ",
            "due_date": "2025-04-15T23:59"
        }))
        .unwrap();
        let new = req.validate().unwrap();
        assert_eq!(new.title, "Tax return");
        assert_eq!(new.priority, Priority::Medium);
        assert_eq!(new.status, Status::Pending);
        assert_eq!(new.description, None);
    }

    #[test]
    fn new_request_limits() {
        let blank = NewDeadlineRequest {
            title: "   ".to_string(),
            description: None,
            due_date: "2025-04-15T23:59".to_string(),
            priority: Priority::Low,
            status: None,
        };
        assert!(blank.validate().is_err());

        let long = NewDeadlineRequest {
            title: "x".repeat(TITLE_MAX_CHARS + 1),
            description: None,
            due_date: "2025-04-15T23:59".to_string(),
            priority: Priority::Low,
            status: None,
        };
        assert!(long.validate().is_err());

        let wordy = NewDeadlineRequest {
            title: "ok".to_string(),
            description: Some("d".repeat(DESCRIPTION_MAX_CHARS + 1)),
            due_date: "2025-04-15T23:59".to_string(),
            priority: Priority::Low,
            status: None,
        };
        assert!(wordy.validate().is_err());
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let cleared: UpdateDeadlineRequest =
            serde_json::from_value(serde_json::json!({ "description": null })).unwrap();
        assert_eq!(cleared.validate().unwrap().description, Some(None));

        let untouched: UpdateDeadlineRequest =
            serde_json::from_value(serde_json::json!({ "status": "completed" })).unwrap();
        let patch = untouched.validate().unwrap();
        assert_eq!(patch.description, None);
        assert_eq!(patch.status, Some(Status::Completed));
    }

    #[test]
    fn unknown_enum_values_fail() {
        assert!("urgent".parse::<Priority>().is_err());
        assert!("archived".parse::<Status>().is_err());
        assert!(serde_json::from_str::<Priority>("\"HIGH\"").is_err());
    }
}
