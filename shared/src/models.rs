//! Calendar event data models and request/response payloads.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{Error, Result};

/// Title applied when a create request omits one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Marker color applied when a create request omits one.
pub const DEFAULT_COLOR: &str = "#3788d8";

/// A persisted calendar event.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub color: String,
    pub location: Option<String>,
    pub recurrence: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new event, after defaults and date parsing are applied.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub color: String,
    pub location: Option<String>,
    pub recurrence: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub color: Option<String>,
    pub location: Option<String>,
    pub recurrence: Option<String>,
}

/// Create event request payload.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all_day: Option<bool>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub location: Option<String>,
    pub recurrence: Option<String>,
}

/// Update event request payload; every field is optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all_day: Option<bool>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub location: Option<String>,
    pub recurrence: Option<String>,
}

/// Event response payload, shaped for the calendar widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub all_day: bool,
    pub description: Option<String>,
    pub color: String,
    pub location: Option<String>,
    pub recurrence: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.title,
            start: event.start_time.to_rfc3339(),
            end: event.end_time.to_rfc3339(),
            all_day: event.all_day,
            description: event.description,
            color: event.color,
            location: event.location,
            recurrence: event.recurrence,
            created_by: event.created_by.map(|id| id.to_string()),
            created_at: event.created_at.to_rfc3339(),
            updated_at: event.updated_at.to_rfc3339(),
        }
    }
}

/// Which side of a window a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a client-supplied event datetime (full datetime or bare date).
///
/// Offsets are normalized to UTC; datetimes without an offset are taken as
/// UTC. Seconds are optional and a space may stand in for the `T`. A bare
/// `YYYY-MM-DD` expands to the first second of the day for `Bound::Start`
/// and the last second for `Bound::End`, so date-only windows cover their
/// final day.
pub fn parse_event_datetime(value: &str, bound: Bound) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    // RFC 3339 requires seconds; calendar widgets sometimes omit them
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = match bound {
            Bound::Start => date.and_hms_opt(0, 0, 0).unwrap(),
            Bound::End => date.and_hms_opt(23, 59, 59).unwrap(),
        };
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    Err(Error::Validation(format!(
        "Invalid datetime '{}': expected ISO-8601 or YYYY-MM-DD",
        value
    )))
}

/// Colors must be `#rrggbb`, which is what the calendar widget emits.
fn validate_hex_color(value: &str) -> std::result::Result<(), ValidationError> {
    let mut chars = value.chars();
    if value.len() == 7 && chars.next() == Some('#') && chars.all(|c| c.is_ascii_hexdigit()) {
        return Ok(());
    }
    Err(ValidationError::new("hex_color"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let parsed = parse_event_datetime("2024-02-01T09:00:00+05:30", Bound::Start).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 1, 3, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_datetime_as_utc() {
        let parsed = parse_event_datetime("2024-02-01T09:00:00", Bound::Start).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_datetime_with_fraction() {
        let parsed = parse_event_datetime("2024-02-01T09:00:00.250", Bound::Start).unwrap();
        assert_eq!(parsed.timestamp_millis() % 1000, 250);
    }

    #[test]
    fn test_parse_secondless_datetime() {
        let parsed = parse_event_datetime("2024-02-01T09:00", Bound::Start).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());

        let parsed = parse_event_datetime("2024-02-01T09:00+05:30", Bound::Start).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 1, 3, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_space_separated_datetime() {
        let parsed = parse_event_datetime("2024-02-01 09:00:00", Bound::Start).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());

        let parsed = parse_event_datetime("2024-02-01 09:00", Bound::End).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_bare_date_expands_per_bound() {
        let start = parse_event_datetime("2024-02-01", Bound::Start).unwrap();
        let end = parse_event_datetime("2024-02-01", Bound::End).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_unparseable_datetime_is_validation_error() {
        let err = parse_event_datetime("next tuesday", Bound::Start).unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = parse_event_datetime("2024-13-45", Bound::Start).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_requests_accept_camel_case_fields() {
        let request: CreateEventRequest = serde_json::from_str(
            r##"{"title":"Standup","start":"2024-02-01","allDay":true,"color":"#aabbcc"}"##,
        )
        .unwrap();
        assert_eq!(request.title.as_deref(), Some("Standup"));
        assert_eq!(request.all_day, Some(true));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_color_must_be_hex() {
        let request: CreateEventRequest =
            serde_json::from_str(r#"{"start":"2024-02-01","color":"red"}"#).unwrap();
        assert!(request.validate().is_err());

        let request: UpdateEventRequest =
            serde_json::from_str(r##"{"color":"#12345g"}"##).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_response_uses_camel_case_and_rfc3339() {
        let event = Event {
            id: Uuid::new_v4(),
            title: "Standup".to_string(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap(),
            all_day: false,
            color: DEFAULT_COLOR.to_string(),
            location: None,
            recurrence: None,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap(),
        };

        let value = serde_json::to_value(EventResponse::from(event)).unwrap();
        assert_eq!(value["start"], "2024-02-01T09:00:00+00:00");
        assert_eq!(value["allDay"], false);
        assert!(value.get("all_day").is_none());
        assert_eq!(value["createdAt"], "2024-01-31T12:00:00+00:00");
    }
}
