//! Best-effort public holiday enrichment for the events feed.
//!
//! Holidays come from the Nager.Date public API. Any failure (transport,
//! non-2xx, bad payload) degrades to a fixed national list, so the calendar
//! keeps rendering familiar dates while offline.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Marker color that tells holiday entries apart from user events.
pub const HOLIDAY_COLOR: &str = "#ff6666";

const NAGER_BASE_URL: &str = "https://date.nager.at";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One public holiday as served by Nager.Date.
#[derive(Debug, Deserialize)]
struct PublicHoliday {
    date: NaiveDate,
    #[serde(rename = "localName")]
    local_name: String,
}

/// A read-only calendar entry derived from a holiday; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayEntry {
    pub title: String,
    pub start: String,
    pub all_day: bool,
    pub color: String,
}

impl HolidayEntry {
    fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            start: date.format("%Y-%m-%d").to_string(),
            all_day: true,
            color: HOLIDAY_COLOR.to_string(),
        }
    }
}

/// Client for the public holiday API.
#[derive(Debug, Clone)]
pub struct HolidayClient {
    http: reqwest::Client,
    base_url: String,
    country: String,
}

impl HolidayClient {
    /// Client against the public Nager.Date service.
    pub fn new(country: impl Into<String>) -> Result<Self> {
        Self::with_base_url(NAGER_BASE_URL, country)
    }

    /// Client against a custom endpoint; tests point this at a mock server.
    pub fn with_base_url(base_url: impl Into<String>, country: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            country: country.into(),
        })
    }

    /// Public holidays for one year, shaped as calendar entries.
    ///
    /// Never fails; every error path falls back to the fixed list.
    pub async fn holidays_for_year(&self, year: i32) -> Vec<HolidayEntry> {
        match self.fetch(year).await {
            Ok(holidays) if !holidays.is_empty() => holidays
                .into_iter()
                .map(|holiday| HolidayEntry::new(holiday.local_name, holiday.date))
                .collect(),
            Ok(_) => {
                warn!("Holiday API returned no holidays for {}, using fallback list", year);
                fallback_holidays(year)
            }
            Err(e) => {
                warn!("Failed to fetch holidays for {}: {}, using fallback list", year, e);
                fallback_holidays(year)
            }
        }
    }

    async fn fetch(&self, year: i32) -> Result<Vec<PublicHoliday>> {
        let url = format!(
            "{}/api/v3/PublicHolidays/{}/{}",
            self.base_url,
            year,
            urlencoding::encode(&self.country)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Holiday API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "Holiday API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse holiday response: {}", e)))
    }
}

/// Fixed national holidays used when the API is unreachable.
fn fallback_holidays(year: i32) -> Vec<HolidayEntry> {
    [
        ("Republic Day", 1, 26),
        ("Holi", 3, 14),
        ("Independence Day", 8, 15),
        ("Gandhi Jayanti", 10, 2),
        ("Diwali", 10, 21),
        ("Christmas", 12, 25),
    ]
    .into_iter()
    .filter_map(|(name, month, day)| {
        NaiveDate::from_ymd_opt(year, month, day).map(|date| HolidayEntry::new(name, date))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetched_holidays_become_calendar_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/PublicHolidays/2024/IN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"date": "2024-01-26", "localName": "Republic Day", "name": "Republic Day"},
                {"date": "2024-08-15", "localName": "Independence Day", "name": "Independence Day"}
            ])))
            .mount(&server)
            .await;

        let client = HolidayClient::with_base_url(server.uri(), "IN").unwrap();
        let entries = client.holidays_for_year(2024).await;

        assert_eq!(
            entries,
            vec![
                HolidayEntry {
                    title: "Republic Day".to_string(),
                    start: "2024-01-26".to_string(),
                    all_day: true,
                    color: HOLIDAY_COLOR.to_string(),
                },
                HolidayEntry {
                    title: "Independence Day".to_string(),
                    start: "2024-08-15".to_string(),
                    all_day: true,
                    color: HOLIDAY_COLOR.to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HolidayClient::with_base_url(server.uri(), "IN").unwrap();
        let entries = client.holidays_for_year(2025).await;

        assert_eq!(entries, fallback_holidays(2025));
        assert_eq!(entries.len(), 6);
    }

    #[tokio::test]
    async fn test_bad_payload_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HolidayClient::with_base_url(server.uri(), "IN").unwrap();
        assert_eq!(client.holidays_for_year(2025).await, fallback_holidays(2025));
    }

    #[tokio::test]
    async fn test_empty_response_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = HolidayClient::with_base_url(server.uri(), "IN").unwrap();
        assert_eq!(client.holidays_for_year(2026).await, fallback_holidays(2026));
    }

    #[test]
    fn test_fallback_entries_are_all_day_markers() {
        let entries = fallback_holidays(2024);
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].title, "Republic Day");
        assert_eq!(entries[0].start, "2024-01-26");
        assert!(entries.iter().all(|e| e.all_day && e.color == HOLIDAY_COLOR));
    }
}
