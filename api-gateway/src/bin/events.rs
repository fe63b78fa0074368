//! Events API Lambda - CRUD operations for calendar events.
//!
//! Endpoints:
//! - GET /events - List events, optionally narrowed to a start/end window,
//!   merged with public holiday markers for the years in view
//! - POST /events/create - Create an event
//! - PUT|PATCH /events/{id} - Partially update an event
//! - DELETE /events/{id}/delete - Delete an event

use chrono::{Datelike, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use shared::auth::authenticated_user;
use shared::holidays::HolidayClient;
use shared::http::{error_response, json_response};
use shared::models::{
    parse_event_datetime, Bound, CreateEventRequest, EventChanges, EventResponse, NewEvent,
    UpdateEventRequest, DEFAULT_COLOR, DEFAULT_TITLE,
};
use shared::repository::{EventRepository, PgEventRepository};
use shared::{get_database_credentials, Config};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use validator::Validate;

/// Widest span of years holiday markers are fetched for in one request.
const MAX_HOLIDAY_YEAR_SPAN: i32 = 4;

/// Application state
struct AppState {
    events: Arc<dyn EventRepository>,
    holidays: HolidayClient,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env().map_err(|e| format!("Missing configuration: {}", e))?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let credentials = get_database_credentials(&secrets_client, &config.db_secret_arn)
            .await
            .map_err(|e| format!("Failed to get DB credentials: {}", e))?;

        let pool = shared::db::create_pool(&config, &credentials)
            .await
            .map_err(|e| format!("Failed to connect to database: {}", e))?;

        let repository = PgEventRepository::new(pool);
        repository
            .ensure_schema()
            .await
            .map_err(|e| format!("Failed to prepare schema: {}", e))?;

        let holidays = HolidayClient::new(config.holiday_country)
            .map_err(|e| format!("Failed to build holiday client: {}", e))?;

        Ok(Self {
            events: Arc::new(repository),
            holidays,
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let raw_path = event.uri().path();
    // Strip /api stage prefix if present (API Gateway REST API includes stage in path)
    let stripped = raw_path.strip_prefix("/api").unwrap_or(raw_path);
    // Calendar widgets send trailing slashes; treat them as absent
    let path = match stripped.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    info!("Events request: {} {}", method, path);

    match (method, path) {
        // List events plus holiday markers
        ("GET", "/events") => {
            let params = event.query_string_parameters();

            let window_start = match params
                .first("start")
                .map(|value| parse_event_datetime(value, Bound::Start))
                .transpose()
            {
                Ok(parsed) => parsed,
                Err(e) => return error_response(400, e.to_string()),
            };
            let window_end = match params
                .first("end")
                .map(|value| parse_event_datetime(value, Bound::End))
                .transpose()
            {
                Ok(parsed) => parsed,
                Err(e) => return error_response(400, e.to_string()),
            };

            // Without a complete window the whole calendar is returned
            let events = match (window_start, window_end) {
                (Some(start), Some(end)) => state.events.find_overlapping(start, end).await,
                _ => state.events.list_all().await,
            };
            let events = match events {
                Ok(events) => events,
                Err(e) => {
                    error!("Failed to list events: {}", e);
                    return error_response(500, "Internal server error");
                }
            };

            let mut entries = events
                .into_iter()
                .map(|event| serde_json::to_value(EventResponse::from(event)))
                .collect::<Result<Vec<_>, _>>()?;

            // Holiday markers for every year the window touches, span clamped
            let start_year = window_start
                .map(|dt| dt.year())
                .unwrap_or_else(|| Utc::now().year());
            let end_year = window_end
                .map(|dt| dt.year())
                .unwrap_or(start_year)
                .min(start_year + MAX_HOLIDAY_YEAR_SPAN - 1);
            for year in start_year..=end_year {
                for holiday in state.holidays.holidays_for_year(year).await {
                    entries.push(serde_json::to_value(holiday)?);
                }
            }

            info!("Returning {} calendar entries", entries.len());
            json_response(200, &entries)
        }

        // Create event
        ("POST", "/events/create") => {
            let request: CreateEventRequest = shared::parse_body!(event.body());

            if let Err(e) = request.validate() {
                return error_response(400, format!("Invalid request: {}", e));
            }

            let start_time = match request.start.as_deref() {
                Some(value) => match parse_event_datetime(value, Bound::Start) {
                    Ok(dt) => dt,
                    Err(e) => return error_response(400, e.to_string()),
                },
                None => return error_response(400, "Missing required field: start"),
            };

            // An omitted end makes a zero-length event at the start instant
            let end_time = match request.end.as_deref() {
                Some(value) => match parse_event_datetime(value, Bound::End) {
                    Ok(dt) => dt,
                    Err(e) => return error_response(400, e.to_string()),
                },
                None => start_time,
            };

            let created_by = authenticated_user(&event).map(|user| user.user_id);

            let new_event = NewEvent {
                title: request.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                description: request.description,
                start_time,
                end_time,
                all_day: request.all_day.unwrap_or(false),
                color: request.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                location: request.location,
                recurrence: request.recurrence,
                created_by,
            };

            match state.events.create(new_event).await {
                Ok(created) => {
                    info!("Created event {}", created.id);
                    json_response(201, &EventResponse::from(created))
                }
                Err(e) => {
                    error!("Failed to create event: {}", e);
                    error_response(500, "Internal server error")
                }
            }
        }

        // Delete event
        _ if path.starts_with("/events/") && path.ends_with("/delete") && method == "DELETE" => {
            let event_id = path
                .trim_start_matches("/events/")
                .trim_end_matches("/delete");
            let event_uuid = match Uuid::parse_str(event_id) {
                Ok(id) => id,
                Err(_) => return error_response(400, "Invalid event ID"),
            };

            match state.events.delete(event_uuid).await {
                Ok(()) => {
                    info!("Deleted event {}", event_uuid);
                    json_response(200, &serde_json::json!({ "deleted": true }))
                }
                Err(shared::Error::NotFound(_)) => error_response(404, "Event not found"),
                Err(e) => {
                    error!("Failed to delete event: {}", e);
                    error_response(500, "Internal server error")
                }
            }
        }

        // Update event (partial)
        _ if path.starts_with("/events/") && (method == "PUT" || method == "PATCH") => {
            let event_id = path.trim_start_matches("/events/");
            let event_uuid = match Uuid::parse_str(event_id) {
                Ok(id) => id,
                Err(_) => return error_response(400, "Invalid event ID"),
            };

            let request: UpdateEventRequest = shared::parse_body!(event.body());

            if let Err(e) = request.validate() {
                return error_response(400, format!("Invalid request: {}", e));
            }

            let start_time = match request.start.as_deref() {
                Some(value) => match parse_event_datetime(value, Bound::Start) {
                    Ok(dt) => Some(dt),
                    Err(e) => return error_response(400, e.to_string()),
                },
                None => None,
            };
            let end_time = match request.end.as_deref() {
                Some(value) => match parse_event_datetime(value, Bound::End) {
                    Ok(dt) => Some(dt),
                    Err(e) => return error_response(400, e.to_string()),
                },
                None => None,
            };

            let changes = EventChanges {
                title: request.title,
                description: request.description,
                start_time,
                end_time,
                all_day: request.all_day,
                color: request.color,
                location: request.location,
                recurrence: request.recurrence,
            };

            match state.events.update(event_uuid, changes).await {
                Ok(updated) => {
                    info!("Updated event {}", event_uuid);
                    json_response(200, &EventResponse::from(updated))
                }
                Err(shared::Error::NotFound(_)) => error_response(404, "Event not found"),
                Err(e) => {
                    error!("Failed to update event: {}", e);
                    error_response(500, "Internal server error")
                }
            }
        }

        _ => error_response(404, "Not found"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);
    let state_clone = state.clone();

    run(service_fn(move |event| {
        let state = state_clone.clone();
        async move { handler(state, event).await }
    }))
    .await
}
