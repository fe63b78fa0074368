//! Shared library for Almanac Lambda functions.
//!
//! This crate provides the calendar event model, persistence, holiday
//! enrichment and common utilities used across all Lambda functions.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod holidays;
pub mod http;
pub mod models;
pub mod repository;
pub mod secrets;

pub use auth::{authenticated_user, validate_token, AuthenticatedUser, CognitoClaims};
pub use config::Config;
pub use error::{Error, Result};
pub use holidays::{HolidayClient, HolidayEntry};
pub use http::{error_response, json_response, parse_json_body};
pub use models::{CreateEventRequest, Event, EventChanges, EventResponse, NewEvent, UpdateEventRequest};
pub use repository::{EventRepository, InMemoryEventRepository, PgEventRepository};
pub use secrets::{get_database_credentials, get_secret, DatabaseCredentials};
