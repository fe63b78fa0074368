//! Calendar Page Lambda - Serves the calendar UI.
//!
//! Endpoints:
//! - GET / - Static HTML page hosting the calendar widget; the widget talks
//!   to the events API for its data

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CALENDAR_PAGE: &str = include_str!("../../assets/calendar.html");

async fn handler(event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let raw_path = event.uri().path();
    // Strip /api stage prefix if present (API Gateway REST API includes stage in path)
    let path = raw_path.strip_prefix("/api").unwrap_or(raw_path);

    info!("Page request: {} {}", method, path);

    if method == "GET" && (path.is_empty() || path == "/") {
        return Ok(Response::builder()
            .status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(Body::from(CALENDAR_PAGE))?);
    }

    Ok(Response::builder()
        .status(404)
        .header("content-type", "text/plain")
        .body(Body::from("Not found"))?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::Request as HttpRequest;

    fn get(path: &str) -> Request {
        HttpRequest::builder()
            .method("GET")
            .uri(path)
            .body(Body::Empty)
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_serves_calendar_page() {
        let response = handler(get("/")).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        match response.body() {
            Body::Text(html) => assert!(html.contains("FullCalendar")),
            other => panic!("expected html body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stage_prefixed_root_is_served() {
        let response = handler(get("/api/")).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_other_paths_are_404() {
        let response = handler(get("/favicon.ico")).await.unwrap();
        assert_eq!(response.status(), 404);
    }
}
