//! HTTP server.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                                   |
//! |--------|---------------|-----------------------------------------------|
//! | GET    | `/health`     | Health check                                  |
//! | POST   | `/api/invoke` | Run one invocation from a storage event       |
//! | POST   | `/api/clean`  | Clean an uploaded CSV without touching storage |
//! | GET    | `/api/logs`   | SSE stream of pipeline logs                   |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, CleanResponse};
use crate::config::MAX_UPLOAD_SIZE;
use crate::error::{ServerError, ServerResult};
use crate::handler::{Handler, InvocationResponse};
use crate::storage::ObjectStore;
use crate::transform::clean_bytes;

/// Build the router around a handler.
pub fn router<S: ObjectStore + 'static>(handler: Handler<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/invoke", post(invoke::<S>))
        .route("/api/clean", post(clean_upload))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .with_state(Arc::new(handler))
}

/// Start the HTTP server
pub async fn start_server<S: ObjectStore + 'static>(port: u16, handler: Handler<S>) -> ServerResult<()> {
    let output_bucket = handler.config().output_bucket.clone();
    let app = router(handler);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 csvclean server running on http://localhost:{}", port);
    println!("   POST /api/invoke - Process a storage event");
    println!("   POST /api/clean  - Clean an uploaded CSV");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");
    println!("   Output bucket: {}", output_bucket);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "csvclean",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "invoke": "POST /api/invoke",
            "clean": "POST /api/clean",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// Invocation endpoint; the response status mirrors the invocation's.
async fn invoke<S: ObjectStore + 'static>(
    State(handler): State<Arc<Handler<S>>>,
    Json(event): Json<Value>,
) -> (StatusCode, Json<InvocationResponse>) {
    let response = handler.handle_event(&event).await;
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint
async fn clean_upload(mut multipart: Multipart) -> Result<Json<CleanResponse>, ServerError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;

    log_info(format!(
        "📄 Upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let cleaned = clean_bytes(&bytes)?;
    Ok(Json(CleanResponse::try_from(cleaned)?))
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Csv(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::CsvError;
    use crate::handler::event_for;
    use crate::storage::{MemoryStore, ObjectLocation};

    #[tokio::test]
    async fn test_invoke_maps_status() {
        let store = MemoryStore::new();
        let input = ObjectLocation::new("raw", "a.csv");
        store.insert(input.clone(), "k\nv\n");
        let handler = Arc::new(Handler::new(store, Config::new("out")));

        let (status, Json(body)) = invoke(State(handler.clone()), Json(event_for(&input))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.body["rows_processed"], 1);

        let missing = ObjectLocation::new("raw", "missing.csv");
        let (status, Json(body)) = invoke(State(handler), Json(event_for(&missing))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.body["code"], "SOURCE_READ_FAILURE");
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn test_error_status_codes() {
        let response = ServerError::BadRequest("x".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = ServerError::Csv(CsvError::NoHeaders).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
