/// HTTP server exposing the explorer session: WebSocket channel, dataset
/// load endpoint, health check
use actix_web::{middleware, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::dataset::rows_from_json;
use crate::websocket::{AppState, ExplorerWebSocket};

const PREVIEW_ROWS: usize = 5;

/// Body of `POST /load`: an already-parsed dataset from the upload
/// subsystem (CSV parsing happens upstream).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub rows: Vec<HashMap<String, JsonValue>>,
    pub headers: Vec<String>,
    #[serde(default)]
    pub total_row_count: Option<u64>,
}

/// Response to `POST /load`: the applied revision plus a short preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub revision: u64,
    pub row_count: usize,
    pub headers: Vec<String>,
    pub preview: Vec<JsonValue>,
}

/// WebSocket endpoint handler
async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let resp = ws::start(ExplorerWebSocket::new(state), &req, stream)?;
    Ok(resp)
}

/// Apply a user-initiated dataset load. Each request gets a fresh sequence
/// number; if a later request was issued before this one applies, this one
/// is discarded (latest wins) and answered with its superseding revision.
async fn load(state: web::Data<AppState>, body: web::Json<LoadRequest>) -> HttpResponse {
    let LoadRequest {
        rows,
        headers,
        total_row_count,
    } = body.into_inner();

    let values: Vec<JsonValue> = rows
        .into_iter()
        .map(|obj| JsonValue::Object(obj.into_iter().collect()))
        .collect();
    let rows = rows_from_json(&values);

    let mut session = state.session.lock().unwrap();
    let seq = session.begin_load();
    let applied = session.apply_load(seq, rows, headers, total_row_count);
    log::info!(
        "load request {}: {} ({} rows)",
        seq,
        if applied { "applied" } else { "discarded" },
        session.store().len()
    );

    let preview: Vec<JsonValue> = (0..session.store().len().min(PREVIEW_ROWS))
        .filter_map(|i| session.store().row_to_json(i))
        .collect();

    HttpResponse::Ok().json(LoadResponse {
        revision: seq,
        row_count: session.store().len(),
        headers: session.store().headers().to_vec(),
        preview,
    })
}

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "datadeck session server is running"
    }))
}

/// Start the HTTP server with WebSocket support
pub async fn run_server(host: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new());

    log::info!("datadeck session server");
    log::info!("websocket: ws://{}:{}/ws", host, port);
    log::info!("load endpoint: http://{}:{}/load", host, port);
    log::info!("health check: http://{}:{}/health", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            // Enable logger
            .wrap(middleware::Logger::default())
            // CORS for development
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            // WebSocket endpoint
            .route("/ws", web::get().to(ws_index))
            // Dataset load
            .route("/load", web::post().to(load))
            // Health check
            .route("/health", web::get().to(health_check))
    })
    .bind((host, port))?
    .run()
    .await
}
