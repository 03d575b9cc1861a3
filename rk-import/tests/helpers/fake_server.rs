//! In-process ReadKnows API double
//!
//! Serves the `/api` routes the client uses. Behaviour is keyed off file
//! names so tests can script outcomes without configuring the server:
//! - `dup*`    → skipped (already in library)
//! - `broken*` → HTTP 500 `{"error": "Database is locked"}`
//! - `bad*`    → 200 with `failed: 1` and an error list
//! - `slow*`   → sleeps 3 s before answering
//! - `huge*`   → upload rejected with HTTP 413, empty body
//!
//! Every processed file is appended to the import history.

use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake server has seen
#[derive(Debug, Default)]
pub struct Recorded {
    pub scan_requests: Vec<Value>,
    pub import_requests: Vec<Value>,
    pub uploads: Vec<HashMap<String, String>>,
    pub history: Vec<Value>,
    pub auth_headers: Vec<Option<String>>,
}

#[derive(Clone)]
struct ServerState {
    recorded: Arc<Mutex<Recorded>>,
    required_token: Option<String>,
}

pub struct FakeServer {
    addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeServer {
    /// Start a server that accepts unauthenticated requests
    pub async fn start() -> Self {
        Self::start_inner(None).await
    }

    /// Start a server that answers 401 unless `Bearer <token>` is sent
    pub async fn start_with_token(token: &str) -> Self {
        Self::start_inner(Some(token.to_string())).await
    }

    async fn start_inner(required_token: Option<String>) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = ServerState {
            recorded: Arc::clone(&recorded),
            required_token,
        };

        let app = Router::new()
            .route("/api/scan/scan-list", post(scan_list))
            .route("/api/scan/import-batch", post(import_batch))
            .route("/api/books/upload", post(upload))
            .route(
                "/api/scan/import-history",
                axum::routing::get(history).delete(clear_history),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self { addr, recorded }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().expect("Recorded state poisoned")
    }
}

fn check_auth(state: &ServerState, headers: &HeaderMap) -> Result<(), Response> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.recorded.lock().unwrap().auth_headers.push(header.clone());

    match &state.required_token {
        Some(token) if header.as_deref() != Some(format!("Bearer {}", token).as_str()) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid or missing token" })),
        )
            .into_response()),
        _ => Ok(()),
    }
}

fn push_history(state: &ServerState, file_name: &str, status: &str, message: Option<&str>) {
    let mut recorded = state.recorded.lock().unwrap();
    let id = recorded.history.len() + 1;
    recorded.history.push(json!({
        "id": id,
        "file_name": file_name,
        "status": status,
        "message": message,
        "created_at": format!("2024-05-01 12:00:{:02}", id),
    }));
}

async fn scan_list(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = check_auth(&state, &headers) {
        return rejection;
    }
    state.recorded.lock().unwrap().scan_requests.push(body.clone());

    let dir = body["scanPath"].as_str().unwrap_or_default().to_string();
    if dir == "/missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Directory not found" })),
        )
            .into_response();
    }

    let file = |name: &str, size: u64| {
        json!({
            "path": format!("{}/{}", dir, name),
            "name": name,
            "size": size,
            "ext": name.rsplit('.').next().unwrap_or_default(),
            "modified": 1714564800000u64,
        })
    };

    Json(json!({
        "files": [file("A.epub", 1024), file("dup-B.pdf", 2048), file("broken-C.txt", 64)],
        "errors": [{ "path": format!("{}/locked", dir), "error": "permission denied" }],
    }))
    .into_response()
}

async fn import_batch(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = check_auth(&state, &headers) {
        return rejection;
    }
    state.recorded.lock().unwrap().import_requests.push(body.clone());

    let files = body["files"].as_array().cloned().unwrap_or_default();
    let (mut imported, mut skipped, mut failed) = (0, 0, 0);
    let mut errors = Vec::new();

    for file in &files {
        let name = file["name"].as_str().unwrap_or_default();
        if name.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(3)).await;
        }

        if name.starts_with("broken") {
            push_history(&state, name, "failed", Some("Database is locked"));
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Database is locked" })),
            )
                .into_response();
        } else if name.starts_with("dup") {
            skipped += 1;
            push_history(&state, name, "skipped", Some("Already in library"));
        } else if name.starts_with("bad") {
            failed += 1;
            errors.push(json!({ "path": file["path"], "error": "corrupt archive" }));
            push_history(&state, name, "failed", Some("corrupt archive"));
        } else {
            imported += 1;
            push_history(&state, name, "success", None);
        }
    }

    Json(json!({
        "imported": imported,
        "skipped": skipped,
        "failed": failed,
        "errors": errors,
    }))
    .into_response()
}

async fn upload(
    State(state): State<ServerState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(rejection) = check_auth(&state, &headers) {
        return rejection;
    }

    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            fields.insert("file_name".to_string(), file_name);
            fields.insert("content_type".to_string(), content_type);
            fields.insert("file_bytes".to_string(), bytes.to_string());
        } else {
            let value = field.text().await.unwrap_or_default();
            fields.insert(name, value);
        }
    }

    let file_name = fields.get("file_name").cloned().unwrap_or_default();
    state.recorded.lock().unwrap().uploads.push(fields);

    if file_name.starts_with("huge") {
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }

    push_history(&state, &file_name, "success", None);
    let title = file_name.rsplit_once('.').map(|(t, _)| t).unwrap_or(&file_name);
    Json(json!({ "book": { "id": 42, "title": title } })).into_response()
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn history(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if let Err(rejection) = check_auth(&state, &headers) {
        return rejection;
    }
    let recorded = state.recorded.lock().unwrap();
    let limit = query.limit.unwrap_or(usize::MAX);
    let history: Vec<Value> = recorded.history.iter().rev().take(limit).cloned().collect();
    Json(json!({ "history": history })).into_response()
}

async fn clear_history(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    if let Err(rejection) = check_auth(&state, &headers) {
        return rejection;
    }
    state.recorded.lock().unwrap().history.clear();
    Json(json!({ "success": true })).into_response()
}
