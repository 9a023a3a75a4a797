// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP API for the image sorter UI

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::history::{BatchEntry, SessionHistory};
use crate::lister::ImageEntry;
use crate::mover::MoveRecord;
use crate::sorter::{ClassifyResponse, ImageSorter, UndoResponse};
use crate::SorterError;

/// Shared application state
pub struct AppState {
    pub sorter: ImageSorter,
    pub history: Mutex<SessionHistory>,
}

impl AppState {
    pub fn new(sorter: ImageSorter, max_batches: usize) -> Self {
        Self {
            sorter,
            history: Mutex::new(SessionHistory::new(max_batches)),
        }
    }

    fn lock_history(&self) -> Result<MutexGuard<'_, SessionHistory>, ApiError> {
        self.history
            .lock()
            .map_err(|_| ApiError::internal("History lock poisoned"))
    }
}

/// Error returned to HTTP clients as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<SorterError> for ApiError {
    fn from(err: SorterError) -> Self {
        let status = match &err {
            SorterError::NotFound(_) => StatusCode::NOT_FOUND,
            SorterError::NotADirectory(_)
            | SorterError::Decode(_)
            | SorterError::LengthMismatch { .. }
            | SorterError::InvalidLabel(_) => StatusCode::BAD_REQUEST,
            SorterError::AccessDenied(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self.message);
        } else {
            debug!("Request failed ({}): {}", self.status, self.message);
        }
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/get-images", post(get_images))
        .route("/classify", post(classify_images))
        .route("/undo", post(undo_classification))
        .route("/history", get(get_history))
        .route("/undo-last", post(undo_last))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run filesystem work off the async workers
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

// === Request bodies ===

#[derive(Debug, Serialize, Deserialize)]
pub struct FolderRequest {
    pub folder_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub image_paths: Vec<String>,
    pub labels: Vec<String>,
    pub target_folder: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UndoRequest {
    pub moved_files: Vec<MoveRecord>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

// === Handlers ===

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Image Sorter API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_images(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FolderRequest>,
) -> Result<Json<Vec<ImageEntry>>, ApiError> {
    debug!("Listing images in {}", request.folder_path);
    let images = blocking(move || state.sorter.list_images(&request.folder_path)).await?;
    Ok(Json(images))
}

async fn classify_images(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    debug!(
        "Classify request: {} images, labels {:?}, target {}",
        request.image_paths.len(),
        request.labels,
        request.target_folder
    );

    let worker = Arc::clone(&state);
    let response = blocking(move || {
        worker
            .sorter
            .classify_batch(&request.image_paths, &request.labels, &request.target_folder)
    })
    .await?;

    {
        let mut history = state.lock_history()?;
        if let Some(id) = history.record(response.moved_files.clone()).map(|e| e.id.clone()) {
            debug!("Recorded batch {} ({} held)", id, history.len());
        }
    }

    Ok(Json(response))
}

async fn undo_classification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UndoRequest>,
) -> Result<Json<UndoResponse>, ApiError> {
    debug!("Undo request: {} files", request.moved_files.len());
    let response = blocking(move || state.sorter.undo_batch(&request.moved_files)).await?;
    Ok(Json(response))
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BatchEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(10);
    Ok(Json(state.lock_history()?.get_recent(limit)))
}

async fn undo_last(State(state): State<Arc<AppState>>) -> Result<Json<UndoResponse>, ApiError> {
    let entry = state
        .lock_history()?
        .last_undoable()
        .cloned()
        .ok_or_else(|| ApiError::not_found("No classification batch to undo"))?;

    info!("Undoing batch {} ({} files)", entry.id, entry.moved_files.len());
    let worker = Arc::clone(&state);
    let moved_files = entry.moved_files;
    let response = blocking(move || worker.sorter.undo_batch(&moved_files)).await?;

    state.lock_history()?.mark_undone(&entry.id);
    Ok(Json(response))
}

/// Start the web server with config and sorter
pub async fn start_server(config: AppConfig, sorter: ImageSorter) -> crate::Result<()> {
    let state = Arc::new(AppState::new(sorter, config.history.max_batches));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Image sorter API listening on http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router).await?;

    Ok(())
}
