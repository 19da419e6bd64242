use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use compiti_core::{CreateTaskRequest, ErrorBody, Task, TaskPatch, UpdateTaskRequest};
use std::sync::Arc;

use crate::identity::Identity;
use crate::store::StoreError;
use crate::AppState;

// Messaggi fissi restituiti al client; la causa vera va solo nei log.
pub const FETCH_FAILED: &str = "Failed to fetch tasks";
pub const CREATE_FAILED: &str = "Failed to create task";
pub const UPDATE_FAILED: &str = "Failed to update task";
pub const DELETE_FAILED: &str = "Failed to delete task";
pub const INIT_FAILED: &str = "Failed to initialize task store";
pub const NOT_FOUND: &str = "Task not found";
pub const INVALID_BODY: &str = "Invalid request body";
pub const INVALID_COMPLETED: &str = "completed must be true or false";
pub const MISSING_IDENTITY: &str = "Missing user_id cookie";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Internal(&'static str),
}

impl ApiError {
    /// Converte un errore dello store; `message` è il testo fisso dell'operazione in caso di 500.
    fn from_store(err: StoreError, message: &'static str) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            StoreError::NotFound(id) => {
                tracing::debug!(task_id = %id, "task not found");
                ApiError::NotFound(NOT_FOUND.to_string())
            }
            other => {
                tracing::error!(error = %other, "{}", message);
                ApiError::Internal(message)
            }
        }
    }

    fn invalid_body(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::BadRequest(INVALID_BODY.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Handler per GET /
/// Legge index.html, inizializza il database dell'utente (con il compito di benvenuto
/// al primo accesso) e scrive il cookie `user_id`. Senza index.html non si crea niente.
pub async fn index(
    Extension(state): Extension<Arc<AppState>>,
    identity: Identity,
) -> Result<Response, ApiError> {
    let index_path = state.static_dir.join("index.html");
    let page = match tokio::fs::read_to_string(&index_path).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, path = ?index_path, "cannot read index.html");
            return Err(ApiError::NotFound("Not found".to_string()));
        }
    };

    let store = state
        .stores
        .open(&identity.user_id)
        .await
        .map_err(|e| ApiError::from_store(e, INIT_FAILED))?;
    store.close().await;

    let cookie = identity.set_cookie().map_err(|e| {
        tracing::error!(error = %e, "cannot build user_id cookie");
        ApiError::Internal(INIT_FAILED)
    })?;
    if identity.minted {
        tracing::info!(user_id = %identity.user_id, "issued user_id cookie");
    }
    Ok(([(header::SET_COOKIE, cookie)], Html(page)).into_response())
}

/// Handler per GET /api/tasks
pub async fn list_tasks(
    Extension(state): Extension<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Task>>, ApiError> {
    // id appena coniato: nessun database esiste ancora, la lista è vuota
    if identity.minted {
        return Ok(Json(Vec::new()));
    }

    let mut store = state
        .stores
        .open(&identity.user_id)
        .await
        .map_err(|e| ApiError::from_store(e, FETCH_FAILED))?;
    let result = store.list().await;
    store.close().await;

    let tasks = result.map_err(|e| ApiError::from_store(e, FETCH_FAILED))?;
    Ok(Json(tasks))
}

/// Handler per POST /api/tasks
/// Senza cookie `user_id` valido risponde 401 invece di creare un database irraggiungibile.
pub async fn create_task(
    Extension(state): Extension<Arc<AppState>>,
    identity: Identity,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(req) = payload.map_err(ApiError::invalid_body)?;
    // il cookie si riceve solo da GET /: un compito creato qui andrebbe perso
    if identity.minted {
        return Err(ApiError::Unauthorized(MISSING_IDENTITY.to_string()));
    }

    let mut store = state
        .stores
        .open(&identity.user_id)
        .await
        .map_err(|e| ApiError::from_store(e, CREATE_FAILED))?;
    let result = store.create(req.title, req.description).await;
    store.close().await;

    let task = result.map_err(|e| ApiError::from_store(e, CREATE_FAILED))?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler per PATCH /api/tasks/:id
/// `{completed}` tocca solo il flag, `{title, description?}` solo il contenuto.
pub async fn update_task(
    Extension(state): Extension<Arc<AppState>>,
    identity: Identity,
    Path(task_id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(req) = payload.map_err(ApiError::invalid_body)?;
    let patch = TaskPatch::try_from(req).map_err(|e| {
        tracing::debug!(error = %e, "rejected patch");
        ApiError::BadRequest(INVALID_COMPLETED.to_string())
    })?;
    if identity.minted {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    let mut store = state
        .stores
        .open(&identity.user_id)
        .await
        .map_err(|e| ApiError::from_store(e, UPDATE_FAILED))?;
    let result = store.update(&task_id, patch).await;
    store.close().await;

    let task = result.map_err(|e| ApiError::from_store(e, UPDATE_FAILED))?;
    Ok(Json(task))
}

/// Handler per DELETE /api/tasks/:id
/// Cancellare un id che non esiste risponde comunque 204.
pub async fn delete_task(
    Extension(state): Extension<Arc<AppState>>,
    identity: Identity,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if identity.minted {
        return Ok(StatusCode::NO_CONTENT);
    }

    let mut store = state
        .stores
        .open(&identity.user_id)
        .await
        .map_err(|e| ApiError::from_store(e, DELETE_FAILED))?;
    let result = store.delete(&task_id).await;
    store.close().await;

    result.map_err(|e| ApiError::from_store(e, DELETE_FAILED))?;
    Ok(StatusCode::NO_CONTENT)
}
