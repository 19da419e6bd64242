use axum::{routing::{get, patch}, Extension, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::controllers;
use crate::{health_with_stores, AppState};

pub fn router(state: Arc<AppState>) -> Router {
    // tutto ciò che non è API (js, css, immagini della SPA) arriva dalla directory statica
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(controllers::index))
        .route("/health", get(|Extension(state): Extension<Arc<AppState>>| async move {
            health_with_stores(&state.stores).await
        }))
        .route(
            "/api/tasks",
            get(controllers::list_tasks).post(controllers::create_task),
        )
        .route(
            "/api/tasks/:id",
            patch(controllers::update_task).delete(controllers::delete_task),
        )
        .fallback_service(assets)
        .layer(Extension(state))
        // niente CORS: la SPA arriva dalla stessa origine delle API
        .layer(TraceLayer::new_for_http())
}
