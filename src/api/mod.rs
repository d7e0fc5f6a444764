pub mod extract;
pub mod middleware;

use axum::Json;
use axum::extract::Path;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use chrono::{DateTime, Utc};
use tracing::info;

use self::extract::{JsonBody, QueryParams};
use self::middleware::{cors_layer, not_found, with_security_headers};
use crate::auth::AuthUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::services::{Board, BoardFilter, build_board};
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

/// Builds the application. Browser calls are accepted from `allowed_origins`
/// (see [`middleware::origin_allowed`]).
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/deadlines", get(list_deadlines).post(create_deadline))
        .route("/api/deadlines/board", get(deadline_board))
        .route(
            "/api/deadlines/{id}",
            get(get_deadline).put(update_deadline).delete(delete_deadline),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer(allowed_origins));

    with_security_headers(app)
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        timestamp: state.clock.now(),
    }))
}

async fn list_deadlines(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Deadline>>, AppError> {
    let deadlines = repository::fetch_deadlines(&state.db, &user.user_id).await?;
    Ok(Json(deadlines))
}

async fn deadline_board(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(filter): QueryParams<BoardFilter>,
) -> Result<Json<Board>, AppError> {
    let snapshot = repository::fetch_deadlines(&state.db, &user.user_id).await?;
    Ok(Json(build_board(&snapshot, filter, state.clock.now())))
}

async fn get_deadline(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Deadline>, AppError> {
    let deadline = repository::find_deadline(&state.db, &user.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(deadline))
}

async fn create_deadline(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<NewDeadlineRequest>,
) -> Result<(StatusCode, Json<Deadline>), AppError> {
    let new = req.validate()?;
    let deadline =
        repository::insert_deadline(&state.db, &user.user_id, new, state.clock.now()).await?;
    info!("created deadline {} for user {}", deadline.id, user.user_id);
    Ok((StatusCode::CREATED, Json(deadline)))
}

async fn update_deadline(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateDeadlineRequest>,
) -> Result<Json<Deadline>, AppError> {
    let patch = req.validate()?;
    let deadline =
        repository::update_deadline(&state.db, &user.user_id, &id, patch, state.clock.now())
            .await?
            .ok_or(AppError::NotFound)?;
    info!("updated deadline {} for user {}", deadline.id, user.user_id);
    Ok(Json(deadline))
}

async fn delete_deadline(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let ok = repository::delete_deadline(&state.db, &user.user_id, &id).await?;
    if ok {
        info!("deleted deadline {} for user {}", id, user.user_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
