use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use crates::infra::db::postgres::postgres_connection::{self, PgPoolSquad};
use tracing::{error, info};

use crate::axum_http::error_responses::ErrorResponse;

pub async fn not_found() -> impl IntoResponse {
    info!("router: not_found handler invoked");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            code: StatusCode::NOT_FOUND.as_u16(),
            message: "NOT_FOUND".to_string(),
        }),
    )
        .into_response()
}

pub async fn health_check(State(db_pool): State<Arc<PgPoolSquad>>) -> impl IntoResponse {
    info!("router: health_check handler invoked");
    match postgres_connection::check_connection(&db_pool) {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(err) => {
            error!(db_error = ?err, "router: health_check database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_UNAVAILABLE").into_response()
        }
    }
}
