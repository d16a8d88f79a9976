use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::{issue_token, ROLE_GUEST}, state::AppState};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/guest", post(login_guest))
}

/// Anonymous shoppers get a short identity so their cart can be priced and followed.
async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let sub = format!("guest-{}", Uuid::new_v4());
    let token = issue_token(&state.auth.secret, &sub, ROLE_GUEST, state.auth.expiration)?;
    Ok(Json(AuthResponse { token }))
}
