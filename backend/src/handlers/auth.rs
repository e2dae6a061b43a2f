//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::auth::{
    AuthResponse, AuthService, LoginInput, RefreshInput, RegistrarUsuarioInput,
};
use crate::AppState;

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegistrarUsuarioInput>,
) -> AppResult<Json<AuthResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let response = service.registrar(input).await?;
    Ok(Json(response))
}

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let response = service.login(input).await?;
    Ok(Json(response))
}

/// Refresh the token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<AuthResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let response = service.refresh(input).await?;
    Ok(Json(response))
}
