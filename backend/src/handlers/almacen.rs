//! HTTP handlers for warehouse endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::almacen::{
    ActualizarAlmacenInput, Almacen, AlmacenService, CrearAlmacenInput,
};
use crate::AppState;

/// List warehouses
pub async fn list_almacenes(State(state): State<AppState>) -> AppResult<Json<Vec<Almacen>>> {
    let service = AlmacenService::new(state.db);
    let almacenes = service.listar().await?;
    Ok(Json(almacenes))
}

/// Create a warehouse
pub async fn create_almacen(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CrearAlmacenInput>,
) -> AppResult<Json<Almacen>> {
    let service = AlmacenService::new(state.db);
    let almacen = service.crear(input).await?;
    Ok(Json(almacen))
}

/// Get one warehouse
pub async fn get_almacen(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Almacen>> {
    let service = AlmacenService::new(state.db);
    let almacen = service.obtener(id).await?;
    Ok(Json(almacen))
}

/// Update a warehouse
pub async fn update_almacen(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<ActualizarAlmacenInput>,
) -> AppResult<Json<Almacen>> {
    let service = AlmacenService::new(state.db);
    let almacen = service.actualizar(id, input).await?;
    Ok(Json(almacen))
}

/// Delete a warehouse
pub async fn delete_almacen(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<()>> {
    let service = AlmacenService::new(state.db);
    service.eliminar(id).await?;
    Ok(Json(()))
}
