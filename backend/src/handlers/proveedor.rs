//! HTTP handlers for supplier endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::proveedor::{
    ActualizarProveedorInput, CrearProveedorInput, Proveedor, ProveedorService,
};
use crate::AppState;

/// List suppliers
pub async fn list_proveedores(State(state): State<AppState>) -> AppResult<Json<Vec<Proveedor>>> {
    let service = ProveedorService::new(state.db);
    let proveedores = service.listar().await?;
    Ok(Json(proveedores))
}

/// Create a supplier
pub async fn create_proveedor(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CrearProveedorInput>,
) -> AppResult<Json<Proveedor>> {
    let service = ProveedorService::new(state.db);
    let proveedor = service.crear(input).await?;
    Ok(Json(proveedor))
}

/// Get one supplier
pub async fn get_proveedor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Proveedor>> {
    let service = ProveedorService::new(state.db);
    let proveedor = service.obtener(id).await?;
    Ok(Json(proveedor))
}

/// Update a supplier
pub async fn update_proveedor(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<ActualizarProveedorInput>,
) -> AppResult<Json<Proveedor>> {
    let service = ProveedorService::new(state.db);
    let proveedor = service.actualizar(id, input).await?;
    Ok(Json(proveedor))
}

/// Delete a supplier
pub async fn delete_proveedor(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<()>> {
    let service = ProveedorService::new(state.db);
    service.eliminar(id).await?;
    Ok(Json(()))
}
