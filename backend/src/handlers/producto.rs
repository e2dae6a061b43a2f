//! HTTP handlers for the product catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::producto::{
    ActualizarProductoInput, BuscarProductosInput, CrearProductoInput, PrecioAlmacen,
    PrecioAlmacenInput, Producto, ProductoDetalle, ProductoService,
};
use crate::AppState;

/// List the whole catalog
pub async fn list_productos(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProductoDetalle>>> {
    let service = ProductoService::new(state.db);
    let productos = service.listar().await?;
    Ok(Json(productos))
}

/// Create a product (or revive an inactive one by barcode)
pub async fn create_producto(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CrearProductoInput>,
) -> AppResult<Json<Producto>> {
    let service = ProductoService::new(state.db);
    let producto = service.crear(input).await?;
    Ok(Json(producto))
}

/// Get one product with its unit and classification
pub async fn get_producto(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ProductoDetalle>> {
    let service = ProductoService::new(state.db);
    let producto = service.obtener(id).await?;
    Ok(Json(producto))
}

/// Search active products with filters
pub async fn buscar_productos(
    State(state): State<AppState>,
    Query(filtros): Query<BuscarProductosInput>,
) -> AppResult<Json<Vec<ProductoDetalle>>> {
    let service = ProductoService::new(state.db);
    let productos = service.buscar(filtros).await?;
    Ok(Json(productos))
}

/// Look a product up by barcode
pub async fn get_producto_por_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> AppResult<Json<ProductoDetalle>> {
    let service = ProductoService::new(state.db);
    let producto = service.por_barcode(&barcode).await?;
    Ok(Json(producto))
}

/// Update a product
pub async fn update_producto(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<ActualizarProductoInput>,
) -> AppResult<Json<ProductoDetalle>> {
    let service = ProductoService::new(state.db);
    let producto = service.actualizar(id, input).await?;
    Ok(Json(producto))
}

/// Soft-delete a product (admin only)
pub async fn delete_producto(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Producto>> {
    if !current_user.0.has_role("admin") {
        return Err(crate::error::AppError::InsufficientPermissions);
    }
    let service = ProductoService::new(state.db);
    let producto = service.borrar_logico(id).await?;
    Ok(Json(producto))
}

/// Upsert the per-warehouse price override
pub async fn upsert_precio_almacen(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((producto_id, almacen_id)): Path<(i32, i32)>,
    Json(input): Json<PrecioAlmacenInput>,
) -> AppResult<Json<PrecioAlmacen>> {
    let service = ProductoService::new(state.db);
    let precio = service
        .upsert_precio_almacen(producto_id, almacen_id, input)
        .await?;
    Ok(Json(precio))
}

/// Remove the per-warehouse price override
pub async fn delete_precio_almacen(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((producto_id, almacen_id)): Path<(i32, i32)>,
) -> AppResult<Json<()>> {
    let service = ProductoService::new(state.db);
    service
        .eliminar_precio_almacen(producto_id, almacen_id)
        .await?;
    Ok(Json(()))
}
