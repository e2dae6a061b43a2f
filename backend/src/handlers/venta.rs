//! HTTP handlers for sales endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::venta::{
    ActualizarEstadoInput, CrearVentaInput, FiltroVentas, Venta, VentaDetalle, VentaService,
};
use crate::AppState;
use shared::Pagina;

/// Complete a sale
pub async fn create_venta(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CrearVentaInput>,
) -> AppResult<Json<VentaDetalle>> {
    let service = VentaService::new(state.db);
    let venta = service.crear(Some(current_user.0.user_id), input).await?;
    Ok(Json(venta))
}

/// Filtered, paginated sales listing
pub async fn list_ventas(
    State(state): State<AppState>,
    Query(filtros): Query<FiltroVentas>,
) -> AppResult<Json<Pagina<Venta>>> {
    let service = VentaService::new(state.db);
    let pagina = service.listar_filtrado(filtros).await?;
    Ok(Json(pagina))
}

/// Get one sale with its lines
pub async fn get_venta(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<VentaDetalle>> {
    let service = VentaService::new(state.db);
    let venta = service.obtener(id).await?;
    Ok(Json(venta))
}

/// Update the sale state
pub async fn update_estado_venta(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<ActualizarEstadoInput>,
) -> AppResult<Json<Venta>> {
    let service = VentaService::new(state.db);
    let venta = service.actualizar_estado(id, input).await?;
    Ok(Json(venta))
}
