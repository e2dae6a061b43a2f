//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::orden_compra::{
    CrearOrdenCompraInput, FiltroOrdenesCompra, OrdenCompraDetalle, OrdenCompraService,
    OrdenCreada,
};
use crate::AppState;
use shared::Pagina;

/// Create a purchase order and receive its stock
pub async fn create_orden_compra(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CrearOrdenCompraInput>,
) -> AppResult<Json<OrdenCreada>> {
    let service = OrdenCompraService::new(state.db);
    let resultado = service
        .crear_con_stock(Some(current_user.0.user_id), input)
        .await?;
    Ok(Json(resultado))
}

/// Filtered, paginated purchase order listing
pub async fn list_ordenes_compra(
    State(state): State<AppState>,
    Query(filtros): Query<FiltroOrdenesCompra>,
) -> AppResult<Json<Pagina<OrdenCompraDetalle>>> {
    let service = OrdenCompraService::new(state.db);
    let pagina = service.listar_filtrado(filtros).await?;
    Ok(Json(pagina))
}

/// Get one purchase order with its lines
pub async fn get_orden_compra(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<OrdenCompraDetalle>> {
    let service = OrdenCompraService::new(state.db);
    let detalle = service.obtener_detalle(id).await?;
    Ok(Json(detalle))
}
