//! HTTP handlers for the movement log endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::movimiento::{
    FiltroMovimientos, Movimiento, MovimientoService, RegistrarMovimientoInput,
};
use crate::AppState;
use shared::Pagina;

/// Filtered, paginated movement listing
pub async fn list_movimientos(
    State(state): State<AppState>,
    Query(filtros): Query<FiltroMovimientos>,
) -> AppResult<Json<Pagina<Movimiento>>> {
    let service = MovimientoService::new(state.db);
    let pagina = service.listar_filtrado(filtros).await?;
    Ok(Json(pagina))
}

/// Get one movement
pub async fn get_movimiento(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Movimiento>> {
    let service = MovimientoService::new(state.db);
    let movimiento = service.obtener(id).await?;
    Ok(Json(movimiento))
}

/// Record a movement (audit row only; the ledger is not touched)
pub async fn create_movimiento(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegistrarMovimientoInput>,
) -> AppResult<Json<Movimiento>> {
    let service = MovimientoService::new(state.db);
    let movimiento = service
        .registrar(Some(current_user.0.user_id), input)
        .await?;
    Ok(Json(movimiento))
}

/// All insumo movements
pub async fn list_insumos(State(state): State<AppState>) -> AppResult<Json<Vec<Movimiento>>> {
    let service = MovimientoService::new(state.db);
    let movimientos = service.listar_insumos().await?;
    Ok(Json(movimientos))
}
