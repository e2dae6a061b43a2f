//! HTTP handlers for the stock ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{
    AjusteInput, CancelarInsumoInput, CrearStockInput, EntradaInput, InsumoInput, StockPorAlmacen,
    StockRow, StockService, TraspasoInput, TraspasoResultado,
};
use crate::AppState;

/// List every stock row
pub async fn list_stock(State(state): State<AppState>) -> AppResult<Json<Vec<StockRow>>> {
    let service = StockService::new(state.db);
    let rows = service.listar().await?;
    Ok(Json(rows))
}

/// Get the stock row for one product in one warehouse
pub async fn get_stock(
    State(state): State<AppState>,
    Path((producto_id, almacen_id)): Path<(i32, i32)>,
) -> AppResult<Json<StockRow>> {
    let service = StockService::new(state.db);
    let row = service.obtener(producto_id, almacen_id).await?;
    Ok(Json(row))
}

/// Manually seed a stock row
pub async fn create_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CrearStockInput>,
) -> AppResult<Json<StockRow>> {
    let service = StockService::new(state.db);
    let row = service.crear(input).await?;
    Ok(Json(row))
}

/// Apply a raw signed adjustment to a stock row
pub async fn ajustar_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<AjusteInput>,
) -> AppResult<Json<StockRow>> {
    let service = StockService::new(state.db);
    let row = service.ajustar_manual(input).await?;
    Ok(Json(row))
}

/// Receive stock into a warehouse
pub async fn registrar_entrada(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<EntradaInput>,
) -> AppResult<Json<StockRow>> {
    let service = StockService::new(state.db);
    let row = service
        .registrar_entrada(Some(current_user.0.user_id), input)
        .await?;
    Ok(Json(row))
}

/// Consume stock as a production input
pub async fn registrar_insumo(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<InsumoInput>,
) -> AppResult<Json<StockRow>> {
    let service = StockService::new(state.db);
    let row = service
        .registrar_insumo(Some(current_user.0.user_id), input)
        .await?;
    Ok(Json(row))
}

/// Reverse an insumo movement
pub async fn cancelar_insumo(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CancelarInsumoInput>,
) -> AppResult<Json<StockRow>> {
    let service = StockService::new(state.db);
    let row = service.cancelar_insumo(input).await?;
    Ok(Json(row))
}

/// Transfer stock between warehouses
pub async fn traspasar_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<TraspasoInput>,
) -> AppResult<Json<TraspasoResultado>> {
    let service = StockService::new(state.db);
    let resultado = service
        .traspasar(Some(current_user.0.user_id), input)
        .await?;
    Ok(Json(resultado))
}

/// Per-warehouse stock view with normalized totals
pub async fn stock_por_almacen(
    State(state): State<AppState>,
    Path(almacen_id): Path<i32>,
) -> AppResult<Json<StockPorAlmacen>> {
    let service = StockService::new(state.db);
    let vista = service.por_almacen(almacen_id).await?;
    Ok(Json(vista))
}
