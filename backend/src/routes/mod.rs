//! Route definitions for the Inventario POS platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - product catalog
        .nest("/productos", producto_routes())
        // Protected routes - warehouses
        .nest("/almacenes", almacen_routes())
        // Protected routes - suppliers
        .nest("/proveedores", proveedor_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
        // Protected routes - movement log
        .nest("/movimientos", movimiento_routes())
        // Protected routes - purchase orders
        .nest("/ordenes-compra", orden_compra_routes())
        // Protected routes - sales
        .nest("/ventas", venta_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Product catalog routes (protected)
fn producto_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_productos).post(handlers::create_producto),
        )
        .route("/buscar", get(handlers::buscar_productos))
        .route("/barcode/:barcode", get(handlers::get_producto_por_barcode))
        .route(
            "/:producto_id",
            get(handlers::get_producto)
                .put(handlers::update_producto)
                .delete(handlers::delete_producto),
        )
        .route(
            "/:producto_id/precio-almacen/:almacen_id",
            put(handlers::upsert_precio_almacen).delete(handlers::delete_precio_almacen),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Warehouse routes (protected)
fn almacen_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_almacenes).post(handlers::create_almacen),
        )
        .route(
            "/:almacen_id",
            get(handlers::get_almacen)
                .put(handlers::update_almacen)
                .delete(handlers::delete_almacen),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Supplier routes (protected)
fn proveedor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_proveedores).post(handlers::create_proveedor),
        )
        .route(
            "/:proveedor_id",
            get(handlers::get_proveedor)
                .put(handlers::update_proveedor)
                .delete(handlers::delete_proveedor),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock).post(handlers::create_stock))
        .route("/ajuste", post(handlers::ajustar_stock))
        .route("/entrada", post(handlers::registrar_entrada))
        .route("/insumo", post(handlers::registrar_insumo))
        .route("/insumo/cancelar", post(handlers::cancelar_insumo))
        .route("/traspaso", post(handlers::traspasar_stock))
        .route("/almacen/:almacen_id", get(handlers::stock_por_almacen))
        .route("/:producto_id/:almacen_id", get(handlers::get_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Movement log routes (protected)
fn movimiento_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movimientos).post(handlers::create_movimiento),
        )
        .route("/insumos", get(handlers::list_insumos))
        .route("/:movimiento_id", get(handlers::get_movimiento))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Purchase order routes (protected)
fn orden_compra_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_ordenes_compra).post(handlers::create_orden_compra),
        )
        .route("/:orden_id", get(handlers::get_orden_compra))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sales routes (protected)
fn venta_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_ventas).post(handlers::create_venta))
        .route("/:venta_id", get(handlers::get_venta))
        .route("/:venta_id/estado", put(handlers::update_estado_venta))
        .route_layer(middleware::from_fn(auth_middleware))
}
