//! Business logic services for the Inventario POS platform

pub mod almacen;
pub mod auth;
pub mod movimiento;
pub mod orden_compra;
pub mod producto;
pub mod proveedor;
pub mod stock;
pub mod venta;

pub use almacen::AlmacenService;
pub use auth::AuthService;
pub use movimiento::MovimientoService;
pub use orden_compra::OrdenCompraService;
pub use producto::ProductoService;
pub use proveedor::ProveedorService;
pub use stock::StockService;
pub use venta::VentaService;
