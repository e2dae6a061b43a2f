//! HTTP handlers for the Inventario POS platform

pub mod almacen;
pub mod auth;
pub mod health;
pub mod movimiento;
pub mod orden_compra;
pub mod producto;
pub mod proveedor;
pub mod stock;
pub mod venta;

pub use almacen::*;
pub use auth::*;
pub use health::*;
pub use movimiento::*;
pub use orden_compra::*;
pub use producto::*;
pub use proveedor::*;
pub use stock::*;
pub use venta::*;
