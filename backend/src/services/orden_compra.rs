//! Purchase order service
//!
//! Receiving a supplier shipment is one transaction: order header, items,
//! one `entrada` movement and one positive ledger adjustment per item.
//! Any failure rolls back all of it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::movimiento::{MovimientoService, NuevoMovimiento};
use crate::services::producto::ProductoService;
use crate::services::stock::StockService;
use shared::{
    precio_total_movimiento, validar_clasificacion, Cantidad, Pagina, Paginacion, TipoMovimiento,
};

/// Purchase order service
#[derive(Clone)]
pub struct OrdenCompraService {
    db: PgPool,
}

/// Purchase order header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrdenCompra {
    pub id: i32,
    pub proveedor_id: i32,
    pub fecha: DateTime<Utc>,
    pub total: Option<Decimal>,
}

/// Purchase order line
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrdenCompraItem {
    pub id: i32,
    pub orden_compra_id: i32,
    pub producto_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
}

/// Order header with its lines
#[derive(Debug, Serialize)]
pub struct OrdenCompraDetalle {
    #[serde(flatten)]
    pub orden: OrdenCompra,
    pub items: Vec<OrdenCompraItem>,
}

/// One line of an incoming order
#[derive(Debug, Deserialize)]
pub struct ItemOrdenCompraInput {
    pub producto_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
    pub precio_unitario: Decimal,
}

/// Input for creating an order and receiving its stock
#[derive(Debug, Deserialize)]
pub struct CrearOrdenCompraInput {
    pub proveedor_id: i32,
    pub almacen_id: i32,
    pub items: Vec<ItemOrdenCompraInput>,
}

/// Confirmation returned after a successful receipt
#[derive(Debug, Serialize)]
pub struct OrdenCreada {
    pub mensaje: String,
    pub orden_id: i32,
    pub total: Decimal,
}

/// Query-string filters for the order listing
#[derive(Debug, Default, Deserialize)]
pub struct FiltroOrdenesCompra {
    pub fecha_desde: Option<DateTime<Utc>>,
    pub fecha_hasta: Option<DateTime<Utc>>,
    pub proveedor_id: Option<i32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl OrdenCompraService {
    /// Create a new OrdenCompraService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order and receive its stock atomically.
    pub async fn crear_con_stock(
        &self,
        usuario_id: Option<i32>,
        input: CrearOrdenCompraInput,
    ) -> AppResult<OrdenCreada> {
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "La orden debe incluir al menos un ítem",
            ));
        }

        let mut tx = self.db.begin().await?;

        let proveedor_existe = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM proveedor WHERE id = $1)",
        )
        .bind(input.proveedor_id)
        .fetch_one(&mut *tx)
        .await?;
        if !proveedor_existe {
            return Err(AppError::NotFound(format!(
                "Proveedor {}",
                input.proveedor_id
            )));
        }

        // Validate every line and compute subtotals before writing anything
        let mut procesados: Vec<(i32, Cantidad, Decimal, Decimal)> = Vec::new();
        for item in &input.items {
            let producto = ProductoService::clasificar(&mut *tx, item.producto_id).await?;
            let cantidad = Cantidad::from_partes(item.cantidad, item.cantidad_gramos)
                .map_err(|m| AppError::validation("cantidad", m))?;
            validar_clasificacion(&producto.nombre, producto.es_por_gramos, &cantidad)
                .map_err(AppError::ValidationError)?;
            if cantidad.magnitud() <= Decimal::ZERO {
                return Err(AppError::validation(
                    "cantidad",
                    format!("La cantidad del producto {} debe ser mayor a cero", producto.nombre),
                ));
            }
            if item.precio_unitario < Decimal::ZERO {
                return Err(AppError::validation(
                    "precio_unitario",
                    "El precio unitario no puede ser negativo",
                ));
            }

            // precio_unitario is per piece or per gram, matching the
            // product's classification
            let subtotal = precio_total_movimiento(&cantidad, item.precio_unitario);
            procesados.push((item.producto_id, cantidad, item.precio_unitario, subtotal));
        }

        let total: Decimal = procesados.iter().map(|(_, _, _, s)| *s).sum();

        let orden = sqlx::query_as::<_, OrdenCompra>(
            r#"
            INSERT INTO orden_compra (proveedor_id, total)
            VALUES ($1, $2)
            RETURNING id, proveedor_id, fecha, total
            "#,
        )
        .bind(input.proveedor_id)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for (producto_id, cantidad, precio_unitario, subtotal) in procesados {
            let (piezas, gramos) = cantidad.como_partes();

            sqlx::query(
                r#"
                INSERT INTO orden_compra_item
                    (orden_compra_id, producto_id, cantidad, cantidad_gramos, precio_unitario, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(orden.id)
            .bind(producto_id)
            .bind(piezas)
            .bind(gramos)
            .bind(precio_unitario)
            .bind(subtotal)
            .execute(&mut *tx)
            .await?;

            MovimientoService::registrar_en_tx(
                &mut tx,
                NuevoMovimiento {
                    producto_id,
                    origen_almacen: None,
                    destino_almacen: Some(input.almacen_id),
                    cantidad,
                    tipo: TipoMovimiento::Entrada,
                    usuario_id,
                    motivo: Some("Ingreso por orden de compra".to_string()),
                    proveedor_id: Some(input.proveedor_id),
                    precio_unitario: Some(precio_unitario),
                    precio_total: Some(subtotal),
                },
            )
            .await?;

            StockService::ajustar_en_tx(&mut tx, producto_id, input.almacen_id, cantidad).await?;
        }

        tx.commit().await?;

        tracing::info!(orden_id = orden.id, %total, "Orden de compra registrada");

        Ok(OrdenCreada {
            mensaje: "Stock ingresado y orden de compra registrada".to_string(),
            orden_id: orden.id,
            total,
        })
    }

    /// Order header plus its lines
    pub async fn obtener_detalle(&self, id: i32) -> AppResult<OrdenCompraDetalle> {
        let orden = sqlx::query_as::<_, OrdenCompra>(
            "SELECT id, proveedor_id, fecha, total FROM orden_compra WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Orden de compra {}", id)))?;

        let items = sqlx::query_as::<_, OrdenCompraItem>(
            r#"
            SELECT id, orden_compra_id, producto_id, cantidad, cantidad_gramos,
                   precio_unitario, subtotal
            FROM orden_compra_item
            WHERE orden_compra_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrdenCompraDetalle { orden, items })
    }

    /// Filtered, paginated listing with lines included
    pub async fn listar_filtrado(
        &self,
        filtros: FiltroOrdenesCompra,
    ) -> AppResult<Pagina<OrdenCompraDetalle>> {
        let paginacion = Paginacion {
            page: filtros.page.unwrap_or(1),
            limit: filtros.limit.unwrap_or(50),
        }
        .normalizada();

        const WHERE_FILTROS: &str = r#"
            WHERE ($1::timestamptz IS NULL OR fecha >= $1)
              AND ($2::timestamptz IS NULL OR fecha <= $2)
              AND ($3::int IS NULL OR proveedor_id = $3)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM orden_compra {}",
            WHERE_FILTROS
        ))
        .bind(filtros.fecha_desde)
        .bind(filtros.fecha_hasta)
        .bind(filtros.proveedor_id)
        .fetch_one(&self.db)
        .await?;

        let ordenes = sqlx::query_as::<_, OrdenCompra>(&format!(
            r#"
            SELECT id, proveedor_id, fecha, total FROM orden_compra
            {}
            ORDER BY fecha DESC
            LIMIT $4 OFFSET $5
            "#,
            WHERE_FILTROS
        ))
        .bind(filtros.fecha_desde)
        .bind(filtros.fecha_hasta)
        .bind(filtros.proveedor_id)
        .bind(i64::from(paginacion.limit))
        .bind(paginacion.offset())
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<i32> = ordenes.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrdenCompraItem>(
            r#"
            SELECT id, orden_compra_id, producto_id, cantidad, cantidad_gramos,
                   precio_unitario, subtotal
            FROM orden_compra_item
            WHERE orden_compra_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let data = ordenes
            .into_iter()
            .map(|orden| {
                let propios = items
                    .iter()
                    .filter(|i| i.orden_compra_id == orden.id)
                    .cloned()
                    .collect();
                OrdenCompraDetalle {
                    orden,
                    items: propios,
                }
            })
            .collect();

        Ok(Pagina {
            data,
            total,
            page: paginacion.page,
            limit: paginacion.limit,
        })
    }
}
