//! Sales service
//!
//! Checkout is one transaction: resolve prices, write the sale with its
//! items and the cash/bank income row, then decrement the ledger and log a
//! `salida` movement per item. Insufficient stock anywhere rolls the whole
//! sale back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::movimiento::{MovimientoService, NuevoMovimiento};
use crate::services::producto::ProductoService;
use crate::services::stock::StockService;
use shared::{
    campo_orden, precio_total_movimiento, validar_clasificacion, Cantidad, DireccionOrden,
    Pagina, Paginacion, TipoMovimiento,
};

/// Sales service
#[derive(Clone)]
pub struct VentaService {
    db: PgPool,
}

/// Sale states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoVenta {
    Pendiente,
    Confirmada,
    Cancelada,
}

impl EstadoVenta {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoVenta::Pendiente => "PENDIENTE",
            EstadoVenta::Confirmada => "CONFIRMADA",
            EstadoVenta::Cancelada => "CANCELADA",
        }
    }
}

/// How the income of a sale was collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoIngreso {
    Efectivo,
    Bancarizado,
}

impl TipoIngreso {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoIngreso::Efectivo => "EFECTIVO",
            TipoIngreso::Bancarizado => "BANCARIZADO",
        }
    }
}

/// Sale header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Venta {
    pub id: i32,
    pub fecha: DateTime<Utc>,
    pub total: Decimal,
    pub estado: String,
    pub usuario_id: Option<i32>,
    pub almacen_id: i32,
}

/// Sale line
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VentaItem {
    pub id: i32,
    pub venta_id: i32,
    pub producto_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
}

/// Sale header with its lines
#[derive(Debug, Serialize)]
pub struct VentaDetalle {
    #[serde(flatten)]
    pub venta: Venta,
    pub items: Vec<VentaItem>,
}

/// One line of an incoming sale
#[derive(Debug, Deserialize)]
pub struct ItemVentaInput {
    pub producto_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CrearVentaInput {
    pub almacen_id: i32,
    pub tipo_ingreso: TipoIngreso,
    pub items: Vec<ItemVentaInput>,
}

/// Input for updating the sale state
#[derive(Debug, Deserialize)]
pub struct ActualizarEstadoInput {
    pub estado: EstadoVenta,
}

/// Query-string filters for the sales listing
#[derive(Debug, Default, Deserialize)]
pub struct FiltroVentas {
    pub fecha_desde: Option<DateTime<Utc>>,
    pub fecha_hasta: Option<DateTime<Utc>>,
    pub usuario_id: Option<i32>,
    pub estado: Option<String>,
    pub almacen_id: Option<i32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub orden_campo: Option<String>,
    pub orden_direccion: Option<DireccionOrden>,
}

impl VentaService {
    /// Create a new VentaService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Complete a sale atomically.
    ///
    /// Prices come from the catalog (per-warehouse override, then base
    /// price), never from the client.
    pub async fn crear(
        &self,
        usuario_id: Option<i32>,
        input: CrearVentaInput,
    ) -> AppResult<VentaDetalle> {
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "La venta debe incluir al menos un ítem",
            ));
        }

        let mut tx = self.db.begin().await?;

        let almacen_existe =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM almacen WHERE id = $1)")
                .bind(input.almacen_id)
                .fetch_one(&mut *tx)
                .await?;
        if !almacen_existe {
            return Err(AppError::NotFound(format!("Almacén {}", input.almacen_id)));
        }

        // Resolve quantities and prices for every line first
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

            let precio_unitario = ProductoService::precio_final(
                &mut *tx,
                item.producto_id,
                Some(input.almacen_id),
            )
            .await?;
            let subtotal = precio_total_movimiento(&cantidad, precio_unitario);
            procesados.push((item.producto_id, cantidad, precio_unitario, subtotal));
        }

        let total: Decimal = procesados.iter().map(|(_, _, _, s)| *s).sum();

        let venta = sqlx::query_as::<_, Venta>(
            r#"
            INSERT INTO venta (total, estado, usuario_id, almacen_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, fecha, total, estado, usuario_id, almacen_id
            "#,
        )
        .bind(total)
        .bind(EstadoVenta::Confirmada.as_str())
        .bind(usuario_id)
        .bind(input.almacen_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(procesados.len());
        for (producto_id, cantidad, precio_unitario, subtotal) in &procesados {
            let (piezas, gramos) = cantidad.como_partes();
            let item = sqlx::query_as::<_, VentaItem>(
                r#"
                INSERT INTO venta_item
                    (venta_id, producto_id, cantidad, cantidad_gramos, precio_unitario, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, venta_id, producto_id, cantidad, cantidad_gramos,
                          precio_unitario, subtotal
                "#,
            )
            .bind(venta.id)
            .bind(producto_id)
            .bind(piezas)
            .bind(gramos)
            .bind(precio_unitario)
            .bind(subtotal)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        // Cash/bank income tracking for the sale
        sqlx::query("INSERT INTO ingreso_venta (venta_id, tipo, monto) VALUES ($1, $2, $3)")
            .bind(venta.id)
            .bind(input.tipo_ingreso.as_str())
            .bind(total)
            .execute(&mut *tx)
            .await?;

        // Decrement stock and log one salida movement per line
        for (producto_id, cantidad, precio_unitario, subtotal) in &procesados {
            StockService::ajustar_en_tx(&mut tx, *producto_id, input.almacen_id, cantidad.negada())
                .await?;

            MovimientoService::registrar_en_tx(
                &mut tx,
                NuevoMovimiento {
                    producto_id: *producto_id,
                    origen_almacen: Some(input.almacen_id),
                    destino_almacen: None,
                    cantidad: *cantidad,
                    tipo: TipoMovimiento::Salida,
                    usuario_id,
                    motivo: Some(format!("Venta #{}", venta.id)),
                    proveedor_id: None,
                    precio_unitario: Some(*precio_unitario),
                    precio_total: Some(*subtotal),
                },
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(venta_id = venta.id, %total, "Venta registrada");

        Ok(VentaDetalle { venta, items })
    }

    /// Sale header plus its lines
    pub async fn obtener(&self, id: i32) -> AppResult<VentaDetalle> {
        let venta = sqlx::query_as::<_, Venta>(
            "SELECT id, fecha, total, estado, usuario_id, almacen_id FROM venta WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venta {}", id)))?;

        let items = sqlx::query_as::<_, VentaItem>(
            r#"
            SELECT id, venta_id, producto_id, cantidad, cantidad_gramos,
                   precio_unitario, subtotal
            FROM venta_item
            WHERE venta_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(VentaDetalle { venta, items })
    }

    /// Filtered, paginated listing
    pub async fn listar_filtrado(&self, filtros: FiltroVentas) -> AppResult<Pagina<Venta>> {
        let paginacion = Paginacion {
            page: filtros.page.unwrap_or(1),
            limit: filtros.limit.unwrap_or(50),
        }
        .normalizada();

        let orden_campo = campo_orden(
            filtros.orden_campo.as_deref(),
            &["fecha", "id", "estado"],
            "fecha",
        );
        let orden_direccion = filtros
            .orden_direccion
            .unwrap_or(DireccionOrden::Desc)
            .as_sql();

        // estado admits a comma-separated list, e.g. "CONFIRMADA,PENDIENTE"
        const WHERE_FILTROS: &str = r#"
            WHERE ($1::timestamptz IS NULL OR fecha >= $1)
              AND ($2::timestamptz IS NULL OR fecha <= $2)
              AND ($3::int IS NULL OR usuario_id = $3)
              AND ($4::text IS NULL OR estado = ANY(string_to_array($4, ',')))
              AND ($5::int IS NULL OR almacen_id = $5)
        "#;

        let estado = filtros
            .estado
            .as_deref()
            .map(|e| {
                e.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .filter(|e| !e.is_empty());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM venta {}",
            WHERE_FILTROS
        ))
        .bind(filtros.fecha_desde)
        .bind(filtros.fecha_hasta)
        .bind(filtros.usuario_id)
        .bind(&estado)
        .bind(filtros.almacen_id)
        .fetch_one(&self.db)
        .await?;

        let data = sqlx::query_as::<_, Venta>(&format!(
            r#"
            SELECT id, fecha, total, estado, usuario_id, almacen_id FROM venta
            {}
            ORDER BY {} {}
            LIMIT $6 OFFSET $7
            "#,
            WHERE_FILTROS, orden_campo, orden_direccion
        ))
        .bind(filtros.fecha_desde)
        .bind(filtros.fecha_hasta)
        .bind(filtros.usuario_id)
        .bind(&estado)
        .bind(filtros.almacen_id)
        .bind(i64::from(paginacion.limit))
        .bind(paginacion.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Pagina {
            data,
            total,
            page: paginacion.page,
            limit: paginacion.limit,
        })
    }

    /// Update the sale state
    pub async fn actualizar_estado(&self, id: i32, input: ActualizarEstadoInput) -> AppResult<Venta> {
        let venta = sqlx::query_as::<_, Venta>(
            r#"
            UPDATE venta SET estado = $2
            WHERE id = $1
            RETURNING id, fecha, total, estado, usuario_id, almacen_id
            "#,
        )
        .bind(id)
        .bind(input.estado.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venta {}", id)))?;

        Ok(venta)
    }
}
