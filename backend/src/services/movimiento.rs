//! Movement log service
//!
//! Append-only audit trail for every stock-affecting event. Rows are
//! created in the same transaction as the ledger adjustment they describe;
//! the only deletion path is the insumo reversal in the stock service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::{AppError, AppResult};
use crate::services::producto::ProductoService;
use shared::{
    campo_orden, precio_total_movimiento, validar_clasificacion, validar_movimiento, Cantidad,
    DireccionOrden, Pagina, Paginacion, TipoMovimiento,
};

/// Movement log service
#[derive(Clone)]
pub struct MovimientoService {
    db: PgPool,
}

/// Movement row as persisted
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movimiento {
    pub id: i64,
    pub producto_id: i32,
    pub origen_almacen: Option<i32>,
    pub destino_almacen: Option<i32>,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
    pub tipo: String,
    pub fecha: DateTime<Utc>,
    pub usuario_id: Option<i32>,
    pub motivo: Option<String>,
    pub proveedor_id: Option<i32>,
    pub precio_unitario: Option<Decimal>,
    pub precio_total: Option<Decimal>,
}

/// Validated movement ready for insertion
#[derive(Debug, Clone)]
pub struct NuevoMovimiento {
    pub producto_id: i32,
    pub origen_almacen: Option<i32>,
    pub destino_almacen: Option<i32>,
    pub cantidad: Cantidad,
    pub tipo: TipoMovimiento,
    pub usuario_id: Option<i32>,
    pub motivo: Option<String>,
    pub proveedor_id: Option<i32>,
    pub precio_unitario: Option<Decimal>,
    pub precio_total: Option<Decimal>,
}

/// Input for manually recording a movement
#[derive(Debug, Deserialize)]
pub struct RegistrarMovimientoInput {
    pub producto_id: i32,
    pub origen_almacen: Option<i32>,
    pub destino_almacen: Option<i32>,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
    pub tipo: TipoMovimiento,
    pub motivo: Option<String>,
    pub proveedor_id: Option<i32>,
    pub precio_unitario: Option<Decimal>,
    pub precio_total: Option<Decimal>,
}

/// Query-string filters for the movement listing
#[derive(Debug, Default, Deserialize)]
pub struct FiltroMovimientos {
    pub fecha_desde: Option<DateTime<Utc>>,
    pub fecha_hasta: Option<DateTime<Utc>>,
    pub usuario_id: Option<i32>,
    pub tipo: Option<TipoMovimiento>,
    pub proveedor_id: Option<i32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub orden_campo: Option<String>,
    pub orden_direccion: Option<DireccionOrden>,
}

const SELECT_MOVIMIENTO: &str = r#"
    SELECT id, producto_id, origen_almacen, destino_almacen, cantidad,
           cantidad_gramos, tipo, fecha, usuario_id, motivo, proveedor_id,
           precio_unitario, precio_total
    FROM movimiento_stock
"#;

impl MovimientoService {
    /// Create a new MovimientoService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a movement inside the caller's transaction.
    ///
    /// Validates the kind-specific warehouse rules before writing; the
    /// caller is responsible for pairing this with the matching ledger
    /// adjustment so the two commit or roll back together.
    pub(crate) async fn registrar_en_tx(
        tx: &mut Transaction<'_, Postgres>,
        mov: NuevoMovimiento,
    ) -> AppResult<Movimiento> {
        validar_movimiento(mov.tipo, mov.origen_almacen, mov.destino_almacen)
            .map_err(|m| AppError::validation("tipo", m))?;

        let (cantidad, cantidad_gramos) = mov.cantidad.como_partes();
        let precio_total = mov.precio_total.or_else(|| {
            mov.precio_unitario
                .map(|pu| precio_total_movimiento(&mov.cantidad, pu))
        });

        let registro = sqlx::query_as::<_, Movimiento>(
            r#"
            INSERT INTO movimiento_stock (
                producto_id, origen_almacen, destino_almacen, cantidad,
                cantidad_gramos, tipo, usuario_id, motivo, proveedor_id,
                precio_unitario, precio_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, producto_id, origen_almacen, destino_almacen, cantidad,
                      cantidad_gramos, tipo, fecha, usuario_id, motivo, proveedor_id,
                      precio_unitario, precio_total
            "#,
        )
        .bind(mov.producto_id)
        .bind(mov.origen_almacen)
        .bind(mov.destino_almacen)
        .bind(cantidad)
        .bind(cantidad_gramos)
        .bind(mov.tipo.as_str())
        .bind(mov.usuario_id)
        .bind(&mov.motivo)
        .bind(mov.proveedor_id)
        .bind(mov.precio_unitario)
        .bind(precio_total)
        .fetch_one(&mut **tx)
        .await?;

        Ok(registro)
    }

    /// Record a movement without touching the ledger.
    ///
    /// The quantity must match the product's classification at the time of
    /// the event; clients do not get to pick the field themselves.
    pub async fn registrar(
        &self,
        usuario_id: Option<i32>,
        input: RegistrarMovimientoInput,
    ) -> AppResult<Movimiento> {
        let mut tx = self.db.begin().await?;

        let producto = ProductoService::clasificar(&mut *tx, input.producto_id).await?;
        let cantidad = Cantidad::from_partes(input.cantidad, input.cantidad_gramos)
            .map_err(|m| AppError::validation("cantidad", m))?;
        validar_clasificacion(&producto.nombre, producto.es_por_gramos, &cantidad)
            .map_err(AppError::ValidationError)?;

        let registro = Self::registrar_en_tx(
            &mut tx,
            NuevoMovimiento {
                producto_id: input.producto_id,
                origen_almacen: input.origen_almacen,
                destino_almacen: input.destino_almacen,
                cantidad,
                tipo: input.tipo,
                usuario_id,
                motivo: input.motivo,
                proveedor_id: input.proveedor_id,
                precio_unitario: input.precio_unitario,
                precio_total: input.precio_total,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(registro)
    }

    /// Filtered, paginated listing for reporting
    pub async fn listar_filtrado(&self, filtros: FiltroMovimientos) -> AppResult<Pagina<Movimiento>> {
        let paginacion = Paginacion {
            page: filtros.page.unwrap_or(1),
            limit: filtros.limit.unwrap_or(50),
        }
        .normalizada();

        let orden_campo = campo_orden(
            filtros.orden_campo.as_deref(),
            &["fecha", "id", "tipo"],
            "fecha",
        );
        let orden_direccion = filtros
            .orden_direccion
            .unwrap_or(DireccionOrden::Desc)
            .as_sql();

        let tipo = filtros.tipo.map(|t| t.as_str());

        const WHERE_FILTROS: &str = r#"
            WHERE ($1::timestamptz IS NULL OR fecha >= $1)
              AND ($2::timestamptz IS NULL OR fecha <= $2)
              AND ($3::int IS NULL OR usuario_id = $3)
              AND ($4::text IS NULL OR tipo = $4)
              AND ($5::int IS NULL OR proveedor_id = $5)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM movimiento_stock {}",
            WHERE_FILTROS
        ))
        .bind(filtros.fecha_desde)
        .bind(filtros.fecha_hasta)
        .bind(filtros.usuario_id)
        .bind(tipo)
        .bind(filtros.proveedor_id)
        .fetch_one(&self.db)
        .await?;

        // orden_campo/orden_direccion come from whitelists, never from input
        let data = sqlx::query_as::<_, Movimiento>(&format!(
            "{} {} ORDER BY {} {} LIMIT $6 OFFSET $7",
            SELECT_MOVIMIENTO, WHERE_FILTROS, orden_campo, orden_direccion
        ))
        .bind(filtros.fecha_desde)
        .bind(filtros.fecha_hasta)
        .bind(filtros.usuario_id)
        .bind(tipo)
        .bind(filtros.proveedor_id)
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

    /// Get one movement by id
    pub async fn obtener(&self, id: i64) -> AppResult<Movimiento> {
        let mov = sqlx::query_as::<_, Movimiento>(&format!("{} WHERE id = $1", SELECT_MOVIMIENTO))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movimiento {}", id)))?;

        Ok(mov)
    }

    /// Transactional fetch used by the insumo reversal
    pub(crate) async fn obtener_en_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> AppResult<Movimiento> {
        let mov = sqlx::query_as::<_, Movimiento>(&format!("{} WHERE id = $1", SELECT_MOVIMIENTO))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movimiento {}", id)))?;

        Ok(mov)
    }

    /// Transactional delete used by the insumo reversal
    pub(crate) async fn eliminar_en_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM movimiento_stock WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Movimiento {}", id)));
        }

        Ok(())
    }

    /// All insumo movements, newest first
    pub async fn listar_insumos(&self) -> AppResult<Vec<Movimiento>> {
        let movimientos = sqlx::query_as::<_, Movimiento>(&format!(
            "{} WHERE tipo = 'insumo' ORDER BY fecha DESC",
            SELECT_MOVIMIENTO
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(movimientos)
    }
}
