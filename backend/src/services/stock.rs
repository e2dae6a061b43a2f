//! Stock ledger service
//!
//! The single choke point for mutating on-hand quantity. Every write goes
//! through [`StockService::ajustar_en_tx`], which locks the target
//! (producto, almacén) row for the duration of the enclosing transaction:
//! concurrent adjusters of the same pair are serialized, different pairs
//! never block each other, and no adjustment can drive a quantity negative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::{AppError, AppResult};
use crate::services::movimiento::{MovimientoService, NuevoMovimiento};
use crate::services::producto::ProductoService;
use shared::{
    aplicar_delta, validar_clasificacion, validar_movimiento, Cantidad, ErrorAjuste,
    TipoMovimiento,
};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Current on-hand row for one product in one warehouse.
///
/// Exactly one of {cantidad, cantidad_gramos} is live per the product's
/// classification; the other is forced to 0 / NULL on every write.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockRow {
    pub producto_id: i32,
    pub almacen_id: i32,
    pub cantidad: i32,
    pub cantidad_gramos: Option<Decimal>,
    pub last_updated: DateTime<Utc>,
}

/// Input for receiving stock into a warehouse
#[derive(Debug, Deserialize)]
pub struct EntradaInput {
    pub producto_id: i32,
    pub almacen_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
    pub motivo: Option<String>,
    pub proveedor_id: Option<i32>,
    pub precio_unitario: Option<Decimal>,
    pub precio_total: Option<Decimal>,
}

/// Input for consuming stock as a production input
#[derive(Debug, Deserialize)]
pub struct InsumoInput {
    pub producto_id: i32,
    pub almacen_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
}

/// Input for reversing an insumo movement
#[derive(Debug, Deserialize)]
pub struct CancelarInsumoInput {
    pub movimiento_id: i64,
}

/// Input for transferring stock between warehouses
#[derive(Debug, Deserialize)]
pub struct TraspasoInput {
    pub producto_id: i32,
    pub origen_almacen: i32,
    pub destino_almacen: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
    pub motivo: Option<String>,
}

/// Input for a raw manual adjustment (signed delta, no movement row)
#[derive(Debug, Deserialize)]
pub struct AjusteInput {
    pub producto_id: i32,
    pub almacen_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
}

/// Input for manually seeding a stock row
#[derive(Debug, Deserialize)]
pub struct CrearStockInput {
    pub producto_id: i32,
    pub almacen_id: i32,
    pub cantidad: Option<i32>,
    pub cantidad_gramos: Option<Decimal>,
}

/// Both sides of a completed transfer
#[derive(Debug, Serialize)]
pub struct TraspasoResultado {
    pub origen: StockRow,
    pub destino: StockRow,
}

/// Normalized on-hand total for one product in a warehouse
#[derive(Debug, Serialize)]
pub struct TotalPorProducto {
    pub producto_id: i32,
    pub es_por_gramos: bool,
    pub cantidad_total: Decimal,
}

/// Warehouse view: raw rows plus the normalized per-product totals
#[derive(Debug, Serialize)]
pub struct StockPorAlmacen {
    pub almacen_id: i32,
    pub productos_en_almacen: Vec<StockRow>,
    pub stock_total_por_producto: Vec<TotalPorProducto>,
}

const SELECT_STOCK: &str = r#"
    SELECT producto_id, almacen_id, cantidad, cantidad_gramos, last_updated
    FROM stock_actual
"#;

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply a signed delta to the stock of a product in a warehouse.
    ///
    /// Convenience wrapper opening its own transaction; multi-step
    /// operations join [`Self::ajustar_en_tx`] instead.
    pub async fn ajustar(
        &self,
        producto_id: i32,
        almacen_id: i32,
        delta: Cantidad,
    ) -> AppResult<StockRow> {
        let mut tx = self.db.begin().await?;
        let stock = Self::ajustar_en_tx(&mut tx, producto_id, almacen_id, delta).await?;
        tx.commit().await?;
        Ok(stock)
    }

    /// Locked read-compute-write cycle against one stock row.
    ///
    /// 1. Classifies the product itself (the delta unit must match; the
    ///    caller's word is not taken for it).
    /// 2. Inserts the zero row if absent, tolerating concurrent first
    ///    writers via ON CONFLICT DO NOTHING.
    /// 3. Takes the row lock (`FOR UPDATE`), serializing all concurrent
    ///    adjusters of this (producto, almacén) pair.
    /// 4. Applies the delta; a result below zero aborts with the deficit.
    /// 5. Writes the authoritative field, forces the other to 0 / NULL and
    ///    stamps `last_updated`.
    pub(crate) async fn ajustar_en_tx(
        tx: &mut Transaction<'_, Postgres>,
        producto_id: i32,
        almacen_id: i32,
        delta: Cantidad,
    ) -> AppResult<StockRow> {
        let producto = ProductoService::clasificar(&mut **tx, producto_id).await?;
        validar_clasificacion(&producto.nombre, producto.es_por_gramos, &delta)
            .map_err(AppError::ValidationError)?;

        sqlx::query(
            r#"
            INSERT INTO stock_actual (producto_id, almacen_id, cantidad, cantidad_gramos)
            VALUES ($1, $2, 0, NULL)
            ON CONFLICT (producto_id, almacen_id) DO NOTHING
            "#,
        )
        .bind(producto_id)
        .bind(almacen_id)
        .execute(&mut **tx)
        .await?;

        let row = sqlx::query_as::<_, StockRow>(&format!(
            "{} WHERE producto_id = $1 AND almacen_id = $2 FOR UPDATE",
            SELECT_STOCK
        ))
        .bind(producto_id)
        .bind(almacen_id)
        .fetch_one(&mut **tx)
        .await?;

        let actual = if producto.es_por_gramos {
            Cantidad::Gramos(row.cantidad_gramos.unwrap_or(Decimal::ZERO))
        } else {
            Cantidad::Piezas(row.cantidad)
        };

        let nuevo = aplicar_delta(actual, delta).map_err(|e| match e {
            ErrorAjuste::Insuficiente { unidad, deficit } => AppError::InsufficientStock {
                producto_id,
                almacen_id,
                unidad,
                deficit,
            },
            ErrorAjuste::UnidadIncompatible => {
                AppError::ValidationError("el ajuste no coincide con la unidad del stock".to_string())
            }
        })?;

        let (cantidad, cantidad_gramos) = match nuevo.normalizada() {
            Cantidad::Piezas(p) => (p, None),
            Cantidad::Gramos(g) => (0, Some(g)),
        };

        let actualizado = sqlx::query_as::<_, StockRow>(
            r#"
            UPDATE stock_actual
            SET cantidad = $3, cantidad_gramos = $4, last_updated = NOW()
            WHERE producto_id = $1 AND almacen_id = $2
            RETURNING producto_id, almacen_id, cantidad, cantidad_gramos, last_updated
            "#,
        )
        .bind(producto_id)
        .bind(almacen_id)
        .bind(cantidad)
        .bind(cantidad_gramos)
        .fetch_one(&mut **tx)
        .await?;

        Ok(actualizado)
    }

    /// Manual adjustment endpoint body: the delta is signed and no movement
    /// row is written.
    pub async fn ajustar_manual(&self, input: AjusteInput) -> AppResult<StockRow> {
        let delta = Cantidad::from_partes(input.cantidad, input.cantidad_gramos)
            .map_err(|m| AppError::validation("cantidad", m))?;
        self.ajustar(input.producto_id, input.almacen_id, delta).await
    }

    /// Receive stock: positive adjustment plus an `entrada` movement, one
    /// transaction.
    pub async fn registrar_entrada(
        &self,
        usuario_id: Option<i32>,
        input: EntradaInput,
    ) -> AppResult<StockRow> {
        let mut tx = self.db.begin().await?;

        let cantidad = Cantidad::from_partes(input.cantidad, input.cantidad_gramos)
            .map_err(|m| AppError::validation("cantidad", m))?;

        let stock =
            Self::ajustar_en_tx(&mut tx, input.producto_id, input.almacen_id, cantidad).await?;

        MovimientoService::registrar_en_tx(
            &mut tx,
            NuevoMovimiento {
                producto_id: input.producto_id,
                origen_almacen: None,
                destino_almacen: Some(input.almacen_id),
                cantidad,
                tipo: TipoMovimiento::Entrada,
                usuario_id,
                motivo: Some(
                    input
                        .motivo
                        .unwrap_or_else(|| "Reposición de stock".to_string()),
                ),
                proveedor_id: input.proveedor_id,
                precio_unitario: input.precio_unitario,
                precio_total: input.precio_total,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(stock)
    }

    /// Consume stock as a production input: negative adjustment plus an
    /// `insumo` movement, one transaction. The movement keeps the positive
    /// consumed magnitude so the reversal can re-apply it.
    pub async fn registrar_insumo(
        &self,
        usuario_id: Option<i32>,
        input: InsumoInput,
    ) -> AppResult<StockRow> {
        let mut tx = self.db.begin().await?;

        let producto = ProductoService::clasificar(&mut *tx, input.producto_id).await?;
        let cantidad = Cantidad::from_partes(input.cantidad, input.cantidad_gramos)
            .map_err(|m| AppError::validation("cantidad", m))?;

        let stock = Self::ajustar_en_tx(
            &mut tx,
            input.producto_id,
            input.almacen_id,
            cantidad.negada(),
        )
        .await?;

        MovimientoService::registrar_en_tx(
            &mut tx,
            NuevoMovimiento {
                producto_id: input.producto_id,
                origen_almacen: Some(input.almacen_id),
                destino_almacen: None,
                cantidad,
                tipo: TipoMovimiento::Insumo,
                usuario_id,
                motivo: Some(format!(
                    "El producto \"{}\" fue utilizado como insumo",
                    producto.nombre
                )),
                proveedor_id: None,
                precio_unitario: None,
                precio_total: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(stock)
    }

    /// Reverse an insumo: re-apply the consumed quantity and delete the
    /// movement row. The only supported undo path in the system.
    pub async fn cancelar_insumo(&self, input: CancelarInsumoInput) -> AppResult<StockRow> {
        let mut tx = self.db.begin().await?;

        let movimiento = MovimientoService::obtener_en_tx(&mut tx, input.movimiento_id).await?;

        if movimiento.tipo != TipoMovimiento::Insumo.as_str() {
            return Err(AppError::validation(
                "movimiento_id",
                "Solo se pueden cancelar movimientos de tipo \"insumo\"",
            ));
        }
        let origen = movimiento.origen_almacen.ok_or_else(|| {
            AppError::validation(
                "movimiento_id",
                "El movimiento de insumo no tiene un almacén origen definido",
            )
        })?;

        let cantidad = Cantidad::from_partes(movimiento.cantidad, movimiento.cantidad_gramos)
            .map_err(|m| AppError::validation("movimiento_id", m))?;

        let stock =
            Self::ajustar_en_tx(&mut tx, movimiento.producto_id, origen, cantidad).await?;
        MovimientoService::eliminar_en_tx(&mut tx, movimiento.id).await?;

        tx.commit().await?;
        Ok(stock)
    }

    /// Transfer stock between two warehouses: decrement origin, increment
    /// destination and write a single `traspaso` movement, one transaction.
    pub async fn traspasar(
        &self,
        usuario_id: Option<i32>,
        input: TraspasoInput,
    ) -> AppResult<TraspasoResultado> {
        // Reject same-warehouse transfers before touching any row
        validar_movimiento(
            TipoMovimiento::Traspaso,
            Some(input.origen_almacen),
            Some(input.destino_almacen),
        )
        .map_err(|m| AppError::validation("destino_almacen", m))?;

        let mut tx = self.db.begin().await?;

        let cantidad = Cantidad::from_partes(input.cantidad, input.cantidad_gramos)
            .map_err(|m| AppError::validation("cantidad", m))?;

        let origen = Self::ajustar_en_tx(
            &mut tx,
            input.producto_id,
            input.origen_almacen,
            cantidad.negada(),
        )
        .await?;
        let destino =
            Self::ajustar_en_tx(&mut tx, input.producto_id, input.destino_almacen, cantidad)
                .await?;

        MovimientoService::registrar_en_tx(
            &mut tx,
            NuevoMovimiento {
                producto_id: input.producto_id,
                origen_almacen: Some(input.origen_almacen),
                destino_almacen: Some(input.destino_almacen),
                cantidad,
                tipo: TipoMovimiento::Traspaso,
                usuario_id,
                motivo: Some(
                    input
                        .motivo
                        .unwrap_or_else(|| "Traspaso entre almacenes".to_string()),
                ),
                proveedor_id: None,
                precio_unitario: None,
                precio_total: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(TraspasoResultado { origen, destino })
    }

    /// Manually seed a stock row (explicit API, distinct from the lazy
    /// creation the adjuster performs)
    pub async fn crear(&self, input: CrearStockInput) -> AppResult<StockRow> {
        let producto = ProductoService::clasificar(&self.db, input.producto_id).await?;

        let cantidad = match (input.cantidad, input.cantidad_gramos) {
            (None, None) => {
                if producto.es_por_gramos {
                    Cantidad::Gramos(Decimal::ZERO)
                } else {
                    Cantidad::Piezas(0)
                }
            }
            (piezas, gramos) => {
                let cantidad = Cantidad::from_partes(piezas, gramos)
                    .map_err(|m| AppError::validation("cantidad", m))?;
                validar_clasificacion(&producto.nombre, producto.es_por_gramos, &cantidad)
                    .map_err(AppError::ValidationError)?;
                cantidad
            }
        };

        if cantidad.magnitud() < Decimal::ZERO {
            return Err(AppError::validation(
                "cantidad",
                "La cantidad inicial no puede ser negativa",
            ));
        }

        let (piezas, gramos) = cantidad.como_partes();
        let stock = sqlx::query_as::<_, StockRow>(
            r#"
            INSERT INTO stock_actual (producto_id, almacen_id, cantidad, cantidad_gramos)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (producto_id, almacen_id) DO NOTHING
            RETURNING producto_id, almacen_id, cantidad, cantidad_gramos, last_updated
            "#,
        )
        .bind(input.producto_id)
        .bind(input.almacen_id)
        .bind(piezas.unwrap_or(0))
        .bind(gramos)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Conflict {
            resource: "stock".to_string(),
            message: format!(
                "Stock already exists for product {} in warehouse {}",
                input.producto_id, input.almacen_id
            ),
            message_es: format!(
                "Ya existe stock para el producto {} en el almacén {}",
                input.producto_id, input.almacen_id
            ),
        })?;

        Ok(stock)
    }

    /// Plain read, no lock
    pub async fn obtener(&self, producto_id: i32, almacen_id: i32) -> AppResult<StockRow> {
        let stock = sqlx::query_as::<_, StockRow>(&format!(
            "{} WHERE producto_id = $1 AND almacen_id = $2",
            SELECT_STOCK
        ))
        .bind(producto_id)
        .bind(almacen_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Stock para producto {} en almacén {}",
                producto_id, almacen_id
            ))
        })?;

        Ok(stock)
    }

    /// All stock rows
    pub async fn listar(&self) -> AppResult<Vec<StockRow>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            "{} ORDER BY producto_id, almacen_id",
            SELECT_STOCK
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Per-warehouse reporting view: raw rows plus the authoritative total
    /// per product. Totals are normalized in Rust so the classification
    /// predicate stays single-sourced.
    pub async fn por_almacen(&self, almacen_id: i32) -> AppResult<StockPorAlmacen> {
        let filas = sqlx::query_as::<
            _,
            (i32, i32, Option<Decimal>, DateTime<Utc>, String, Option<String>),
        >(
            r#"
            SELECT s.producto_id, s.cantidad, s.cantidad_gramos, s.last_updated,
                   u.nombre, u.abreviatura
            FROM stock_actual s
            JOIN producto p ON p.id = s.producto_id
            JOIN unidad u ON u.id = p.unidad_id
            WHERE s.almacen_id = $1
            ORDER BY s.producto_id
            "#,
        )
        .bind(almacen_id)
        .fetch_all(&self.db)
        .await?;

        let mut productos_en_almacen = Vec::with_capacity(filas.len());
        let mut stock_total_por_producto = Vec::with_capacity(filas.len());

        for (producto_id, cantidad, cantidad_gramos, last_updated, unidad, abreviatura) in filas {
            let es_por_gramos = shared::es_unidad_por_gramos(&unidad, abreviatura.as_deref());
            let cantidad_total = if es_por_gramos {
                cantidad_gramos.unwrap_or(Decimal::ZERO)
            } else {
                Decimal::from(cantidad)
            };

            productos_en_almacen.push(StockRow {
                producto_id,
                almacen_id,
                cantidad,
                cantidad_gramos,
                last_updated,
            });
            stock_total_por_producto.push(TotalPorProducto {
                producto_id,
                es_por_gramos,
                cantidad_total,
            });
        }

        Ok(StockPorAlmacen {
            almacen_id,
            productos_en_almacen,
            stock_total_por_producto,
        })
    }
}
