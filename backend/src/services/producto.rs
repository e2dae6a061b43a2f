//! Product catalog service
//!
//! Owns product identity, pricing and the unit-of-measure classification
//! that decides which stock field is authoritative for each product. The
//! stock ledger and every orchestrator consult [`ProductoService::clasificar`]
//! instead of trusting client-supplied flags.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{es_unidad_por_gramos, sku_prefijo};

/// Product catalog service
#[derive(Clone)]
pub struct ProductoService {
    db: PgPool,
}

/// Catalog row as persisted
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Producto {
    pub id: i32,
    pub sku: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub unidad_id: i32,
    pub categoria_id: Option<i32>,
    pub barcode: Option<String>,
    pub precio_base: Decimal,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product joined with its unit and the resolved price
#[derive(Debug, Clone, Serialize)]
pub struct ProductoDetalle {
    #[serde(flatten)]
    pub producto: Producto,
    pub unidad_nombre: String,
    pub unidad_abreviatura: Option<String>,
    pub es_por_gramos: bool,
    pub precio_final: Decimal,
}

/// Minimal projection the stock ledger needs to classify a delta
#[derive(Debug, Clone)]
pub struct ClasificacionProducto {
    pub id: i32,
    pub nombre: String,
    pub es_por_gramos: bool,
}

/// Input for creating (or reviving) a product
#[derive(Debug, Deserialize)]
pub struct CrearProductoInput {
    pub sku: Option<String>,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub unidad_id: i32,
    pub categoria_id: Option<i32>,
    pub precio_base: Option<Decimal>,
    pub barcode: Option<String>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct ActualizarProductoInput {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub unidad_id: Option<i32>,
    pub categoria_id: Option<i32>,
    pub precio_base: Option<Decimal>,
    pub barcode: Option<String>,
}

/// Search filters for the catalog
#[derive(Debug, Default, Deserialize)]
pub struct BuscarProductosInput {
    pub nombre: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub categoria_id: Option<i32>,
    pub unidad_id: Option<i32>,
    pub almacen_id: Option<i32>,
    pub con_stock: Option<bool>,
}

/// Input for the per-warehouse price override
#[derive(Debug, Deserialize)]
pub struct PrecioAlmacenInput {
    pub precio: Decimal,
    pub moneda: Option<String>,
}

/// Per-warehouse price override row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrecioAlmacen {
    pub producto_id: i32,
    pub almacen_id: i32,
    pub precio: Decimal,
    pub moneda: String,
}

#[derive(Debug, FromRow)]
struct ProductoConUnidadRow {
    id: i32,
    sku: String,
    nombre: String,
    descripcion: Option<String>,
    unidad_id: i32,
    categoria_id: Option<i32>,
    barcode: Option<String>,
    precio_base: Decimal,
    activo: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    unidad_nombre: String,
    unidad_abreviatura: Option<String>,
    precio_override: Option<Decimal>,
}

impl From<ProductoConUnidadRow> for ProductoDetalle {
    fn from(row: ProductoConUnidadRow) -> Self {
        let es_por_gramos =
            es_unidad_por_gramos(&row.unidad_nombre, row.unidad_abreviatura.as_deref());
        let precio_final = row.precio_override.unwrap_or(row.precio_base);
        ProductoDetalle {
            producto: Producto {
                id: row.id,
                sku: row.sku,
                nombre: row.nombre,
                descripcion: row.descripcion,
                unidad_id: row.unidad_id,
                categoria_id: row.categoria_id,
                barcode: row.barcode,
                precio_base: row.precio_base,
                activo: row.activo,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            unidad_nombre: row.unidad_nombre,
            unidad_abreviatura: row.unidad_abreviatura,
            es_por_gramos,
            precio_final,
        }
    }
}

const SELECT_DETALLE: &str = r#"
    SELECT p.id, p.sku, p.nombre, p.descripcion, p.unidad_id, p.categoria_id,
           p.barcode, p.precio_base, p.activo, p.created_at, p.updated_at,
           u.nombre AS unidad_nombre, u.abreviatura AS unidad_abreviatura,
           NULL::numeric AS precio_override
    FROM producto p
    JOIN unidad u ON u.id = p.unidad_id
"#;

impl ProductoService {
    /// Create a new ProductoService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Classification projection consumed by the stock ledger.
    ///
    /// Takes any executor so it can run inside the ledger's transaction.
    pub async fn clasificar<'e, E>(executor: E, producto_id: i32) -> AppResult<ClasificacionProducto>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, (i32, String, String, Option<String>)>(
            r#"
            SELECT p.id, p.nombre, u.nombre, u.abreviatura
            FROM producto p
            JOIN unidad u ON u.id = p.unidad_id
            WHERE p.id = $1
            "#,
        )
        .bind(producto_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Producto {}", producto_id)))?;

        Ok(ClasificacionProducto {
            id: row.0,
            nombre: row.1,
            es_por_gramos: es_unidad_por_gramos(&row.2, row.3.as_deref()),
        })
    }

    /// Resolved price for a product, honoring the warehouse override.
    pub async fn precio_final<'e, E>(
        executor: E,
        producto_id: i32,
        almacen_id: Option<i32>,
    ) -> AppResult<Decimal>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, (Decimal, Option<Decimal>)>(
            r#"
            SELECT p.precio_base, ppa.precio
            FROM producto p
            LEFT JOIN producto_precio_almacen ppa
                ON ppa.producto_id = p.id AND ppa.almacen_id = $2
            WHERE p.id = $1
            "#,
        )
        .bind(producto_id)
        .bind(almacen_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Producto {}", producto_id)))?;

        Ok(row.1.unwrap_or(row.0))
    }

    /// Create a product, reviving a soft-deleted one on barcode collision.
    ///
    /// The revive transition overwrites exactly the fields supplied here and
    /// flips `activo` back on; colliding with an active barcode or a foreign
    /// SKU is a conflict.
    pub async fn crear(&self, input: CrearProductoInput) -> AppResult<Producto> {
        let nombre = input.nombre.trim().to_string();
        if nombre.is_empty() {
            return Err(AppError::validation("nombre", "El nombre es obligatorio"));
        }

        let sku = match input.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_uppercase(),
            None => Self::generar_sku(&nombre),
        };
        let barcode = input
            .barcode
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        let descripcion = input.descripcion.as_deref().map(str::trim).map(str::to_string);

        let existing_sku = sqlx::query_as::<_, Producto>(
            "SELECT * FROM producto WHERE sku = $1",
        )
        .bind(&sku)
        .fetch_optional(&self.db)
        .await?;

        let existing_barcode = match &barcode {
            Some(code) => {
                sqlx::query_as::<_, Producto>("SELECT * FROM producto WHERE barcode = $1")
                    .bind(code)
                    .fetch_optional(&self.db)
                    .await?
            }
            None => None,
        };

        // A SKU collision is only tolerable when it is the same record we are
        // about to revive through its barcode.
        if let Some(con_sku) = &existing_sku {
            let mismo = existing_barcode
                .as_ref()
                .map(|b| b.id == con_sku.id)
                .unwrap_or(false);
            if !mismo {
                return Err(AppError::Conflict {
                    resource: "producto".to_string(),
                    message: format!("A product with SKU \"{}\" already exists", sku),
                    message_es: format!("El producto con SKU \"{}\" ya existe.", sku),
                });
            }
        }

        if let Some(previo) = existing_barcode {
            if previo.activo {
                return Err(AppError::Conflict {
                    resource: "producto".to_string(),
                    message: format!(
                        "An active product with this barcode already exists (ID {}, name \"{}\")",
                        previo.id, previo.nombre
                    ),
                    message_es: format!(
                        "Ya existe un producto activo con ese código de barras. (ID {}, Nombre: \"{}\")",
                        previo.id, previo.nombre
                    ),
                });
            }

            tracing::debug!(id = previo.id, "Reactivando producto inactivo por barcode");

            let producto = sqlx::query_as::<_, Producto>(
                r#"
                UPDATE producto SET
                    nombre = $2,
                    descripcion = COALESCE($3, descripcion),
                    unidad_id = $4,
                    categoria_id = COALESCE($5, categoria_id),
                    sku = $6,
                    precio_base = COALESCE($7, precio_base),
                    barcode = COALESCE($8, barcode),
                    activo = TRUE,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(previo.id)
            .bind(&nombre)
            .bind(&descripcion)
            .bind(input.unidad_id)
            .bind(input.categoria_id)
            .bind(&sku)
            .bind(input.precio_base)
            .bind(&barcode)
            .fetch_one(&self.db)
            .await?;

            return Ok(producto);
        }

        let producto = sqlx::query_as::<_, Producto>(
            r#"
            INSERT INTO producto (sku, nombre, descripcion, unidad_id, categoria_id, precio_base, barcode, activo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING *
            "#,
        )
        .bind(&sku)
        .bind(&nombre)
        .bind(&descripcion)
        .bind(input.unidad_id)
        .bind(input.categoria_id)
        .bind(input.precio_base.unwrap_or(Decimal::ZERO))
        .bind(&barcode)
        .fetch_one(&self.db)
        .await?;

        Ok(producto)
    }

    /// Get a product with its unit and classification flag
    pub async fn obtener(&self, id: i32) -> AppResult<ProductoDetalle> {
        let row = sqlx::query_as::<_, ProductoConUnidadRow>(
            &format!("{} WHERE p.id = $1", SELECT_DETALLE),
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Producto {}", id)))?;

        Ok(row.into())
    }

    /// Look a product up by barcode (active or not)
    pub async fn por_barcode(&self, barcode: &str) -> AppResult<ProductoDetalle> {
        let row = sqlx::query_as::<_, ProductoConUnidadRow>(
            &format!("{} WHERE p.barcode = $1", SELECT_DETALLE),
        )
        .bind(barcode)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Producto con barcode {}", barcode)))?;

        Ok(row.into())
    }

    /// List the whole catalog
    pub async fn listar(&self) -> AppResult<Vec<ProductoDetalle>> {
        let rows = sqlx::query_as::<_, ProductoConUnidadRow>(
            &format!("{} ORDER BY p.nombre", SELECT_DETALLE),
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Search active products, resolving the per-warehouse price when a
    /// warehouse filter is present.
    pub async fn buscar(&self, filtros: BuscarProductosInput) -> AppResult<Vec<ProductoDetalle>> {
        let con_stock = filtros.con_stock.unwrap_or(false);

        let rows = sqlx::query_as::<_, ProductoConUnidadRow>(
            r#"
            SELECT p.id, p.sku, p.nombre, p.descripcion, p.unidad_id, p.categoria_id,
                   p.barcode, p.precio_base, p.activo, p.created_at, p.updated_at,
                   u.nombre AS unidad_nombre, u.abreviatura AS unidad_abreviatura,
                   ppa.precio AS precio_override
            FROM producto p
            JOIN unidad u ON u.id = p.unidad_id
            LEFT JOIN producto_precio_almacen ppa
                ON ppa.producto_id = p.id AND ppa.almacen_id = $6
            WHERE p.activo = TRUE
              AND ($1::text IS NULL OR p.nombre ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR p.sku = $2)
              AND ($3::text IS NULL OR p.barcode = $3)
              AND ($4::int IS NULL OR p.categoria_id = $4)
              AND ($5::int IS NULL OR p.unidad_id = $5)
              AND ($6::int IS NULL OR EXISTS (
                    SELECT 1 FROM stock_actual s
                    WHERE s.producto_id = p.id AND s.almacen_id = $6))
              AND (NOT $7::bool OR EXISTS (
                    SELECT 1 FROM stock_actual s
                    WHERE s.producto_id = p.id
                      AND ($6::int IS NULL OR s.almacen_id = $6)
                      AND (s.cantidad > 0 OR s.cantidad_gramos > 0)))
            ORDER BY p.nombre
            "#,
        )
        .bind(&filtros.nombre)
        .bind(&filtros.sku)
        .bind(&filtros.barcode)
        .bind(filtros.categoria_id)
        .bind(filtros.unidad_id)
        .bind(filtros.almacen_id)
        .bind(con_stock)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Update a product in place
    pub async fn actualizar(&self, id: i32, input: ActualizarProductoInput) -> AppResult<ProductoDetalle> {
        let result = sqlx::query(
            r#"
            UPDATE producto SET
                nombre = COALESCE($2, nombre),
                descripcion = COALESCE($3, descripcion),
                unidad_id = COALESCE($4, unidad_id),
                categoria_id = COALESCE($5, categoria_id),
                precio_base = COALESCE($6, precio_base),
                barcode = COALESCE($7, barcode),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.descripcion)
        .bind(input.unidad_id)
        .bind(input.categoria_id)
        .bind(input.precio_base)
        .bind(&input.barcode)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Producto {}", id)));
        }

        self.obtener(id).await
    }

    /// Soft delete: the product stays referenced by stock and movements
    pub async fn borrar_logico(&self, id: i32) -> AppResult<Producto> {
        let producto = sqlx::query_as::<_, Producto>(
            "UPDATE producto SET activo = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Producto {}", id)))?;

        Ok(producto)
    }

    /// Upsert the per-warehouse price override
    pub async fn upsert_precio_almacen(
        &self,
        producto_id: i32,
        almacen_id: i32,
        input: PrecioAlmacenInput,
    ) -> AppResult<PrecioAlmacen> {
        if input.precio <= Decimal::ZERO {
            return Err(AppError::validation("precio", "El precio debe ser > 0"));
        }

        // Clear 404 when the product does not exist
        Self::clasificar(&self.db, producto_id).await?;

        let precio = sqlx::query_as::<_, PrecioAlmacen>(
            r#"
            INSERT INTO producto_precio_almacen (producto_id, almacen_id, precio, moneda)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (producto_id, almacen_id)
            DO UPDATE SET precio = EXCLUDED.precio, moneda = EXCLUDED.moneda
            RETURNING producto_id, almacen_id, precio, moneda
            "#,
        )
        .bind(producto_id)
        .bind(almacen_id)
        .bind(input.precio)
        .bind(input.moneda.unwrap_or_else(|| "ARS".to_string()))
        .fetch_one(&self.db)
        .await?;

        Ok(precio)
    }

    /// Drop the override and fall back to the base price
    pub async fn eliminar_precio_almacen(&self, producto_id: i32, almacen_id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM producto_precio_almacen WHERE producto_id = $1 AND almacen_id = $2",
        )
        .bind(producto_id)
        .bind(almacen_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Override de precio para producto {} en almacén {}",
                producto_id, almacen_id
            )));
        }

        Ok(())
    }

    /// SKU composed of a prefix derived from the name plus a random suffix
    fn generar_sku(nombre: &str) -> String {
        let sufijo: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(6)
            .collect::<String>()
            .to_uppercase();
        format!("{}-{}", sku_prefijo(nombre), sufijo)
    }
}
