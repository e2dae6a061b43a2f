//! Warehouse management service

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

/// Warehouse service
#[derive(Clone)]
pub struct AlmacenService {
    db: PgPool,
}

/// Warehouse row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Almacen {
    pub id: i32,
    pub nombre: String,
    pub ubicacion: Option<String>,
    pub capacidad: Option<i32>,
}

/// Input for creating a warehouse
#[derive(Debug, Deserialize)]
pub struct CrearAlmacenInput {
    pub nombre: String,
    pub ubicacion: Option<String>,
    pub capacidad: Option<i32>,
}

/// Input for updating a warehouse
#[derive(Debug, Deserialize)]
pub struct ActualizarAlmacenInput {
    pub nombre: Option<String>,
    pub ubicacion: Option<String>,
    pub capacidad: Option<i32>,
}

impl AlmacenService {
    /// Create a new AlmacenService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn crear(&self, input: CrearAlmacenInput) -> AppResult<Almacen> {
        if input.nombre.trim().is_empty() {
            return Err(AppError::validation("nombre", "El nombre es obligatorio"));
        }

        let almacen = sqlx::query_as::<_, Almacen>(
            r#"
            INSERT INTO almacen (nombre, ubicacion, capacidad)
            VALUES ($1, $2, $3)
            RETURNING id, nombre, ubicacion, capacidad
            "#,
        )
        .bind(input.nombre.trim())
        .bind(&input.ubicacion)
        .bind(input.capacidad)
        .fetch_one(&self.db)
        .await?;

        Ok(almacen)
    }

    pub async fn listar(&self) -> AppResult<Vec<Almacen>> {
        let almacenes = sqlx::query_as::<_, Almacen>(
            "SELECT id, nombre, ubicacion, capacidad FROM almacen ORDER BY nombre",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(almacenes)
    }

    pub async fn obtener(&self, id: i32) -> AppResult<Almacen> {
        let almacen = sqlx::query_as::<_, Almacen>(
            "SELECT id, nombre, ubicacion, capacidad FROM almacen WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Almacén {}", id)))?;

        Ok(almacen)
    }

    pub async fn actualizar(&self, id: i32, input: ActualizarAlmacenInput) -> AppResult<Almacen> {
        let almacen = sqlx::query_as::<_, Almacen>(
            r#"
            UPDATE almacen SET
                nombre = COALESCE($2, nombre),
                ubicacion = COALESCE($3, ubicacion),
                capacidad = COALESCE($4, capacidad)
            WHERE id = $1
            RETURNING id, nombre, ubicacion, capacidad
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.ubicacion)
        .bind(input.capacidad)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Almacén {}", id)))?;

        Ok(almacen)
    }

    pub async fn eliminar(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM almacen WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Almacén {}", id)));
        }

        Ok(())
    }
}
