//! Supplier management service

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

/// Supplier service
#[derive(Clone)]
pub struct ProveedorService {
    db: PgPool,
}

/// Supplier row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Proveedor {
    pub id: i32,
    pub nombre: String,
    pub contacto: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize)]
pub struct CrearProveedorInput {
    pub nombre: String,
    pub contacto: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

/// Input for updating a supplier
#[derive(Debug, Deserialize)]
pub struct ActualizarProveedorInput {
    pub nombre: Option<String>,
    pub contacto: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

impl ProveedorService {
    /// Create a new ProveedorService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn crear(&self, input: CrearProveedorInput) -> AppResult<Proveedor> {
        if input.nombre.trim().is_empty() {
            return Err(AppError::validation("nombre", "El nombre es obligatorio"));
        }

        let proveedor = sqlx::query_as::<_, Proveedor>(
            r#"
            INSERT INTO proveedor (nombre, contacto, telefono, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, nombre, contacto, telefono, email
            "#,
        )
        .bind(input.nombre.trim())
        .bind(&input.contacto)
        .bind(&input.telefono)
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        Ok(proveedor)
    }

    pub async fn listar(&self) -> AppResult<Vec<Proveedor>> {
        let proveedores = sqlx::query_as::<_, Proveedor>(
            "SELECT id, nombre, contacto, telefono, email FROM proveedor ORDER BY nombre",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(proveedores)
    }

    pub async fn obtener(&self, id: i32) -> AppResult<Proveedor> {
        let proveedor = sqlx::query_as::<_, Proveedor>(
            "SELECT id, nombre, contacto, telefono, email FROM proveedor WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Proveedor {}", id)))?;

        Ok(proveedor)
    }

    pub async fn actualizar(
        &self,
        id: i32,
        input: ActualizarProveedorInput,
    ) -> AppResult<Proveedor> {
        let proveedor = sqlx::query_as::<_, Proveedor>(
            r#"
            UPDATE proveedor SET
                nombre = COALESCE($2, nombre),
                contacto = COALESCE($3, contacto),
                telefono = COALESCE($4, telefono),
                email = COALESCE($5, email)
            WHERE id = $1
            RETURNING id, nombre, contacto, telefono, email
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.contacto)
        .bind(&input.telefono)
        .bind(&input.email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Proveedor {}", id)))?;

        Ok(proveedor)
    }

    pub async fn eliminar(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM proveedor WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Proveedor {}", id)));
        }

        Ok(())
    }
}
