//! Authentication service for user registration, login and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new user
#[derive(Debug, Deserialize, Validate)]
pub struct RegistrarUsuarioInput {
    pub nombre: String,
    pub usuario: String,
    pub clave: String,
    #[validate(email)]
    pub email: String,
    pub rol: Option<String>,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub usuario: String,
    pub clave: String,
}

/// Input for refreshing tokens
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub usuario: String,
    pub rol: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Response after successful registration or login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: i32,
    pub usuario: String,
    pub rol: String,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
pub struct UsuarioRow {
    pub id: i32,
    pub nombre: String,
    pub usuario: String,
    pub clave_hash: String,
    pub email: String,
    pub rol: String,
    pub activo: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new user account
    pub async fn registrar(&self, input: RegistrarUsuarioInput) -> AppResult<AuthResponse> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let usuario = input.usuario.trim().to_lowercase();
        if usuario.len() < 3 {
            return Err(AppError::validation(
                "usuario",
                "El nombre de usuario debe tener al menos 3 caracteres",
            ));
        }
        if input.clave.len() < 8 {
            return Err(AppError::validation(
                "clave",
                "La contraseña debe tener al menos 8 caracteres",
            ));
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM usuarios WHERE usuario = $1",
        )
        .bind(&usuario)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "usuario".to_string(),
                message: "Username already taken".to_string(),
                message_es: "El nombre de usuario ya está en uso".to_string(),
            });
        }

        // Hash password
        let clave_hash = hash(&input.clave, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let rol = input.rol.unwrap_or_else(|| "vendedor".to_string());

        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            INSERT INTO usuarios (nombre, usuario, clave_hash, email, rol)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nombre, usuario, clave_hash, email, rol, activo
            "#,
        )
        .bind(input.nombre.trim())
        .bind(&usuario)
        .bind(&clave_hash)
        .bind(input.email.trim())
        .bind(&rol)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(usuario = %row.usuario, "Usuario registrado");

        let tokens = self.generar_tokens(&row)?;
        Ok(AuthResponse {
            user_id: row.id,
            usuario: row.usuario,
            rol: row.rol,
            tokens,
        })
    }

    /// Verify credentials and issue tokens
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        let usuario = input.usuario.trim().to_lowercase();

        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            SELECT id, nombre, usuario, clave_hash, email, rol, activo
            FROM usuarios
            WHERE usuario = $1
            "#,
        )
        .bind(&usuario)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !row.activo {
            return Err(AppError::InvalidCredentials);
        }

        let valid = verify(&input.clave, &row.clave_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.generar_tokens(&row)?;
        Ok(AuthResponse {
            user_id: row.id,
            usuario: row.usuario,
            rol: row.rol,
            tokens,
        })
    }

    /// Exchange a valid refresh token for a fresh token pair
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthResponse> {
        let claims = decode::<Claims>(
            &input.refresh_token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?
        .claims;

        let user_id: i32 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;

        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            SELECT id, nombre, usuario, clave_hash, email, rol, activo
            FROM usuarios
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidToken)?;

        if !row.activo {
            return Err(AppError::InvalidToken);
        }

        let tokens = self.generar_tokens(&row)?;
        Ok(AuthResponse {
            user_id: row.id,
            usuario: row.usuario,
            rol: row.rol,
            tokens,
        })
    }

    /// Build the access/refresh token pair for a user
    fn generar_tokens(&self, user: &UsuarioRow) -> AppResult<AuthTokens> {
        let now = Utc::now();

        let access_claims = Claims {
            sub: user.id.to_string(),
            usuario: user.usuario.clone(),
            rol: user.rol.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
        };
        let refresh_claims = Claims {
            sub: user.id.to_string(),
            usuario: user.usuario.clone(),
            rol: user.rol.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.refresh_token_expiry)).timestamp(),
        };

        let key = EncodingKey::from_secret(self.jwt_secret.as_bytes());
        let access_token = encode(&Header::default(), &access_claims, &key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}
