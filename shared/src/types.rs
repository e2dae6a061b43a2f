//! Quantity model and common transport types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quantity of a product, expressed in the unit the product is tracked in.
///
/// Discrete products count whole pieces, by-weight products count grams.
/// Modelling this as a sum type makes the "exactly one of {cantidad,
/// cantidad_gramos}" rule unrepresentable to violate once a value has been
/// built; transport DTOs with two optional fields are converted through
/// [`Cantidad::from_partes`], which enforces it at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cantidad {
    Piezas(i32),
    Gramos(Decimal),
}

impl Cantidad {
    /// Builds a quantity from the two optional transport fields.
    ///
    /// Exactly one of the fields must be present; anything else is the
    /// caller sending an ambiguous or empty quantity.
    pub fn from_partes(
        piezas: Option<i32>,
        gramos: Option<Decimal>,
    ) -> Result<Cantidad, &'static str> {
        match (piezas, gramos) {
            (Some(p), None) => Ok(Cantidad::Piezas(p)),
            (None, Some(g)) => Ok(Cantidad::Gramos(g)),
            _ => Err("Debe enviar exactamente uno: 'cantidad' (piezas) o 'cantidad_gramos' (gramos)."),
        }
    }

    /// True when this quantity is expressed in grams.
    pub fn es_por_gramos(&self) -> bool {
        matches!(self, Cantidad::Gramos(_))
    }

    /// The quantity with its sign flipped, used to undo an adjustment.
    pub fn negada(&self) -> Cantidad {
        match *self {
            Cantidad::Piezas(p) => Cantidad::Piezas(-p),
            Cantidad::Gramos(g) => Cantidad::Gramos(-g),
        }
    }

    /// Numeric magnitude regardless of unit, for price arithmetic.
    pub fn magnitud(&self) -> Decimal {
        match *self {
            Cantidad::Piezas(p) => Decimal::from(p),
            Cantidad::Gramos(g) => g,
        }
    }

    /// Grams rounded to the persisted NUMERIC(18,3) scale; pieces unchanged.
    pub fn normalizada(&self) -> Cantidad {
        match *self {
            Cantidad::Piezas(p) => Cantidad::Piezas(p),
            Cantidad::Gramos(g) => Cantidad::Gramos(g.round_dp(3)),
        }
    }

    /// Splits back into the `(cantidad, cantidad_gramos)` column pair.
    pub fn como_partes(&self) -> (Option<i32>, Option<Decimal>) {
        match self.normalizada() {
            Cantidad::Piezas(p) => (Some(p), None),
            Cantidad::Gramos(g) => (None, Some(g)),
        }
    }

    /// Unit label for error reporting.
    pub fn unidad(&self) -> UnidadStock {
        match self {
            Cantidad::Piezas(_) => UnidadStock::Piezas,
            Cantidad::Gramos(_) => UnidadStock::Gramos,
        }
    }
}

/// Which stock field a quantity (or a deficit) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnidadStock {
    Piezas,
    Gramos,
}

impl UnidadStock {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnidadStock::Piezas => "piezas",
            UnidadStock::Gramos => "gramos",
        }
    }
}

impl std::fmt::Display for UnidadStock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock movement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoMovimiento {
    Entrada,
    Salida,
    Traspaso,
    Insumo,
}

impl TipoMovimiento {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoMovimiento::Entrada => "entrada",
            TipoMovimiento::Salida => "salida",
            TipoMovimiento::Traspaso => "traspaso",
            TipoMovimiento::Insumo => "insumo",
        }
    }
}

impl std::str::FromStr for TipoMovimiento {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entrada" => Ok(TipoMovimiento::Entrada),
            "salida" => Ok(TipoMovimiento::Salida),
            "traspaso" => Ok(TipoMovimiento::Traspaso),
            "insumo" => Ok(TipoMovimiento::Insumo),
            _ => Err("tipo de movimiento desconocido"),
        }
    }
}

impl std::fmt::Display for TipoMovimiento {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pagination parameters as they arrive on the query string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Paginacion {
    pub page: u32,
    pub limit: u32,
}

impl Default for Paginacion {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl Paginacion {
    /// Clamped values safe to feed into LIMIT/OFFSET.
    pub fn normalizada(&self) -> Paginacion {
        Paginacion {
            page: self.page.max(1),
            limit: self.limit.clamp(1, 200),
        }
    }

    pub fn offset(&self) -> i64 {
        let p = self.normalizada();
        i64::from(p.page - 1) * i64::from(p.limit)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Pagina<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// Sort direction for filtered listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DireccionOrden {
    Asc,
    Desc,
}

impl DireccionOrden {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DireccionOrden::Asc => "ASC",
            DireccionOrden::Desc => "DESC",
        }
    }
}
