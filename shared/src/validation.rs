//! Validation rules for the stock ledger and the movement log
//!
//! Everything here is pure so the invariants can be tested without a
//! database. The backend services call these functions and translate the
//! errors into HTTP responses.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Cantidad, TipoMovimiento, UnidadStock};

// ============================================================================
// Unit classification
// ============================================================================

/// Decides whether a unit of measure tracks weight in grams.
///
/// This is the single source of truth for the classification everywhere in
/// the system; callers must never trust a client-supplied flag instead.
pub fn es_unidad_por_gramos(nombre: &str, abreviatura: Option<&str>) -> bool {
    if let Some(abrev) = abreviatura {
        let abrev = abrev.trim().to_lowercase();
        if abrev == "g" || abrev == "gr" {
            return true;
        }
    }
    let nombre = nombre.trim().to_lowercase();
    nombre == "gramo" || nombre.starts_with("gram")
}

// ============================================================================
// Stock adjustment
// ============================================================================

/// Failure applying a delta to an on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorAjuste {
    /// The adjustment would drive the authoritative quantity below zero.
    #[error("stock insuficiente ({unidad}): faltan {deficit}")]
    Insuficiente { unidad: UnidadStock, deficit: Decimal },

    /// Current value and delta are not expressed in the same unit.
    #[error("el ajuste no coincide con la unidad del stock")]
    UnidadIncompatible,
}

/// Applies a signed delta to the current on-hand quantity.
///
/// The hard floor at zero lives here: any result below zero is rejected with
/// the exact deficit, and the caller must abort its whole transaction.
pub fn aplicar_delta(actual: Cantidad, delta: Cantidad) -> Result<Cantidad, ErrorAjuste> {
    match (actual, delta) {
        (Cantidad::Piezas(actual), Cantidad::Piezas(delta)) => {
            let nuevo = actual + delta;
            if nuevo < 0 {
                return Err(ErrorAjuste::Insuficiente {
                    unidad: UnidadStock::Piezas,
                    deficit: Decimal::from(-nuevo),
                });
            }
            Ok(Cantidad::Piezas(nuevo))
        }
        (Cantidad::Gramos(actual), Cantidad::Gramos(delta)) => {
            let nuevo = (actual + delta).round_dp(3);
            if nuevo < Decimal::ZERO {
                return Err(ErrorAjuste::Insuficiente {
                    unidad: UnidadStock::Gramos,
                    deficit: -nuevo,
                });
            }
            Ok(Cantidad::Gramos(nuevo))
        }
        _ => Err(ErrorAjuste::UnidadIncompatible),
    }
}

/// Checks a quantity against the product's classification.
///
/// A by-weight product only accepts gram quantities and vice versa; the
/// message tells the operator which field to send.
pub fn validar_clasificacion(
    nombre_producto: &str,
    es_por_gramos: bool,
    cantidad: &Cantidad,
) -> Result<(), String> {
    if es_por_gramos && !cantidad.es_por_gramos() {
        return Err(format!(
            "El producto {nombre_producto} se maneja por gramos: enviar 'cantidad_gramos' (y NO 'cantidad')."
        ));
    }
    if !es_por_gramos && cantidad.es_por_gramos() {
        return Err(format!(
            "El producto {nombre_producto} se maneja por piezas: enviar 'cantidad' (y NO 'cantidad_gramos')."
        ));
    }
    Ok(())
}

// ============================================================================
// Movement log
// ============================================================================

/// Validates the warehouse-presence rules for a movement kind.
///
/// entrada: destination only; salida/insumo: origin only; traspaso: both,
/// and they must differ.
pub fn validar_movimiento(
    tipo: TipoMovimiento,
    origen_almacen: Option<i32>,
    destino_almacen: Option<i32>,
) -> Result<(), &'static str> {
    match tipo {
        TipoMovimiento::Entrada => {
            if destino_almacen.is_none() {
                return Err("Para una ENTRADA debe indicarse destino_almacen.");
            }
            if origen_almacen.is_some() {
                return Err("Una ENTRADA no debe llevar origen_almacen.");
            }
        }
        TipoMovimiento::Salida | TipoMovimiento::Insumo => {
            if origen_almacen.is_none() {
                return Err("Para una SALIDA o INSUMO debe indicarse origen_almacen.");
            }
            if destino_almacen.is_some() {
                return Err("Una SALIDA o INSUMO no debe llevar destino_almacen.");
            }
        }
        TipoMovimiento::Traspaso => {
            let (origen, destino) = match (origen_almacen, destino_almacen) {
                (Some(o), Some(d)) => (o, d),
                _ => return Err("Para un TRASPASO se requieren origen_almacen y destino_almacen."),
            };
            if origen == destino {
                return Err("En un TRASPASO, origen y destino deben ser distintos.");
            }
        }
    }
    Ok(())
}

/// Total price of a movement when the caller did not supply one.
///
/// Uses the single authoritative quantity as the price base (price per piece
/// or price per gram, matching the product's classification).
pub fn precio_total_movimiento(cantidad: &Cantidad, precio_unitario: Decimal) -> Decimal {
    (cantidad.magnitud() * precio_unitario).round_dp(2)
}

// ============================================================================
// Misc helpers shared by the listing and catalog services
// ============================================================================

/// SKU prefix derived from a product name: up to five uppercase
/// alphanumeric characters.
pub fn sku_prefijo(nombre: &str) -> String {
    nombre
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(5)
        .collect()
}

/// Returns the requested sort field if whitelisted, the default otherwise.
///
/// Sort fields end up interpolated into ORDER BY, so anything outside the
/// whitelist is replaced rather than rejected.
pub fn campo_orden<'a>(
    solicitado: Option<&str>,
    validos: &[&'a str],
    defecto: &'a str,
) -> &'a str {
    match solicitado {
        Some(campo) => validos
            .iter()
            .find(|v| **v == campo)
            .copied()
            .unwrap_or(defecto),
        None => defecto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clasifica_abreviaturas_de_gramos() {
        assert!(es_unidad_por_gramos("Gramo", Some("g")));
        assert!(es_unidad_por_gramos("Gramos", Some("GR")));
        assert!(es_unidad_por_gramos("gramo", None));
        assert!(!es_unidad_por_gramos("Pieza", Some("pz")));
        assert!(!es_unidad_por_gramos("Kilogramo", Some("kg")));
    }

    #[test]
    fn traspaso_requiere_almacenes_distintos() {
        let err = validar_movimiento(TipoMovimiento::Traspaso, Some(1), Some(1)).unwrap_err();
        assert!(err.contains("origen y destino deben ser distintos"));
    }

    #[test]
    fn sku_prefijo_recorta_y_limpia() {
        assert_eq!(sku_prefijo("Café molido"), "CAFMO");
        assert_eq!(sku_prefijo("  yerba mate  "), "YERBA");
    }
}
