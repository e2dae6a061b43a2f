//! Movement log tests
//!
//! Tests for the kind-specific warehouse invariants, the exactly-one
//! quantity rule and price derivation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{
    campo_orden, precio_total_movimiento, validar_movimiento, Cantidad, TipoMovimiento,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// entrada: destination required, origin forbidden
    #[test]
    fn test_entrada_requiere_destino() {
        assert!(validar_movimiento(TipoMovimiento::Entrada, None, Some(1)).is_ok());
        assert!(validar_movimiento(TipoMovimiento::Entrada, None, None).is_err());
        assert!(validar_movimiento(TipoMovimiento::Entrada, Some(1), Some(2)).is_err());
    }

    /// salida and insumo: origin required, destination forbidden
    #[test]
    fn test_salida_e_insumo_requieren_origen() {
        for tipo in [TipoMovimiento::Salida, TipoMovimiento::Insumo] {
            assert!(validar_movimiento(tipo, Some(1), None).is_ok());
            assert!(validar_movimiento(tipo, None, None).is_err());
            assert!(validar_movimiento(tipo, Some(1), Some(2)).is_err());
        }
    }

    /// traspaso: both warehouses required and distinct
    #[test]
    fn test_traspaso_requiere_ambos_distintos() {
        assert!(validar_movimiento(TipoMovimiento::Traspaso, Some(1), Some(2)).is_ok());
        assert!(validar_movimiento(TipoMovimiento::Traspaso, Some(1), None).is_err());
        assert!(validar_movimiento(TipoMovimiento::Traspaso, None, Some(2)).is_err());

        let err = validar_movimiento(TipoMovimiento::Traspaso, Some(1), Some(1)).unwrap_err();
        assert_eq!(
            err,
            "En un TRASPASO, origen y destino deben ser distintos."
        );
    }

    /// Exactly one of {cantidad, cantidad_gramos} must be supplied
    #[test]
    fn test_exactamente_una_cantidad() {
        assert_eq!(
            Cantidad::from_partes(Some(5), None).unwrap(),
            Cantidad::Piezas(5)
        );
        assert_eq!(
            Cantidad::from_partes(None, Some(dec("500.000"))).unwrap(),
            Cantidad::Gramos(dec("500.000"))
        );
        assert!(Cantidad::from_partes(None, None).is_err());
        assert!(Cantidad::from_partes(Some(5), Some(dec("500.000"))).is_err());
    }

    /// Total price uses the single authoritative quantity as its base
    #[test]
    fn test_precio_total() {
        assert_eq!(
            precio_total_movimiento(&Cantidad::Piezas(3), dec("10.50")),
            dec("31.50")
        );
        assert_eq!(
            precio_total_movimiento(&Cantidad::Gramos(dec("250.000")), dec("0.05")),
            dec("12.50")
        );
    }

    /// Total price is rounded to the persisted scale
    #[test]
    fn test_precio_total_redondeado() {
        assert_eq!(
            precio_total_movimiento(&Cantidad::Gramos(dec("333.333")), dec("0.01")),
            dec("3.33")
        );
    }

    /// Sort field requests outside the whitelist fall back to the default
    #[test]
    fn test_campo_orden_whitelist() {
        let validos = ["fecha", "id", "tipo"];
        assert_eq!(campo_orden(Some("id"), &validos, "fecha"), "id");
        assert_eq!(campo_orden(Some("tipo"), &validos, "fecha"), "tipo");
        assert_eq!(campo_orden(Some("fecha; DROP TABLE"), &validos, "fecha"), "fecha");
        assert_eq!(campo_orden(None, &validos, "fecha"), "fecha");
    }

    /// Movement kinds round-trip through their wire names
    #[test]
    fn test_tipos_de_movimiento() {
        for tipo in [
            TipoMovimiento::Entrada,
            TipoMovimiento::Salida,
            TipoMovimiento::Traspaso,
            TipoMovimiento::Insumo,
        ] {
            assert_eq!(tipo.as_str().parse::<TipoMovimiento>().unwrap(), tipo);
        }
        assert!("ajuste".parse::<TipoMovimiento>().is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for optional warehouse ids
    fn almacen_strategy() -> impl Strategy<Value = Option<i32>> {
        prop_oneof![Just(None), (1i32..=20).prop_map(Some)]
    }

    fn tipo_strategy() -> impl Strategy<Value = TipoMovimiento> {
        prop_oneof![
            Just(TipoMovimiento::Entrada),
            Just(TipoMovimiento::Salida),
            Just(TipoMovimiento::Traspaso),
            Just(TipoMovimiento::Insumo),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A valid movement never has both sides equal for traspaso, never
        /// has the forbidden side present for the one-sided kinds
        #[test]
        fn prop_invariantes_por_tipo(
            tipo in tipo_strategy(),
            origen in almacen_strategy(),
            destino in almacen_strategy()
        ) {
            if validar_movimiento(tipo, origen, destino).is_ok() {
                match tipo {
                    TipoMovimiento::Entrada => {
                        prop_assert!(destino.is_some() && origen.is_none());
                    }
                    TipoMovimiento::Salida | TipoMovimiento::Insumo => {
                        prop_assert!(origen.is_some() && destino.is_none());
                    }
                    TipoMovimiento::Traspaso => {
                        prop_assert!(origen.is_some() && destino.is_some());
                        prop_assert_ne!(origen, destino);
                    }
                }
            }
        }

        /// from_partes accepts exactly the one-sided inputs
        #[test]
        fn prop_exactamente_una(
            piezas in prop_oneof![Just(None), (0i32..1000).prop_map(Some)],
            gramos in prop_oneof![Just(None), (0i64..1_000_000).prop_map(|n| Some(Decimal::new(n, 3)))]
        ) {
            let resultado = Cantidad::from_partes(piezas, gramos);
            match (piezas, gramos) {
                (Some(_), None) | (None, Some(_)) => prop_assert!(resultado.is_ok()),
                _ => prop_assert!(resultado.is_err()),
            }
        }

        /// Price totals scale linearly with the quantity
        #[test]
        fn prop_precio_total_lineal(
            cantidad in 1i32..=1000,
            precio in (1i64..=100_000).prop_map(|n| Decimal::new(n, 2))
        ) {
            let total = precio_total_movimiento(&Cantidad::Piezas(cantidad), precio);
            prop_assert_eq!(total, (Decimal::from(cantidad) * precio).round_dp(2));
        }
    }
}
