//! Stock ledger tests
//!
//! Tests for the adjustment rules including:
//! - No-negative-stock floor under any sequence of deltas
//! - Single authoritative field per product classification
//! - Exact deficit reporting for insufficient stock
//! - Insumo reversibility

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{aplicar_delta, Cantidad, ErrorAjuste, UnidadStock};

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

    /// Receiving then consuming pieces lands on the expected balance
    #[test]
    fn test_ajuste_de_piezas() {
        let stock = aplicar_delta(Cantidad::Piezas(0), Cantidad::Piezas(10)).unwrap();
        assert_eq!(stock, Cantidad::Piezas(10));

        let stock = aplicar_delta(stock, Cantidad::Piezas(-3)).unwrap();
        assert_eq!(stock, Cantidad::Piezas(7));
    }

    /// An adjustment that would go negative fails and reports the deficit
    #[test]
    fn test_piezas_insuficientes() {
        let err = aplicar_delta(Cantidad::Piezas(7), Cantidad::Piezas(-10)).unwrap_err();
        assert_eq!(
            err,
            ErrorAjuste::Insuficiente {
                unidad: UnidadStock::Piezas,
                deficit: dec("3"),
            }
        );
    }

    /// Gram adjustments carry three decimals
    #[test]
    fn test_ajuste_de_gramos() {
        let stock =
            aplicar_delta(Cantidad::Gramos(Decimal::ZERO), Cantidad::Gramos(dec("1500.000")))
                .unwrap();
        assert_eq!(stock, Cantidad::Gramos(dec("1500.000")));

        let stock = aplicar_delta(stock, Cantidad::Gramos(dec("-500.000"))).unwrap();
        assert_eq!(stock, Cantidad::Gramos(dec("1000.000")));
    }

    /// Gram deficit is exact
    #[test]
    fn test_gramos_insuficientes() {
        let err = aplicar_delta(
            Cantidad::Gramos(dec("100.500")),
            Cantidad::Gramos(dec("-200.750")),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ErrorAjuste::Insuficiente {
                unidad: UnidadStock::Gramos,
                deficit: dec("100.250"),
            }
        );
    }

    /// Mixing units is rejected outright
    #[test]
    fn test_unidades_incompatibles() {
        let err = aplicar_delta(Cantidad::Piezas(5), Cantidad::Gramos(dec("5"))).unwrap_err();
        assert_eq!(err, ErrorAjuste::UnidadIncompatible);

        let err = aplicar_delta(Cantidad::Gramos(dec("5")), Cantidad::Piezas(5)).unwrap_err();
        assert_eq!(err, ErrorAjuste::UnidadIncompatible);
    }

    /// Draining to exactly zero is allowed
    #[test]
    fn test_hasta_cero_exacto() {
        let stock = aplicar_delta(Cantidad::Piezas(5), Cantidad::Piezas(-5)).unwrap();
        assert_eq!(stock, Cantidad::Piezas(0));

        let stock =
            aplicar_delta(Cantidad::Gramos(dec("250.000")), Cantidad::Gramos(dec("-250")))
                .unwrap();
        assert_eq!(stock, Cantidad::Gramos(dec("0.000")));
    }

    /// A failed adjustment leaves nothing to apply: two concurrent -5 on a
    /// stock of 5 can never both pass the floor check
    #[test]
    fn test_solo_un_retiro_concurrente_gana() {
        let inicial = Cantidad::Piezas(5);

        // First withdrawal wins the row lock and commits
        let tras_primero = aplicar_delta(inicial, Cantidad::Piezas(-5)).unwrap();
        assert_eq!(tras_primero, Cantidad::Piezas(0));

        // The second observes the committed value and must fail
        let err = aplicar_delta(tras_primero, Cantidad::Piezas(-5)).unwrap_err();
        assert!(matches!(err, ErrorAjuste::Insuficiente { .. }));
    }

    /// Consuming as insumo then re-applying the inverse restores the
    /// original quantity exactly
    #[test]
    fn test_insumo_reversible() {
        let inicial = Cantidad::Gramos(dec("1500.000"));
        let consumo = Cantidad::Gramos(dec("500.000"));

        let tras_insumo = aplicar_delta(inicial, consumo.negada()).unwrap();
        assert_eq!(tras_insumo, Cantidad::Gramos(dec("1000.000")));

        let restaurado = aplicar_delta(tras_insumo, consumo).unwrap();
        assert_eq!(restaurado, inicial);
    }

    /// The transfer decomposition conserves the total across warehouses
    #[test]
    fn test_traspaso_conserva_total() {
        let origen = Cantidad::Piezas(8);
        let destino = Cantidad::Piezas(2);
        let movido = Cantidad::Piezas(3);

        let origen = aplicar_delta(origen, movido.negada()).unwrap();
        let destino = aplicar_delta(destino, movido).unwrap();

        assert_eq!(origen, Cantidad::Piezas(5));
        assert_eq!(destino, Cantidad::Piezas(5));
    }

    /// Grams round to the persisted scale
    #[test]
    fn test_gramos_redondeados_a_tres_decimales() {
        let stock = aplicar_delta(
            Cantidad::Gramos(dec("0.0005")),
            Cantidad::Gramos(dec("1.0004")),
        )
        .unwrap();
        assert_eq!(stock, Cantidad::Gramos(dec("1.001")));
    }

    /// The column pair always has exactly one live side
    #[test]
    fn test_como_partes() {
        assert_eq!(Cantidad::Piezas(7).como_partes(), (Some(7), None));
        assert_eq!(
            Cantidad::Gramos(dec("12.5")).como_partes(),
            (None, Some(dec("12.500")))
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for piece deltas
    fn delta_piezas_strategy() -> impl Strategy<Value = i32> {
        -1000i32..=1000i32
    }

    /// Strategy for gram quantities with three decimals
    fn gramos_strategy() -> impl Strategy<Value = Decimal> {
        (-1_000_000i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The resulting quantity is never negative, no matter the deltas
        #[test]
        fn prop_piso_en_cero_piezas(
            deltas in prop::collection::vec(delta_piezas_strategy(), 1..50)
        ) {
            let mut stock = Cantidad::Piezas(0);
            for d in deltas {
                if let Ok(nuevo) = aplicar_delta(stock, Cantidad::Piezas(d)) {
                    stock = nuevo;
                }
                // Failed adjustments leave the row unchanged
                prop_assert!(stock.magnitud() >= Decimal::ZERO);
            }
        }

        /// Same floor invariant for gram-tracked products
        #[test]
        fn prop_piso_en_cero_gramos(
            deltas in prop::collection::vec(gramos_strategy(), 1..50)
        ) {
            let mut stock = Cantidad::Gramos(Decimal::ZERO);
            for d in deltas {
                if let Ok(nuevo) = aplicar_delta(stock, Cantidad::Gramos(d)) {
                    stock = nuevo;
                }
                prop_assert!(stock.magnitud() >= Decimal::ZERO);
            }
        }

        /// N inflows of one piece followed by N outflows land on zero; this
        /// is the serialized interleaving the row lock guarantees
        #[test]
        fn prop_entradas_y_salidas_se_anulan(n in 1usize..100) {
            let mut stock = Cantidad::Piezas(0);
            for _ in 0..n {
                stock = aplicar_delta(stock, Cantidad::Piezas(1)).unwrap();
            }
            prop_assert_eq!(stock, Cantidad::Piezas(n as i32));
            for _ in 0..n {
                stock = aplicar_delta(stock, Cantidad::Piezas(-1)).unwrap();
            }
            prop_assert_eq!(stock, Cantidad::Piezas(0));
        }

        /// Applying a delta and then its inverse is the identity
        #[test]
        fn prop_ajuste_reversible(
            inicial in 0i32..=10_000,
            delta in delta_piezas_strategy()
        ) {
            let stock = Cantidad::Piezas(inicial);
            if let Ok(tras) = aplicar_delta(stock, Cantidad::Piezas(delta)) {
                let restaurado = aplicar_delta(tras, Cantidad::Piezas(-delta)).unwrap();
                prop_assert_eq!(restaurado, stock);
            }
        }

        /// A rejected withdrawal reports exactly the missing amount
        #[test]
        fn prop_deficit_exacto(
            disponible in 0i32..=1000,
            pedido in 1i32..=2000
        ) {
            let resultado = aplicar_delta(
                Cantidad::Piezas(disponible),
                Cantidad::Piezas(-pedido),
            );
            if pedido > disponible {
                let err = resultado.unwrap_err();
                prop_assert_eq!(err, ErrorAjuste::Insuficiente {
                    unidad: UnidadStock::Piezas,
                    deficit: Decimal::from(pedido - disponible),
                });
            } else {
                prop_assert_eq!(resultado.unwrap(), Cantidad::Piezas(disponible - pedido));
            }
        }

        /// The unit of the stored value never changes across adjustments
        #[test]
        fn prop_unidad_estable(
            inicial in 0i64..=1_000_000,
            delta in gramos_strategy()
        ) {
            let stock = Cantidad::Gramos(Decimal::new(inicial, 3));
            if let Ok(nuevo) = aplicar_delta(stock, Cantidad::Gramos(delta)) {
                prop_assert!(nuevo.es_por_gramos());
            }
        }
    }
}
