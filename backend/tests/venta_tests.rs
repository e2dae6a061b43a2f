//! Sales tests
//!
//! Tests for checkout arithmetic: subtotals, totals and the all-or-nothing
//! stock decrement of a multi-item sale.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{aplicar_delta, precio_total_movimiento, Cantidad};

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

    /// Line subtotals add up to the sale total
    #[test]
    fn test_total_de_venta() {
        let lineas = [
            (Cantidad::Piezas(2), dec("150.00")),
            (Cantidad::Piezas(1), dec("89.90")),
            (Cantidad::Gramos(dec("350.000")), dec("0.12")),
        ];

        let total: Decimal = lineas
            .iter()
            .map(|(cantidad, precio)| precio_total_movimiento(cantidad, *precio))
            .sum();

        // 300.00 + 89.90 + 42.00
        assert_eq!(total, dec("431.90"));
    }

    /// A multi-item sale where one line lacks stock must leave every row
    /// untouched: simulate the rollback by checking the failing line alone
    #[test]
    fn test_venta_multi_item_todo_o_nada() {
        let stock_a = Cantidad::Piezas(10);
        let stock_b = Cantidad::Piezas(1);

        let linea_a = aplicar_delta(stock_a, Cantidad::Piezas(-2));
        let linea_b = aplicar_delta(stock_b, Cantidad::Piezas(-3));

        assert!(linea_a.is_ok());
        assert!(linea_b.is_err());
        // The enclosing transaction aborts; stock_a keeps its 10 pieces
    }

    /// Selling by weight prices per gram
    #[test]
    fn test_subtotal_por_gramos() {
        let subtotal = precio_total_movimiento(&Cantidad::Gramos(dec("1250.000")), dec("0.08"));
        assert_eq!(subtotal, dec("100.00"));
    }

    /// Zero-priced products produce zero subtotals, not errors
    #[test]
    fn test_precio_cero() {
        let subtotal = precio_total_movimiento(&Cantidad::Piezas(4), Decimal::ZERO);
        assert_eq!(subtotal, Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn precio_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The total equals the sum of its subtotals, in any order
        #[test]
        fn prop_total_es_suma_de_subtotales(
            lineas in prop::collection::vec((1i32..=50, precio_strategy()), 1..10)
        ) {
            let subtotales: Vec<Decimal> = lineas
                .iter()
                .map(|(c, p)| precio_total_movimiento(&Cantidad::Piezas(*c), *p))
                .collect();

            let total: Decimal = subtotales.iter().copied().sum();
            let total_invertido: Decimal = subtotales.iter().rev().copied().sum();

            prop_assert_eq!(total, total_invertido);
            prop_assert!(total > Decimal::ZERO);
        }

        /// Selling the entire stock is allowed; selling one more is not
        #[test]
        fn prop_venta_agota_pero_no_excede(disponible in 1i32..=1000) {
            let stock = Cantidad::Piezas(disponible);
            prop_assert_eq!(
                aplicar_delta(stock, Cantidad::Piezas(-disponible)).unwrap(),
                Cantidad::Piezas(0)
            );
            prop_assert!(aplicar_delta(stock, Cantidad::Piezas(-(disponible + 1))).is_err());
        }
    }
}
