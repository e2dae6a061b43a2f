//! Product catalog tests
//!
//! Tests for the unit-of-measure classification predicate and SKU
//! generation.

use proptest::prelude::*;

use shared::{es_unidad_por_gramos, sku_prefijo, validar_clasificacion, Cantidad};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use rust_decimal::Decimal;

    /// Gram units match by abbreviation
    #[test]
    fn test_clasificacion_por_abreviatura() {
        assert!(es_unidad_por_gramos("cualquiera", Some("g")));
        assert!(es_unidad_por_gramos("cualquiera", Some("G")));
        assert!(es_unidad_por_gramos("cualquiera", Some("gr")));
        assert!(es_unidad_por_gramos("cualquiera", Some(" GR ")));
    }

    /// Gram units match by name when the abbreviation is absent or other
    #[test]
    fn test_clasificacion_por_nombre() {
        assert!(es_unidad_por_gramos("gramo", None));
        assert!(es_unidad_por_gramos("Gramos", None));
        assert!(es_unidad_por_gramos("GRAMO", Some("xx")));
        assert!(es_unidad_por_gramos("grams", None));
    }

    /// Everything else is piece-counted
    #[test]
    fn test_unidades_por_piezas() {
        assert!(!es_unidad_por_gramos("Pieza", Some("pz")));
        assert!(!es_unidad_por_gramos("Litro", Some("l")));
        assert!(!es_unidad_por_gramos("Caja", None));
        // "kg" is not "g"/"gr" and "Kilogramo" does not start with "gram"
        assert!(!es_unidad_por_gramos("Kilogramo", Some("kg")));
    }

    /// A by-weight product rejects piece quantities and vice versa
    #[test]
    fn test_clasificacion_contra_cantidad() {
        assert!(validar_clasificacion("Harina", true, &Cantidad::Gramos(Decimal::ONE)).is_ok());
        assert!(validar_clasificacion("Harina", true, &Cantidad::Piezas(1)).is_err());

        assert!(validar_clasificacion("Gaseosa", false, &Cantidad::Piezas(1)).is_ok());
        let err = validar_clasificacion("Gaseosa", false, &Cantidad::Gramos(Decimal::ONE))
            .unwrap_err();
        assert!(err.contains("se maneja por piezas"));
    }

    /// SKU prefixes are uppercase alphanumeric, at most five characters
    #[test]
    fn test_sku_prefijo() {
        assert_eq!(sku_prefijo("yerba"), "YERBA");
        assert_eq!(sku_prefijo("Pan de campo"), "PANDE");
        assert_eq!(sku_prefijo("té"), "T");
        assert_eq!(sku_prefijo("  x  "), "X");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The predicate never panics and is stable under case changes
        #[test]
        fn prop_clasificacion_ignora_mayusculas(
            nombre in "[a-zA-Z ]{0,20}",
            abrev in prop_oneof![Just(None), "[a-zA-Z]{0,5}".prop_map(Some)]
        ) {
            let directo = es_unidad_por_gramos(&nombre, abrev.as_deref());
            let mayusculas = es_unidad_por_gramos(
                &nombre.to_uppercase(),
                abrev.as_deref().map(|a| a.to_uppercase()).as_deref(),
            );
            prop_assert_eq!(directo, mayusculas);
        }

        /// Prefixes never exceed five characters and are always uppercase
        #[test]
        fn prop_sku_prefijo_acotado(nombre in ".{0,40}") {
            let prefijo = sku_prefijo(&nombre);
            prop_assert!(prefijo.len() <= 5);
            prop_assert!(prefijo.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}
