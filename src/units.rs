use std::fmt;

/// Standard comparison units. Volumes normalize to euros per litre, weights
/// to euros per kilogram, countable packs to euros per piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalizedUnit {
    Litre,
    Kilogram,
    Piece,
}

impl NormalizedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizedUnit::Litre => "l",
            NormalizedUnit::Kilogram => "kg",
            NormalizedUnit::Piece => "pcs",
        }
    }
}

impl fmt::Display for NormalizedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pack price re-expressed in euros per standard unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitPrice {
    pub eur_per_unit: f64,
    pub unit: NormalizedUnit,
}

/// Convert a raw pack price into a comparable per-unit price.
///
/// Returns None when the size is not positive or the unit has no standard
/// conversion; callers then fall back to the raw pack price for display,
/// never as a cross-unit comparison key.
pub fn normalize(price_cents: i64, size: f64, unit: &str) -> Option<UnitPrice> {
    if !(size > 0.0) {
        return None;
    }

    let eur = price_cents as f64 / 100.0;

    let (eur_per_unit, unit) = match unit.trim().to_ascii_lowercase().as_str() {
        "l" => (eur / size, NormalizedUnit::Litre),
        "ml" => (eur / (size / 1000.0), NormalizedUnit::Litre),
        "kg" => (eur / size, NormalizedUnit::Kilogram),
        "g" => (eur / (size / 1000.0), NormalizedUnit::Kilogram),
        "pcs" | "kos" => (eur / size, NormalizedUnit::Piece),
        _ => return None,
    };

    Some(UnitPrice { eur_per_unit, unit })
}

/// Comparison key for one priced pack: the normalized unit price when the
/// unit is supported, otherwise the raw pack price tagged with the original
/// unit. `supported == false` marks the weaker comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonValue {
    pub value_eur: f64,
    pub unit_label: String,
    pub supported: bool,
}

pub fn comparison_value(price_cents: i64, size: f64, unit: &str) -> ComparisonValue {
    match normalize(price_cents, size, unit) {
        Some(unit_price) => ComparisonValue {
            value_eur: unit_price.eur_per_unit,
            unit_label: unit_price.unit.as_str().to_owned(),
            supported: true,
        },
        None => ComparisonValue {
            value_eur: price_cents as f64 / 100.0,
            unit_label: unit.trim().to_owned(),
            supported: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_litre_is_identity_unit() {
        let up = normalize(199, 1.0, "l").unwrap();
        assert_close(up.eur_per_unit, 1.99);
        assert_eq!(up.unit, NormalizedUnit::Litre);
    }

    #[test]
    fn test_millilitres_convert_to_litres() {
        let up = normalize(199, 500.0, "ml").unwrap();
        assert_close(up.eur_per_unit, 3.98);
        assert_eq!(up.unit, NormalizedUnit::Litre);
    }

    #[test]
    fn test_grams_convert_to_kilograms() {
        let up = normalize(100, 2.0, "kg").unwrap();
        assert_close(up.eur_per_unit, 0.50);
        assert_eq!(up.unit, NormalizedUnit::Kilogram);

        let up = normalize(250, 500.0, "g").unwrap();
        assert_close(up.eur_per_unit, 5.00);
        assert_eq!(up.unit, NormalizedUnit::Kilogram);
    }

    #[test]
    fn test_piece_units_including_slovene_spelling() {
        let up = normalize(600, 10.0, "pcs").unwrap();
        assert_close(up.eur_per_unit, 0.60);
        assert_eq!(up.unit, NormalizedUnit::Piece);

        let up = normalize(600, 10.0, "kos").unwrap();
        assert_eq!(up.unit, NormalizedUnit::Piece);
    }

    #[test]
    fn test_unit_matching_is_case_insensitive_and_trimmed() {
        assert!(normalize(199, 1.0, " L ").is_some());
        assert!(normalize(199, 500.0, "ML").is_some());
    }

    #[test]
    fn test_non_positive_size_is_none() {
        assert_eq!(normalize(100, 0.0, "l"), None);
        assert_eq!(normalize(100, -1.0, "l"), None);
    }

    #[test]
    fn test_unsupported_unit_is_none() {
        assert_eq!(normalize(100, 1.0, "box"), None);
    }

    #[test]
    fn test_comparison_value_falls_back_to_raw_price() {
        let cv = comparison_value(349, 1.0, "box");
        assert!(!cv.supported);
        assert_close(cv.value_eur, 3.49);
        assert_eq!(cv.unit_label, "box");
    }

    #[test]
    fn test_comparison_value_uses_normalized_price_when_supported() {
        let cv = comparison_value(109, 0.5, "l");
        assert!(cv.supported);
        assert_close(cv.value_eur, 2.18);
        assert_eq!(cv.unit_label, "l");
    }
}
