use serde::{Deserialize, Serialize};

const KILOGRAMS_PER_POUND: f64 = 0.453592;

/// Weight units the remote API accepts on parcel payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalUnit {
    Kilograms,
    Grams,
    Tonnes,
    Pounds,
}

impl CanonicalUnit {
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Kilograms => "KILOGRAMS",
            Self::Grams => "GRAMS",
            Self::Tonnes => "TONNES",
            Self::Pounds => "POUNDS",
        }
    }

    /// Maps the free-text unit spellings extraction produces. Unknown
    /// spellings map to nothing so the caller can apply its own default.
    pub fn from_text(unit: &str) -> Option<Self> {
        match unit.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilo" | "kilos" | "kilogram" | "kilograms" => Some(Self::Kilograms),
            "g" | "gram" | "grams" => Some(Self::Grams),
            "ton" | "tons" | "tonne" | "tonnes" => Some(Self::Tonnes),
            "lb" | "lbs" | "pound" | "pounds" => Some(Self::Pounds),
            _ => None,
        }
    }

    pub fn to_kilograms(self, value: f64) -> f64 {
        match self {
            Self::Kilograms => value,
            Self::Grams => value / 1000.0,
            Self::Tonnes => value * 1000.0,
            Self::Pounds => value * KILOGRAMS_PER_POUND,
        }
    }
}

/// Pairs a raw weight with its canonical unit, defaulting to kilograms when
/// the unit text is absent or unrecognized. The numeric value is passed
/// through untouched; conversion happens only in [`to_kilograms`].
pub fn to_api_unit(value: f64, unit: Option<&str>) -> (f64, CanonicalUnit) {
    let canonical = unit.and_then(CanonicalUnit::from_text).unwrap_or(CanonicalUnit::Kilograms);
    (value, canonical)
}

/// Converts a weight in any recognized unit to kilograms for pricing.
pub fn to_kilograms(value: f64, unit: Option<&str>) -> f64 {
    let (value, canonical) = to_api_unit(value, unit);
    canonical.to_kilograms(value)
}
