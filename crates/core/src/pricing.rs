use crate::domain::request::ExtractedRequest;

pub const RATE_PER_KILOGRAM: f64 = 150.0;
pub const MINIMUM_COST: i64 = 500;

const MATERIAL_MULTIPLIERS: [(&str, f64); 4] = [
    ("electronics", 1.5),
    ("chemicals", 2.0),
    ("machinery", 1.8),
    ("furniture", 1.2),
];

pub fn material_multiplier(material: Option<&str>) -> f64 {
    let Some(material) = material else {
        return 1.0;
    };
    let normalized = material.trim().to_lowercase();
    MATERIAL_MULTIPLIERS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

/// Deterministic shipment cost in integer currency units.
///
/// An explicit positive price stated by the customer wins verbatim.
/// Otherwise the estimate is weight in kilograms times the flat rate,
/// scaled by the material multiplier, floored, and clamped to the minimum.
pub fn estimate_cost(request: &ExtractedRequest, weight_kg: f64) -> i64 {
    if let Some(price) = request.price {
        if price > 0 {
            return price;
        }
    }

    let base = weight_kg * RATE_PER_KILOGRAM;
    let estimated = (base * material_multiplier(request.material.as_deref())).floor() as i64;
    estimated.max(MINIMUM_COST)
}
