use std::sync::LazyLock;

use regex::Regex;

use parcelo_core::ExtractedRequest;

static COMPANY: LazyLock<Regex> = LazyLock::new(|| pattern(r"for\s+(\w+)"));

static ROUTES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        pattern(r"from\s+(\w+)\s+to\s+(\w+)"),
        pattern(r"route\s+is\s+(\w+)\s+to\s+(\w+)"),
        pattern(r"\b(\w+)\s+to\s+(\w+)"),
    ]
});

// Longest spellings first so `grams` is not cut down to `g`.
static WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(\d+(?:\.\d+)?)\s*(kilograms|kilogram|kilos|kilo|kgs|kg|grams|gram|g|tonnes|tonne|tons|ton|pounds|pound|lbs|lb)?\b",
    )
});

static MATERIALS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        pattern(r"material\s+like\s+(\w+)"),
        pattern(r"type\s+of\s+material\s+like\s+(\w+)"),
        pattern(r"material\s+(\w+)"),
        pattern(r"(\w+)\s+material"),
    ]
});

static PRICES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        pattern(r"cost\s+(?:rs\.?\s*|rupees\s+)?([\d,]+)"),
        pattern(r"price\s+(?:rs\.?\s*|rupees\s+)?([\d,]+)"),
        pattern(r"(?:rs\.?|rupees)\s*([\d,]+)"),
        pattern(r"([\d,]+)\s*(?:rs\b|rupees\b)"),
    ]
});

/// Common shipment materials recognized even without a "material" keyword
/// in the message, e.g. "200kg electronics".
const MATERIAL_LEXICON: [&str; 7] =
    ["electronics", "chemicals", "machinery", "furniture", "textiles", "paint", "food"];

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("hard-coded pattern compiles")
}

/// Deterministic regex extraction. Always succeeds, always idempotent, and
/// is the safety net whenever model-backed extraction is unavailable or
/// produces unusable output.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackExtractor;

impl FallbackExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, message: &str) -> ExtractedRequest {
        let text = message.to_lowercase();

        let company = COMPANY
            .captures(&text)
            .and_then(|captures| captures.get(1))
            .map(|capture| capture.as_str().to_string());

        let (from_city, to_city) = extract_route(&text);
        let (weight, weight_unit) = extract_weight(&text);
        let material = extract_material(&text);
        let price = extract_price(&text);

        ExtractedRequest {
            company,
            from_city,
            to_city,
            weight,
            weight_unit,
            material,
            price,
        }
        .sanitize()
    }
}

fn extract_route(text: &str) -> (Option<String>, Option<String>) {
    for route in ROUTES.iter() {
        if let Some(captures) = route.captures(text) {
            let from = captures.get(1).map(|capture| capture.as_str().to_string());
            let to = captures.get(2).map(|capture| capture.as_str().to_string());
            return (from, to);
        }
    }
    (None, None)
}

fn extract_weight(text: &str) -> (Option<f64>, Option<String>) {
    let Some(captures) = WEIGHT.captures(text) else {
        return (None, None);
    };

    let weight = captures.get(1).and_then(|capture| capture.as_str().parse::<f64>().ok());
    let unit = captures.get(2).map(|capture| capture.as_str().to_string());
    (weight, unit)
}

fn extract_material(text: &str) -> Option<String> {
    for material in MATERIALS.iter() {
        if let Some(captures) = material.captures(text) {
            if let Some(capture) = captures.get(1) {
                return Some(capture.as_str().to_string());
            }
        }
    }

    // Keyword patterns missed; look for a known material word anywhere.
    let tokens: Vec<&str> =
        text.split(|ch: char| !ch.is_alphanumeric()).filter(|token| !token.is_empty()).collect();
    MATERIAL_LEXICON
        .iter()
        .find(|material| tokens.contains(material))
        .map(|material| material.to_string())
}

fn extract_price(text: &str) -> Option<i64> {
    for price in PRICES.iter() {
        if let Some(captures) = price.captures(text) {
            if let Some(capture) = captures.get(1) {
                let digits = capture.as_str().replace(',', "");
                if let Ok(value) = digits.parse::<i64>() {
                    return Some(value);
                }
            }
        }
    }
    None
}
