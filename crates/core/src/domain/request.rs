use serde::{Deserialize, Serialize};

/// One of the four fields a parcel cannot be created without.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingField {
    FromCity,
    ToCity,
    Weight,
    Material,
}

impl MissingField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FromCity => "origin city",
            Self::ToCity => "destination city",
            Self::Weight => "weight",
            Self::Material => "material type",
        }
    }
}

/// Structured shipment request pulled out of a free-text message.
///
/// Every field is optional because extraction is best-effort; validation
/// happens downstream via [`ExtractedRequest::missing_fields`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRequest {
    pub company: Option<String>,
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub material: Option<String>,
    pub price: Option<i64>,
}

impl ExtractedRequest {
    /// Recomputed from the mandatory fields on every call. Extractors may
    /// carry their own missing-info flag on the wire; it is never trusted.
    pub fn has_missing_info(&self) -> bool {
        !self.missing_fields().is_empty()
    }

    /// Missing mandatory fields in reporting order: cities first, then
    /// weight, then material. Company and price are optional.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.from_city.is_none() {
            missing.push(MissingField::FromCity);
        }
        if self.to_city.is_none() {
            missing.push(MissingField::ToCity);
        }
        if self.weight.is_none() {
            missing.push(MissingField::Weight);
        }
        if self.material.is_none() {
            missing.push(MissingField::Material);
        }
        missing
    }

    pub fn company_or_default(&self) -> &str {
        self.company.as_deref().unwrap_or("Unknown")
    }

    /// Trims and lowercases the text fields and drops values that cannot
    /// describe a real shipment (negative or non-finite weight, negative
    /// price, blank strings).
    pub fn sanitize(mut self) -> Self {
        self.company = normalize_text(self.company);
        self.from_city = normalize_text(self.from_city);
        self.to_city = normalize_text(self.to_city);
        self.weight_unit = normalize_text(self.weight_unit);
        self.material = normalize_text(self.material);
        self.weight = self.weight.filter(|weight| weight.is_finite() && *weight > 0.0);
        self.price = self.price.filter(|price| *price >= 0);
        self
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_lowercase()).filter(|text| !text.is_empty())
}
