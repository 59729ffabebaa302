use serde::{Deserialize, Serialize};

/// Backend identifiers for a validated request. All fields are non-empty by
/// construction: city resolution fails the pipeline instead of producing a
/// partial record, and material/company fall back to configured defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentifiers {
    pub from_city_id: String,
    pub to_city_id: String,
    pub material_id: String,
    pub company_id: String,
}
