use serde::Serialize;
use serde_json::Value;

/// Resolved city identifiers for one shipment route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteIds {
    pub from_city_id: String,
    pub to_city_id: String,
}

/// Trip creation payload. Vehicle requirements are always null; the backend
/// assigns equipment later. Handler and creator identifiers are static
/// per-deployment configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TripDraft {
    pub source: String,
    pub destination: String,
    pub vehicle_type: Option<String>,
    pub vehicle_body_type: Option<String>,
    pub vehicle_capacity: Option<i64>,
    pub handled_by: String,
    pub created_by: String,
    pub created_by_company: String,
}

impl TripDraft {
    pub fn new(
        route: &RouteIds,
        created_by: impl Into<String>,
        created_by_company: impl Into<String>,
    ) -> Self {
        let created_by = created_by.into();
        Self {
            source: route.from_city_id.clone(),
            destination: route.to_city_id.clone(),
            vehicle_type: None,
            vehicle_body_type: None,
            vehicle_capacity: None,
            handled_by: created_by.clone(),
            created_by,
            created_by_company: created_by_company.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PostalAddress {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub pin: Option<String>,
    pub city: Option<String>,
    pub no_entry_zone: Option<String>,
}

impl PostalAddress {
    pub fn for_city(city_id: &str) -> Self {
        Self { city: Some(city_id.to_string()), ..Self::default() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub sender_person: Option<String>,
    pub sender_company: Option<String>,
    pub name: Option<String>,
    pub gstin: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Receiver {
    pub receiver_person: Option<String>,
    pub receiver_company: Option<String>,
    pub name: Option<String>,
    pub gstin: Option<String>,
}

/// Final parcel submission payload (see the orchestrator for assembly).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParcelDraft {
    pub material_type: String,
    pub quantity: f64,
    pub quantity_unit: String,
    pub description: String,
    pub cost: i64,
    pub part_load: bool,
    pub pickup_postal_address: PostalAddress,
    pub unload_postal_address: PostalAddress,
    pub sender: Sender,
    pub receiver: Receiver,
    pub created_by: String,
    pub trip_id: String,
    pub verification: String,
    pub created_by_company: String,
}

/// What the submission endpoint acknowledged. The backend is loose about
/// its response shape, so both fields are extracted defensively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParcelReceipt {
    pub id: Option<String>,
    pub cost: Option<i64>,
}

impl ParcelReceipt {
    pub fn from_value(value: &Value) -> Self {
        let id = ["_id", "id"]
            .iter()
            .find_map(|key| value.get(key))
            .and_then(scalar_to_string);
        let cost = value.get("cost").and_then(Value::as_i64);
        Self { id, cost }
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ParcelReceipt, PostalAddress, RouteIds, TripDraft};

    #[test]
    fn trip_draft_nulls_vehicle_requirements() {
        let route = RouteIds {
            from_city_id: "city-1".to_string(),
            to_city_id: "city-2".to_string(),
        };
        let draft = TripDraft::new(&route, "user-1", "company-1");
        let wire = serde_json::to_value(&draft).expect("serializable");

        assert_eq!(wire["source"], "city-1");
        assert_eq!(wire["destination"], "city-2");
        assert!(wire["vehicle_type"].is_null());
        assert!(wire["vehicle_body_type"].is_null());
        assert!(wire["vehicle_capacity"].is_null());
        assert_eq!(wire["handled_by"], "user-1");
        assert_eq!(wire["created_by_company"], "company-1");
    }

    #[test]
    fn postal_address_carries_only_the_city_id() {
        let wire = serde_json::to_value(PostalAddress::for_city("city-9")).expect("serializable");
        assert_eq!(wire["city"], "city-9");
        assert!(wire["pin"].is_null());
    }

    #[test]
    fn receipt_extracts_underscore_id_then_plain_id() {
        let underscored = ParcelReceipt::from_value(&json!({"_id": "p-1", "cost": 500}));
        assert_eq!(underscored.id.as_deref(), Some("p-1"));
        assert_eq!(underscored.cost, Some(500));

        let plain = ParcelReceipt::from_value(&json!({"id": 42}));
        assert_eq!(plain.id.as_deref(), Some("42"));
        assert_eq!(plain.cost, None);

        let empty = ParcelReceipt::from_value(&json!({"ok": true}));
        assert_eq!(empty.id, None);
    }
}
