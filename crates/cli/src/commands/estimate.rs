use parcelo_agent::FallbackExtractor;
use parcelo_core::{estimate_cost, to_kilograms};
use serde::Serialize;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct EstimateReport {
    weight_kg: f64,
    material: Option<String>,
    cost: i64,
    explicit_price: bool,
}

pub fn run(message: &str) -> CommandResult {
    let request = FallbackExtractor::new().parse(message);

    let Some(weight) = request.weight else {
        return CommandResult::failure(
            "estimate",
            "validation",
            "no weight found in the message",
            2,
        );
    };

    let weight_kg = to_kilograms(weight, request.weight_unit.as_deref());
    let cost = estimate_cost(&request, weight_kg);

    let report = EstimateReport {
        weight_kg,
        material: request.material.clone(),
        cost,
        explicit_price: request.price.is_some_and(|price| price > 0),
    };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("estimate", "serialization", error.to_string(), 1),
    }
}
