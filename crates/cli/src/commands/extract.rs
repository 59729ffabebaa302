use parcelo_agent::FallbackExtractor;
use parcelo_core::build_clarifying_question;
use serde::Serialize;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ExtractReport {
    company: Option<String>,
    from_city: Option<String>,
    to_city: Option<String>,
    weight: Option<f64>,
    weight_unit: Option<String>,
    material: Option<String>,
    price: Option<i64>,
    complete: bool,
    question: Option<String>,
}

/// Deterministic extraction only; the model path needs credentials and a
/// network, which this command deliberately avoids.
pub fn run(message: &str) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure("extract", "validation", "message must not be empty", 2);
    }

    let request = FallbackExtractor::new().parse(message);
    let question = build_clarifying_question(&request);

    let report = ExtractReport {
        complete: question.is_none(),
        company: request.company,
        from_city: request.from_city,
        to_city: request.to_city,
        weight: request.weight,
        weight_unit: request.weight_unit,
        material: request.material,
        price: request.price,
        question,
    };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("extract", "serialization", error.to_string(), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn complete_message_reports_every_field() {
        let result = run("parcel for ABC from jaipur to kolkata 200kg electronics");

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("\"from_city\": \"jaipur\""));
        assert!(result.output.contains("\"complete\": true"));
        assert!(result.output.contains("\"question\": null"));
    }

    #[test]
    fn vague_message_carries_the_clarifying_question() {
        let result = run("send something somewhere");

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("\"complete\": false"));
        assert!(result.output.contains("origin city"));
    }

    #[test]
    fn empty_message_is_a_validation_failure() {
        let result = run("   ");

        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("validation"));
    }
}
