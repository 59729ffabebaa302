use crate::domain::request::{ExtractedRequest, MissingField};

/// Builds the follow-up question for a request with missing mandatory
/// fields, or `None` when the request is complete. The second paragraph
/// shows examples only for the categories that are actually missing.
pub fn build_clarifying_question(request: &ExtractedRequest) -> Option<String> {
    let missing = request.missing_fields();
    if missing.is_empty() {
        return None;
    }

    let labels: Vec<&str> = missing.iter().map(MissingField::label).collect();
    let mut question = format!("I need to know the {} to create your parcel.", join_labels(&labels));
    question.push_str("\n\n");
    question.push_str(&examples_paragraph(&missing));
    Some(question)
}

fn join_labels(labels: &[&str]) -> String {
    match labels {
        [single] => (*single).to_string(),
        [first, second] => format!("{first} and {second}"),
        _ => match labels.split_last() {
            Some((last, rest)) => format!("{}, and {last}", rest.join(", ")),
            None => String::new(),
        },
    }
}

fn examples_paragraph(missing: &[MissingField]) -> String {
    let mut lines = Vec::new();

    let city_missing = missing
        .iter()
        .any(|field| matches!(field, MissingField::FromCity | MissingField::ToCity));
    if city_missing {
        lines.push("Cities look like: jaipur, kolkata, mumbai, delhi.");
    }
    if missing.contains(&MissingField::Weight) {
        lines.push("Weights look like: 200kg, 2.5 tonnes, 500 pounds.");
    }
    if missing.contains(&MissingField::Material) {
        lines.push("Materials look like: electronics, chemicals, machinery, furniture.");
    }

    format!("For example: {}", lines.join(" "))
}
