/// Prompt for model-backed extraction. The model must answer with a single
/// JSON object and nothing else; anything around the first `{...}` span is
/// discarded by the parser.
pub fn build_extraction_prompt(message: &str) -> String {
    format!(
        r#"Extract shipment details from the message below.

Respond with exactly one JSON object, no prose and no code fences, using this schema:
{{
  "company": string or null,
  "from_city": string or null,
  "to_city": string or null,
  "weight": number or null,
  "weight_unit": string or null,
  "material": string or null,
  "price": integer or null,
  "has_missing_info": boolean
}}

Rules:
- Use null for anything the message does not state. Never guess.
- "weight" is the numeric value only; put the unit (kg, grams, tonnes, pounds) in "weight_unit".
- "price" is a customer-stated amount in whole currency units, without separators.
- Materials are plain nouns such as electronics, chemicals, machinery, furniture, textiles, paint, food.
- "has_missing_info" is true when any of from_city, to_city, weight, or material is null.

Message:
{message}"#
    )
}

#[cfg(test)]
mod tests {
    use super::build_extraction_prompt;

    #[test]
    fn prompt_embeds_the_message_and_schema_fields() {
        let prompt = build_extraction_prompt("send 200kg from jaipur to kolkata");

        assert!(prompt.contains("send 200kg from jaipur to kolkata"));
        for field in
            ["company", "from_city", "to_city", "weight_unit", "material", "price"]
        {
            assert!(prompt.contains(field), "prompt should mention {field}");
        }
    }
}
