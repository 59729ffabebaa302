pub mod config;
pub mod doctor;
pub mod estimate;
pub mod extract;
pub mod send;

use serde::Serialize;
use serde_json::json;

/// What a subcommand hands back to `main`: the process exit code plus a
/// single JSON line already rendered for stdout.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    command: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let envelope =
            Envelope { command, status: "ok", error_class: None, message: message.into() };
        Self { exit_code: 0, output: render(&envelope) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let envelope = Envelope {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: render(&envelope) }
    }
}

fn render(envelope: &Envelope<'_>) -> String {
    serde_json::to_string(envelope).unwrap_or_else(|error| {
        json!({
            "command": envelope.command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::CommandResult;

    #[test]
    fn success_envelope_omits_the_error_class() {
        let result = CommandResult::success("send", "parcel created");

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("\"status\":\"ok\""));
        assert!(!result.output.contains("error_class"));
    }

    #[test]
    fn failure_envelope_names_the_error_class() {
        let result = CommandResult::failure("send", "pipeline", "trip creation failed", 1);

        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("\"status\":\"error\""));
        assert!(result.output.contains("\"error_class\":\"pipeline\""));
        assert!(result.output.contains("trip creation failed"));
    }
}
