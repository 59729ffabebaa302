use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use parcelo_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    let mut push = |key: &str, value: &str, env_key: &str| {
        lines.push(render_line(
            key,
            value,
            field_source(
                key,
                Some(env_key),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    };

    push("api.cities_url", &config.api.cities_url, "PARCELO_API_CITIES_URL");
    push("api.trips_url", &config.api.trips_url, "PARCELO_API_TRIPS_URL");
    push("api.parcels_url", &config.api.parcels_url, "PARCELO_API_PARCELS_URL");
    push(
        "api.username",
        &redact_secret(config.api.username.expose_secret()),
        "PARCELO_API_USERNAME",
    );
    push(
        "api.password",
        &redact_secret(config.api.password.expose_secret()),
        "PARCELO_API_PASSWORD",
    );
    push("api.timeout_secs", &config.api.timeout_secs.to_string(), "PARCELO_API_TIMEOUT_SECS");
    push(
        "api.min_call_millis",
        &config.api.min_call_millis.to_string(),
        "PARCELO_API_MIN_CALL_MILLIS",
    );
    push(
        "api.default_material_id",
        &config.api.default_material_id,
        "PARCELO_API_DEFAULT_MATERIAL_ID",
    );
    push(
        "api.fallback_trip_id",
        config.api.fallback_trip_id.as_deref().unwrap_or("<unset>"),
        "PARCELO_API_FALLBACK_TRIP_ID",
    );

    push("llm.enabled", &config.llm.enabled.to_string(), "PARCELO_LLM_ENABLED");
    push("llm.model", &config.llm.model, "PARCELO_LLM_MODEL");
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    push("llm.api_key", llm_api_key, "PARCELO_LLM_API_KEY");

    push("server.bind_address", &config.server.bind_address, "PARCELO_SERVER_BIND_ADDRESS");
    push("server.port", &config.server.port.to_string(), "PARCELO_SERVER_PORT");

    push("logging.level", &config.logging.level, "PARCELO_LOGGING_LEVEL");
    push("logging.format", &format!("{:?}", config.logging.format), "PARCELO_LOGGING_FORMAT");

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("parcelo.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/parcelo.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(value: &str) -> String {
    if value.trim().is_empty() {
        return "<empty>".to_string();
    }
    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn nested_keys_are_found_in_the_config_document() {
        let doc: Value = "[api]\ncities_url = \"http://example/api/cities\"".parse().unwrap();

        assert!(contains_path(&doc, "api.cities_url"));
        assert!(!contains_path(&doc, "api.password"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn secrets_never_render_verbatim() {
        assert_eq!(redact_secret(""), "<empty>");
        assert_eq!(redact_secret("   "), "<empty>");
        assert_eq!(redact_secret("hunter2"), "<redacted>");
    }
}
