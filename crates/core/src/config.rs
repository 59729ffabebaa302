use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Remote logistics backend: entity catalogs, trips, and parcel submission.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub cities_url: String,
    pub materials_url: String,
    pub companies_url: String,
    pub trips_url: String,
    pub parcels_url: String,
    pub username: SecretString,
    pub password: SecretString,
    pub timeout_secs: u64,
    /// Minimum wall-clock duration of each remote call, in milliseconds.
    /// The backend rate-limits aggressive callers; zero disables the floor.
    pub min_call_millis: u64,
    pub default_material_id: String,
    pub default_company_id: String,
    pub fallback_trip_id: Option<String>,
    pub created_by: String,
    pub created_by_company: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_username: Option<String>,
    pub api_password: Option<String>,
    pub min_call_millis: Option<u64>,
    pub log_level: Option<String>,
    pub llm_enabled: Option<bool>,
    pub llm_model: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                cities_url: "http://localhost:9000/api/cities".to_string(),
                materials_url: "http://localhost:9000/api/materials".to_string(),
                companies_url: "http://localhost:9000/api/companies".to_string(),
                trips_url: "http://localhost:9000/api/trips".to_string(),
                parcels_url: "http://localhost:9000/api/parcels".to_string(),
                username: String::new().into(),
                password: String::new().into(),
                timeout_secs: 30,
                min_call_millis: 5_000,
                default_material_id: "material-general".to_string(),
                default_company_id: "company-unknown".to_string(),
                fallback_trip_id: None,
                created_by: "parcelo-agent".to_string(),
                created_by_company: "parcelo".to_string(),
            },
            llm: LlmConfig {
                enabled: false,
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-1.5-flash".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("parcelo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(cities_url) = api.cities_url {
                self.api.cities_url = cities_url;
            }
            if let Some(materials_url) = api.materials_url {
                self.api.materials_url = materials_url;
            }
            if let Some(companies_url) = api.companies_url {
                self.api.companies_url = companies_url;
            }
            if let Some(trips_url) = api.trips_url {
                self.api.trips_url = trips_url;
            }
            if let Some(parcels_url) = api.parcels_url {
                self.api.parcels_url = parcels_url;
            }
            if let Some(username_value) = api.username {
                self.api.username = secret_value(username_value);
            }
            if let Some(password_value) = api.password {
                self.api.password = secret_value(password_value);
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(min_call_millis) = api.min_call_millis {
                self.api.min_call_millis = min_call_millis;
            }
            if let Some(default_material_id) = api.default_material_id {
                self.api.default_material_id = default_material_id;
            }
            if let Some(default_company_id) = api.default_company_id {
                self.api.default_company_id = default_company_id;
            }
            if let Some(fallback_trip_id) = api.fallback_trip_id {
                self.api.fallback_trip_id = Some(fallback_trip_id);
            }
            if let Some(created_by) = api.created_by {
                self.api.created_by = created_by;
            }
            if let Some(created_by_company) = api.created_by_company {
                self.api.created_by_company = created_by_company;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(enabled) = llm.enabled {
                self.llm.enabled = enabled;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PARCELO_API_CITIES_URL") {
            self.api.cities_url = value;
        }
        if let Some(value) = read_env("PARCELO_API_MATERIALS_URL") {
            self.api.materials_url = value;
        }
        if let Some(value) = read_env("PARCELO_API_COMPANIES_URL") {
            self.api.companies_url = value;
        }
        if let Some(value) = read_env("PARCELO_API_TRIPS_URL") {
            self.api.trips_url = value;
        }
        if let Some(value) = read_env("PARCELO_API_PARCELS_URL") {
            self.api.parcels_url = value;
        }
        if let Some(value) = read_env("PARCELO_API_USERNAME") {
            self.api.username = secret_value(value);
        }
        if let Some(value) = read_env("PARCELO_API_PASSWORD") {
            self.api.password = secret_value(value);
        }
        if let Some(value) = read_env("PARCELO_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("PARCELO_API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PARCELO_API_MIN_CALL_MILLIS") {
            self.api.min_call_millis = parse_u64("PARCELO_API_MIN_CALL_MILLIS", &value)?;
        }
        if let Some(value) = read_env("PARCELO_API_DEFAULT_MATERIAL_ID") {
            self.api.default_material_id = value;
        }
        if let Some(value) = read_env("PARCELO_API_DEFAULT_COMPANY_ID") {
            self.api.default_company_id = value;
        }
        if let Some(value) = read_env("PARCELO_API_FALLBACK_TRIP_ID") {
            self.api.fallback_trip_id = Some(value);
        }
        if let Some(value) = read_env("PARCELO_API_CREATED_BY") {
            self.api.created_by = value;
        }
        if let Some(value) = read_env("PARCELO_API_CREATED_BY_COMPANY") {
            self.api.created_by_company = value;
        }

        if let Some(value) = read_env("PARCELO_LLM_ENABLED") {
            self.llm.enabled = parse_bool("PARCELO_LLM_ENABLED", &value)?;
        }
        if let Some(value) = read_env("PARCELO_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PARCELO_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("PARCELO_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("PARCELO_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("PARCELO_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PARCELO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PARCELO_SERVER_PORT") {
            self.server.port = parse_u16("PARCELO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PARCELO_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PARCELO_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("PARCELO_LOGGING_LEVEL").or_else(|| read_env("PARCELO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PARCELO_LOGGING_FORMAT").or_else(|| read_env("PARCELO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_username) = overrides.api_username {
            self.api.username = secret_value(api_username);
        }
        if let Some(api_password) = overrides.api_password {
            self.api.password = secret_value(api_password);
        }
        if let Some(min_call_millis) = overrides.min_call_millis {
            self.api.min_call_millis = min_call_millis;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_enabled) = overrides.llm_enabled {
            self.llm.enabled = llm_enabled;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("parcelo.toml"), PathBuf::from("config/parcelo.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    for (key, url) in [
        ("api.cities_url", &api.cities_url),
        ("api.materials_url", &api.materials_url),
        ("api.companies_url", &api.companies_url),
        ("api.trips_url", &api.trips_url),
        ("api.parcels_url", &api.parcels_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{key} must start with http:// or https://"
            )));
        }
    }

    if api.username.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "api.username is required (set PARCELO_API_USERNAME or [api] username)".to_string(),
        ));
    }
    if api.password.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "api.password is required (set PARCELO_API_PASSWORD or [api] password)".to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if api.min_call_millis > 60_000 {
        return Err(ConfigError::Validation(
            "api.min_call_millis must not exceed 60000".to_string(),
        ));
    }

    for (key, value) in [
        ("api.default_material_id", &api.default_material_id),
        ("api.default_company_id", &api.default_company_id),
        ("api.created_by", &api.created_by),
        ("api.created_by_company", &api.created_by_company),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.enabled {
        let missing = llm
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "llm.api_key is required when llm.enabled is true".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    cities_url: Option<String>,
    materials_url: Option<String>,
    companies_url: Option<String>,
    trips_url: Option<String>,
    parcels_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
    min_call_millis: Option<u64>,
    default_material_id: Option<String>,
    default_company_id: Option<String>,
    fallback_trip_id: Option<String>,
    created_by: Option<String>,
    created_by_company: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    enabled: Option<bool>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_API_USERNAME", "ops-from-env");
        env::set_var("TEST_API_PASSWORD", "hunter2-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parcelo.toml");
            fs::write(
                &path,
                r#"
[api]
username = "${TEST_API_USERNAME}"
password = "${TEST_API_PASSWORD}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.api.username.expose_secret() == "ops-from-env",
                "username should be loaded from environment",
            )?;
            ensure(
                config.api.password.expose_secret() == "hunter2-from-env",
                "password should be loaded from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_API_USERNAME", "TEST_API_PASSWORD"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARCELO_API_USERNAME", "ops");
        env::set_var("PARCELO_API_PASSWORD", "hunter2");
        env::set_var("PARCELO_LOG_LEVEL", "warn");
        env::set_var("PARCELO_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "PARCELO_API_USERNAME",
            "PARCELO_API_PASSWORD",
            "PARCELO_LOG_LEVEL",
            "PARCELO_LOG_FORMAT",
        ]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARCELO_API_CITIES_URL", "http://from-env/api/cities");
        env::set_var("PARCELO_API_USERNAME", "user-from-env");
        env::set_var("PARCELO_API_PASSWORD", "pass-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parcelo.toml");
            fs::write(
                &path,
                r#"
[api]
cities_url = "http://from-file/api/cities"
username = "user-from-file"
password = "pass-from-file"
min_call_millis = 2000

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    min_call_millis: Some(0),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.api.cities_url == "http://from-env/api/cities",
                "env cities url should win over file",
            )?;
            ensure(config.api.min_call_millis == 0, "override rate floor should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.api.username.expose_secret() == "user-from-env",
                "env username should win over file",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "PARCELO_API_CITIES_URL",
            "PARCELO_API_USERNAME",
            "PARCELO_API_PASSWORD",
        ]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        // Password intentionally absent.
        env::set_var("PARCELO_API_USERNAME", "ops");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("api.password")
            );
            ensure(has_message, "validation failure should mention api.password")
        })();

        clear_vars(&["PARCELO_API_USERNAME"]);
        result
    }

    #[test]
    fn llm_enabled_requires_an_api_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARCELO_API_USERNAME", "ops");
        env::set_var("PARCELO_API_PASSWORD", "hunter2");
        env::set_var("PARCELO_LLM_ENABLED", "true");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected llm.api_key validation failure".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.api_key")
            );
            ensure(has_message, "validation failure should mention llm.api_key")
        })();

        clear_vars(&["PARCELO_API_USERNAME", "PARCELO_API_PASSWORD", "PARCELO_LLM_ENABLED"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARCELO_API_USERNAME", "ops-secret-value");
        env::set_var("PARCELO_API_PASSWORD", "pass-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("ops-secret-value"),
                "debug output should not contain the username",
            )?;
            ensure(
                !debug.contains("pass-secret-value"),
                "debug output should not contain the password",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["PARCELO_API_USERNAME", "PARCELO_API_PASSWORD"]);
        result
    }
}
