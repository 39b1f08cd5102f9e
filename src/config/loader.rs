//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, Environment, SyncConfig};
use super::secret::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SyncConfig
/// 4. Applies environment variable overrides (RECSYNC_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use recsync::config::loader::load_config;
///
/// let config = load_config("recsync.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SyncConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Parses, overrides and validates configuration from TOML text
///
/// # Errors
///
/// Same as [`load_config`], minus the file access failures.
pub fn load_config_from_str(contents: &str) -> Result<SyncConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SyncConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SyncError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex"))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| SyncError::Configuration(format!("Invalid value '{value}' for {name}")))
}

fn parse_enum_override<T: serde::de::DeserializeOwned>(name: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| SyncError::Configuration(format!("Invalid value '{value}' for {name}")))
}

/// Applies environment variable overrides using RECSYNC_* prefix
///
/// Environment variables follow the pattern: RECSYNC_<SECTION>_<KEY>
/// For example: RECSYNC_RECONCILE_BATCH_SIZE, RECSYNC_INPUT_PATH
fn apply_env_overrides(config: &mut SyncConfig) -> Result<()> {
    const PREFIX: &str = "RECSYNC_";

    let vars: Vec<(String, String)> = std::env::vars()
        .filter(|(name, _)| name.starts_with(PREFIX))
        .collect();

    for (name, val) in vars {
        match name.as_str() {
            "RECSYNC_APPLICATION_LOG_LEVEL" => config.application.log_level = val,
            "RECSYNC_APPLICATION_DRY_RUN" => {
                config.application.dry_run = parse_override(&name, &val)?;
            }
            "RECSYNC_ENVIRONMENT" => {
                config.environment = parse_enum_override::<Environment>(&name, &val)?;
            }
            "RECSYNC_INPUT_PATH" => config.input.path = val,
            "RECSYNC_INPUT_DELIMITER" => config.input.delimiter = val,
            "RECSYNC_INPUT_HAS_ID_COLUMN" => {
                config.input.has_id_column = parse_override(&name, &val)?;
            }
            "RECSYNC_INPUT_KEY_TYPE" => config.input.key_type = parse_override(&name, &val)?,
            "RECSYNC_RECONCILE_POLICY" => {
                config.reconcile.policy = parse_enum_override(&name, &val)?;
            }
            "RECSYNC_RECONCILE_BATCH_SIZE" => {
                config.reconcile.batch_size = parse_override(&name, &val)?;
            }
            "RECSYNC_RECONCILE_UNCHANGED_UPSERT" => {
                config.reconcile.unchanged_upsert = parse_enum_override(&name, &val)?;
            }
            "RECSYNC_DATABASE_TARGET" => {
                config.database_target = parse_enum_override::<DatabaseTarget>(&name, &val)?;
            }
            "RECSYNC_OUTCOMES_SUCCESS_LOG" => config.outcomes.success_log = val,
            "RECSYNC_OUTCOMES_FAILURE_LOG" => config.outcomes.failure_log = val,
            "RECSYNC_LOGGING_LOCAL_ENABLED" => {
                config.logging.local_enabled = parse_override(&name, &val)?;
            }
            "RECSYNC_LOGGING_LOCAL_PATH" => config.logging.local_path = val,
            "RECSYNC_LOGGING_LOCAL_ROTATION" => config.logging.local_rotation = val,
            _ => {}
        }
    }

    // PostgreSQL overrides (only if PostgreSQL is configured)
    if let Some(ref mut pg_config) = config.postgresql {
        if let Ok(val) = std::env::var("RECSYNC_POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("RECSYNC_POSTGRESQL_COLLECTION") {
            pg_config.collection = val;
        }
        if let Ok(val) = std::env::var("RECSYNC_POSTGRESQL_MAX_CONNECTIONS") {
            pg_config.max_connections = parse_override("RECSYNC_POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Ok(val) = std::env::var("RECSYNC_POSTGRESQL_SSL_MODE") {
            pg_config.ssl_mode = val;
        }
    }

    Ok(())
}
