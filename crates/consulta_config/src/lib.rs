use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub mod models;
pub use models::*;

const SECRET_MARKER: &str = "secret_from_env";

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `{CONFIG_DIR}/default` (any format the `config` crate understands)
/// 2. `{CONFIG_DIR}/{RUN_ENV}` (`RUN_ENV` defaults to `debug`)
/// 3. environment variables prefixed with `CONSULTA`, nested with `__`
///
/// Values equal to `secret_from_env` are then replaced from the environment
/// (see [`apply_env_overrides_from_marker`]) and the result is validated.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "CONSULTA".to_string());
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading config from {} and {} (prefix {})",
        default_path.display(),
        env_path.display(),
        prefix
    );

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    let config = apply_env_overrides_from_marker(raw_config)?;
    validate(&config)?;
    Ok(config)
}

/// Recursively replaces all `secret_from_env` string values with environment variable values.
///
/// The variable name is the JSON path joined with `_` and upper-cased, so
/// `stripe.secret_key` is read from `STRIPE_SECRET_KEY`. Missing variables are
/// collected and reported together.
fn inject_env_secrets(value: &mut Value, missing: &mut Vec<String>) {
    fn walk(path: &mut Vec<String>, obj: &mut Value, missing: &mut Vec<String>) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.to_string());
                    walk(path, v, missing);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                match env::var(&env_key) {
                    Ok(env_val) => *obj = Value::String(env_val),
                    Err(_) => missing.push(env_key),
                }
            }
            _ => {}
        }
    }

    walk(&mut Vec::new(), value, missing);
}

/// Applies environment overrides based on `secret_from_env` markers in the serialized config.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|e| ConfigError::Message(format!("config is not serializable: {e}")))?;
    let mut missing = Vec::new();
    inject_env_secrets(&mut json, &mut missing);
    if !missing.is_empty() {
        return Err(ConfigError::Message(format!(
            "environment variables required by secret_from_env are not set: {}",
            missing.join(", ")
        )));
    }
    serde_json::from_value(json)
        .map_err(|e| ConfigError::Message(format!("config no longer deserializes: {e}")))
}

/// Checks cross-field rules that serde cannot express.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let scheduling = &config.scheduling;
    scheduling.time_zone.parse::<Tz>().map_err(|_| {
        ConfigError::Message(format!(
            "scheduling.time_zone '{}' is not a known IANA time zone",
            scheduling.time_zone
        ))
    })?;
    if scheduling.slot_granularity_minutes <= 0 {
        return Err(ConfigError::Message(
            "scheduling.slot_granularity_minutes must be positive".to_string(),
        ));
    }
    if scheduling.min_lead_days < 0 || scheduling.min_lead_days > scheduling.max_lead_days {
        return Err(ConfigError::Message(
            "scheduling lead window must satisfy 0 <= min_lead_days <= max_lead_days".to_string(),
        ));
    }
    if scheduling.buffer_before_minutes < 0 || scheduling.buffer_after_minutes < 0 {
        return Err(ConfigError::Message(
            "scheduling buffers cannot be negative".to_string(),
        ));
    }
    if let Some(plan) = config.plans.iter().find(|p| p.duration_minutes <= 0) {
        return Err(ConfigError::Message(format!(
            "plan '{}' must have a positive duration",
            plan.id
        )));
    }
    Ok(())
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment once.
///
/// `DOTENV_OVERRIDE` wins over a first command line argument starting with
/// `.env`, which wins over plain `.env`. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
