use super::models::Config;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat, Map};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_ENV_VAR: &str = "RESTOFEED_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/restofeed.toml";
const ENV_PREFIX: &str = "RESTOFEED";
const ENV_SEPARATOR: &str = "__";

/// Layers, lowest priority first: struct defaults, the TOML file, `.env`,
/// then the process environment.
pub fn load() -> Result<Config, ConfigError> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    load_from_sources(config_path())
}

pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    load_layers(&config_path, None)
}

/// `RESTOFEED_CONFIG` if set, otherwise `config/restofeed.toml`
fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// `env_vars` stands in for the process environment when given
fn load_layers(
    config_path: &Path,
    env_vars: Option<Map<String, String>>,
) -> Result<Config, ConfigError> {
    with_file(config::Config::builder(), config_path)
        .add_source(environment(env_vars))
        .build()?
        .try_deserialize()
}

/// The file is always TOML, whatever its extension. Absent means defaults.
fn with_file(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    if !path.is_file() {
        debug!(path = %path.display(), "No configuration file, using defaults");
        return builder;
    }

    debug!(path = %path.display(), "Reading configuration file");
    builder.add_source(File::from(path).format(FileFormat::Toml).required(true))
}

// RESTOFEED__CLIENT__BASE_URL -> client.base_url
fn environment(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
        .source(vars)
}
