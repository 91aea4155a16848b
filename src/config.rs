use std::{env, path::Path, time::Duration};

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

use crate::error::ConfigError;

pub const VAR_HOST: &str = "HOST";
pub const VAR_PORT: &str = "PORT";
pub const VAR_DATA_PATH: &str = "DATA_PATH";
pub const VAR_STATIC_DIR: &str = "STATIC_DIR";
pub const VAR_ALADHAN_BASE_URL: &str = "ALADHAN_BASE_URL";
pub const VAR_ALQURAN_BASE_URL: &str = "ALQURAN_BASE_URL";
pub const VAR_GEOCODE_BASE_URL: &str = "GEOCODE_BASE_URL";
pub const VAR_LOG_CONFIG_PATH: &str = "LOG_CONFIG_PATH";
pub const VAR_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub static_dir: String,
    pub aladhan_base_url: String,
    pub alquran_base_url: String,
    pub geocode_base_url: String,
    pub log_config_path: String,
    pub http_timeout: Duration,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(AppConfig {
            host: var_or(VAR_HOST, "127.0.0.1"),
            port: parsed_var(VAR_PORT, 3000)?,
            data_path: var_or(VAR_DATA_PATH, "data/store.json"),
            static_dir: var_or(VAR_STATIC_DIR, "static"),
            aladhan_base_url: var_or(VAR_ALADHAN_BASE_URL, "https://api.aladhan.com"),
            alquran_base_url: var_or(VAR_ALQURAN_BASE_URL, "https://api.alquran.cloud"),
            geocode_base_url: var_or(VAR_GEOCODE_BASE_URL, "https://api.bigdatacloud.net"),
            log_config_path: var_or(VAR_LOG_CONFIG_PATH, "log4rs.yaml"),
            http_timeout: Duration::from_secs(parsed_var(VAR_HTTP_TIMEOUT_SECS, 10)?),
        })
    }
}

/// Use the log4rs YAML file when present, otherwise log `info` and above to stdout.
pub fn init_logging(config_path: &str) -> Result<(), ConfigError> {
    if Path::new(config_path).exists() {
        return log4rs::init_file(config_path, Default::default())
            .map_err(|e| ConfigError::Logging(e.to_string()));
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
