use std::fs;
use std::path::Path;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const DEFAULT_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            level: Self::DEFAULT_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let original = self.level.clone();
        self.level = self.level.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.level.as_str()) {
            eprintln!(
                "Config error: log level of '{}' is invalid - using default of '{}'",
                original,
                Self::DEFAULT_LEVEL
            );
            self.level = Self::DEFAULT_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HttpConfig {
    timeout_seconds: u64,
    verify_tls: bool,
}

impl HttpConfig {
    const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    fn default() -> Self {
        HttpConfig {
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
            verify_tls: true,
        }
    }

    fn ensure_valid(&mut self) {
        if self.timeout_seconds == 0 {
            eprintln!(
                "Config error: http timeout of 0 is invalid - using default of {}",
                Self::DEFAULT_TIMEOUT_SECONDS
            );
            self.timeout_seconds = Self::DEFAULT_TIMEOUT_SECONDS;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
}

impl Config {
    pub fn default_config() -> Self {
        Config {
            logging: LoggingConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Loads the configuration from a TOML file in the app's data directory.
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");

        let default_config = Config::default_config();

        if !config_path.exists() {
            Self::write_default(&config_path, &default_config);
        }

        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(&config_path));

        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    /// First-run seed: a config.toml with the defaults, so users have a file
    /// to edit. Any failure here only costs the seed file, not the run.
    fn write_default(config_path: &Path, config: &Config) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
                return;
            }
        }

        match toml::to_string_pretty(config) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(e) => eprintln!("Failed to serialize default config: {e}"),
        }
    }

    /// The loaded configuration, or defaults when loading never happened
    /// (tests and early startup errors).
    pub fn get() -> Config {
        CONFIG.get().cloned().unwrap_or_else(Config::default_config)
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.http.ensure_valid();
    }
}
