mod catalog;
mod cheapest;
mod cli;
mod config;
mod database;
mod error;
mod ingest;
mod observations;
mod reports;
mod schema;
mod scrapers;
mod shopping;
mod store_items;
mod stores;
mod trend;
mod units;

use directories::ProjectDirs;
use log::{debug, error};

use crate::cli::Cli;
use crate::config::{Config, CONFIG};

fn main() {
    let config = match ProjectDirs::from("", "", "pricepulse") {
        Some(project_dirs) => Config::load_config(&project_dirs),
        None => {
            eprintln!("Could not determine home directory. Using default configuration.");
            Config::default_config()
        }
    };
    let log_level = config.logging.level.clone();
    let _ = CONFIG.set(config);

    // RUST_LOG-style env spec wins over the configured level
    let logger = flexi_logger::Logger::try_with_env_or_str(&log_level)
        .and_then(|logger| logger.start());
    let _logger_handle = match logger {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    debug!(
        "Command-line args: {:?}",
        std::env::args_os().collect::<Vec<_>>()
    );

    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{err}");
        std::process::exit(1);
    }
}
