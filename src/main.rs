use dsmr_telegram::{parse_with_options, ParseOptions};
use log::{error, info};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

fn load_options() -> ParseOptions {
    /* Check for the two paths of the config file */
    for path in ["config/dsmr.yaml", "dsmr.yaml"] {
        if !Path::new(path).exists() {
            continue;
        }
        match ParseOptions::load(path) {
            Ok(options) => {
                info!("Using options from {}", path);
                return options;
            }
            Err(e) => error!("Ignoring {}: {}", path, e),
        }
    }
    ParseOptions::default()
}

fn main() -> ExitCode {
    // Initialize logging
    let default_filter = std::env::var("DSMR_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let options = load_options();

    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        error!("Unable to read telegram from stdin: {}", e);
        return ExitCode::FAILURE;
    }

    let telegram = match parse_with_options(&raw, &options) {
        Ok(telegram) => telegram,
        Err(e) => {
            error!("Telegram parse error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&telegram) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Unable to serialize telegram: {}", e);
            ExitCode::FAILURE
        }
    }
}
