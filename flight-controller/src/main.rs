use std::{env, process::ExitCode};

use flight_core::{
    config::store::AppConfig,
    firmware::Firmware,
    shared_core_values::{INPUT_SHARED, TELEMETRY_SHARED},
    util::{error::AppError, logger},
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flight-core: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = match env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    logger::initialize(logger::parse_level(&config.log_level)?, config.log_time_format)?;
    log::info!("Running");

    let mut firmware = Firmware::new(config)?;
    let result = firmware.run(&INPUT_SHARED, &TELEMETRY_SHARED);
    firmware.shutdown();
    result
}
