use std::time::Duration;

// Navboard
pub const NAVBOARD_START_COMMAND: [u8; 1] = [0x01];
pub const DEFAULT_NAVBOARD_TTY: &str = "/dev/ttyO1";

// Calibration
pub const CALIBRATION_SAMPLES: usize = 40;
/// Shared by the whole calibration run, not per sample.
pub const CALIBRATION_READ_RETRIES: usize = 100;
/// Stdev is usually around 1 raw unit on every axis, 10 means the vehicle
/// is moving or the sensors are misbehaving.
pub const CALIBRATION_MAX_STDEV: f64 = 10.0;

// Motorboard
pub const DEFAULT_MOTORBOARD_TTY: &str = "/dev/ttyO0";
pub const MOTORBOARD_FREQUENCY_HZ: u32 = 20;

// Telemetry
pub const TELEMETRY_PERIOD: Duration = Duration::from_millis(250);
