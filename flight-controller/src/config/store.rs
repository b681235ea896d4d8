use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use shared_definitions::navboard::checksum::{FrameChecksum, UncheckedFrames, WordSumChecksum};

use super::constants::{
    DEFAULT_MOTORBOARD_TTY, DEFAULT_NAVBOARD_TTY, MOTORBOARD_FREQUENCY_HZ, NAVBOARD_START_COMMAND,
};
use crate::util::{error::ConfigError, logger::TimestampFormat};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

impl PidGains {
    pub const fn new(p: f64, i: f64, d: f64) -> Self {
        PidGains { p, i, d }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Share of the motor range reserved for attitude corrections.
    pub rotation_band: f64,
    pub throttle_hover: f64,
    pub throttle_min: f64,
    pub pitch: PidGains,
    pub roll: PidGains,
    pub yaw: PidGains,
    pub altitude: PidGains,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            rotation_band: 0.3,
            throttle_hover: 0.5,
            throttle_min: 0.1,
            pitch: PidGains::new(0.5, 0.0, 0.05),
            roll: PidGains::new(0.5, 0.0, 0.05),
            yaw: PidGains::new(0.2, 0.0, 0.0),
            altitude: PidGains::new(0.3, 0.05, 0.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Radians per second for one raw gyroscope unit.
    pub gyro_scale: f64,
    /// Metres for one raw ultrasound unit.
    pub ultrasound_scale: f64,
    pub gyro_drift: f64,
    pub accel_uncertainty: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            // 2000 deg/s full scale over a signed 16-bit range
            gyro_scale: 0.001_065_26,
            // echo round trip in microseconds at 343 m/s
            ultrasound_scale: 0.000_171_5,
            gyro_drift: 0.05,
            accel_uncertainty: 0.05,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumKind {
    #[default]
    WordSum,
    Unchecked,
}

impl ChecksumKind {
    pub fn validator(self) -> Box<dyn FrameChecksum> {
        match self {
            ChecksumKind::WordSum => Box::new(WordSumChecksum),
            ChecksumKind::Unchecked => Box::new(UncheckedFrames),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_time_format: TimestampFormat,
    pub motorboard_tty: String,
    pub navboard_tty: String,
    pub http_api_port: u16,
    pub motorboard_frequency_hz: u32,
    pub navboard_start_command: Vec<u8>,
    pub navboard_checksum: ChecksumKind,
    pub calibration_attempts: usize,
    pub max_consecutive_sensor_failures: usize,
    pub controller: ControllerConfig,
    pub estimator: EstimatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: "debug".to_string(),
            log_time_format: TimestampFormat::Clock,
            motorboard_tty: DEFAULT_MOTORBOARD_TTY.to_string(),
            navboard_tty: DEFAULT_NAVBOARD_TTY.to_string(),
            http_api_port: 80,
            motorboard_frequency_hz: MOTORBOARD_FREQUENCY_HZ,
            navboard_start_command: NAVBOARD_START_COMMAND.to_vec(),
            navboard_checksum: ChecksumKind::WordSum,
            calibration_attempts: 3,
            max_consecutive_sensor_failures: 10,
            controller: ControllerConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let controller = &self.controller;
        let band = controller.rotation_band;
        if !(band > 0.0 && band < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "rotation_band must be inside (0, 1), got {band}"
            )));
        }
        let throttle_max = 1.0 - band;
        if !(0.0..=throttle_max).contains(&controller.throttle_min) {
            return Err(ConfigError::Invalid(format!(
                "throttle_min must be inside [0, {throttle_max}], got {}",
                controller.throttle_min
            )));
        }
        if !(controller.throttle_min..=throttle_max).contains(&controller.throttle_hover) {
            return Err(ConfigError::Invalid(format!(
                "throttle_hover must be inside [{}, {throttle_max}], got {}",
                controller.throttle_min, controller.throttle_hover
            )));
        }
        if self.motorboard_frequency_hz == 0 {
            return Err(ConfigError::Invalid(
                "motorboard_frequency_hz must be positive".to_string(),
            ));
        }
        if self.calibration_attempts == 0 {
            return Err(ConfigError::Invalid(
                "calibration_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
