use std::io;

use shared_definitions::navboard::{FrameError, ImuAxis};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("navboard io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("standard deviation too high: std={stdev:.2} sensor={axis}")]
    NoisyInput { axis: ImuAxis, stdev: f64 },
    #[error("accelerometer gain must be positive, got {0:.2}")]
    NonPositiveGain(f64),
    #[error("calibration read failed: {0}")]
    Read(#[from] SensorError),
}

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("unknown motor: {0}")]
    UnknownMotor(usize),
    #[error("motor speed out of range [0, 1]: {0}")]
    SpeedOutOfRange(f64),
    #[error("motorboard io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown motor path: {0}")]
    UnknownPath(String),
    #[error("invalid speed: {0}")]
    InvalidSpeed(String),
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
    #[error("could not encode response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
    #[error("could not spawn {name} thread: {source}")]
    Thread { name: &'static str, source: io::Error },
}
