//! Request-level operations behind the `/motors/` resource.
//!
//! The HTTP server is not part of the flight core; these functions take an
//! already-routed request and produce the JSON body it answers with.

use std::{collections::BTreeMap, str::FromStr};

use shared_definitions::motorboard::MOTOR_COUNT;

use crate::{output::motors_state_manager::MotorsStateManager, util::error::ApiError};

const MOTORS_PATH: &str = "/motors/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorSelector {
    All,
    Single(usize),
}

impl MotorSelector {
    /// `/motors/` addresses every motor, `/motors/<id>` a single one.
    pub fn from_path(path: &str) -> Result<Self, ApiError> {
        let unknown = || ApiError::UnknownPath(path.to_string());
        let rest = path.strip_prefix(MOTORS_PATH).ok_or_else(unknown)?;
        if rest.is_empty() {
            return Ok(MotorSelector::All);
        }
        if !rest.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(unknown());
        }
        rest.parse().map(MotorSelector::Single).map_err(|_| unknown())
    }

    fn motors(self, motor_count: usize) -> Vec<usize> {
        match self {
            MotorSelector::All => (0..motor_count).collect(),
            MotorSelector::Single(motor_id) => vec![motor_id],
        }
    }
}

impl FromStr for MotorSelector {
    type Err = ApiError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        Self::from_path(path)
    }
}

/// Parses a request body holding one speed fraction.
pub fn parse_speed(body: &str) -> Result<f64, ApiError> {
    body.trim()
        .parse()
        .map_err(|_| ApiError::InvalidSpeed(body.trim().to_string()))
}

/// JSON map from motor index to speed, two-space indented with a trailing newline.
pub fn read_speeds(
    motors: &MotorsStateManager,
    selector: MotorSelector,
) -> Result<String, ApiError> {
    let mut speeds = BTreeMap::new();
    for motor_id in selector.motors(motors.motor_count()) {
        speeds.insert(motor_id.to_string(), motors.speed(motor_id)?);
    }
    log::debug!("motor speeds: {speeds:?}");

    let mut body = serde_json::to_string_pretty(&speeds)?;
    body.push('\n');
    Ok(body)
}

pub fn write_speed(
    motors: &MotorsStateManager,
    selector: MotorSelector,
    speed: f64,
) -> Result<String, ApiError> {
    match selector {
        MotorSelector::All => motors.set_speeds([speed; MOTOR_COUNT])?,
        MotorSelector::Single(motor_id) => motors.set_speed(motor_id, speed)?,
    }
    read_speeds(motors, selector)
}
