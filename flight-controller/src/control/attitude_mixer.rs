use std::time::Duration;

use shared_definitions::{controller::Placement, motorboard::MOTOR_COUNT};

use super::pid::PID;
use crate::config::store::ControllerConfig;

/// Turns placement errors into four motor speeds for an X-configuration
/// quadcopter.
///
/// The common throttle never exceeds `1 - rotation_band` and every motor's
/// correction stays within `[0, rotation_band]`, so the outputs remain valid
/// speed fractions under any combination of corrections.
pub struct AttitudeMixer {
    rotation_band: f64,
    throttle_hover: f64,
    throttle_min: f64,
    pitch: PID,
    roll: PID,
    yaw: PID,
    altitude: PID,
}

impl AttitudeMixer {
    pub fn new(config: &ControllerConfig) -> Self {
        AttitudeMixer {
            rotation_band: config.rotation_band,
            throttle_hover: config.throttle_hover,
            throttle_min: config.throttle_min,
            pitch: PID::from_gains(&config.pitch),
            roll: PID::from_gains(&config.roll),
            yaw: PID::from_gains(&config.yaw),
            altitude: PID::from_gains(&config.altitude),
        }
    }

    pub fn control(
        &mut self,
        actual: Placement,
        desired: Placement,
        dt: Duration,
    ) -> [f64; MOTOR_COUNT] {
        let pitch_out = self.pitch.update(actual.pitch, desired.pitch, dt);
        let roll_out = self.roll.update(actual.roll, desired.roll, dt);
        let yaw_out = self.yaw.update(actual.yaw, desired.yaw, dt);
        let altitude_out = self.altitude.update(actual.altitude, desired.altitude, dt);

        let throttle = self
            .throttle_min
            .max((1.0 - self.rotation_band).min(self.throttle_min + altitude_out));
        let band = self.rotation_band;

        [
            throttle + clip_band(roll_out + pitch_out + yaw_out, band),
            throttle + clip_band(-roll_out + pitch_out - yaw_out, band),
            throttle + clip_band(-roll_out - pitch_out + yaw_out, band),
            throttle + clip_band(roll_out - pitch_out - yaw_out, band),
        ]
    }

    pub fn throttle_hover(&self) -> f64 {
        self.throttle_hover
    }

    pub fn rotation_band(&self) -> f64 {
        self.rotation_band
    }

    pub fn reset(&mut self) {
        self.pitch.reset();
        self.roll.reset();
        self.yaw.reset();
        self.altitude.reset();
    }
}

fn clip_band(value: f64, band: f64) -> f64 {
    band / 2.0 + clip(value, band / 2.0)
}

fn clip(value: f64, max: f64) -> f64 {
    value.min(max).max(-max)
}
