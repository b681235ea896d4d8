use std::time::Duration;

use shared_definitions::controller::Placement;

use super::{integrator::Integrator, kalman_filter::KalmanFilter};
use crate::{config::store::EstimatorConfig, drivers::navboard::NavboardSample};

/// Bit 15 of the ultrasound field flags a fresh echo, the distance is below it.
const ULTRASOUND_VALUE_MASK: u16 = 0x7fff;

/// Estimates the vehicle placement from calibrated navboard samples.
///
/// Roll and pitch fuse gyro rates with accelerometer tilt, yaw integrates the
/// z gyro, altitude comes straight from the ultrasound echo.
pub struct AttitudeEstimator {
    roll_filter: KalmanFilter,
    pitch_filter: KalmanFilter,
    yaw_integrator: Integrator,
    gyro_scale: f64,
    ultrasound_scale: f64,
}

impl AttitudeEstimator {
    pub fn new(config: &EstimatorConfig) -> Self {
        AttitudeEstimator {
            roll_filter: KalmanFilter::new(config.gyro_drift, config.accel_uncertainty),
            pitch_filter: KalmanFilter::new(config.gyro_drift, config.accel_uncertainty),
            yaw_integrator: Integrator::new(),
            gyro_scale: config.gyro_scale,
            ultrasound_scale: config.ultrasound_scale,
        }
    }

    pub fn update(&mut self, sample: &NavboardSample, dt: Duration) -> Placement {
        let seconds = dt.as_secs_f64();
        let tilt = sample.data.acceleration().calculate_orientation_angles();

        let roll = self.roll_filter.get_next_state_prediction(
            sample.data.gx * self.gyro_scale,
            tilt.roll,
            seconds,
        );
        let pitch = self.pitch_filter.get_next_state_prediction(
            sample.data.gy * self.gyro_scale,
            tilt.pitch,
            seconds,
        );
        let yaw = self
            .yaw_integrator
            .add_new_value(sample.data.gz * self.gyro_scale, seconds);
        let altitude =
            (sample.raw.ultrasound & ULTRASOUND_VALUE_MASK) as f64 * self.ultrasound_scale;

        Placement {
            pitch,
            roll,
            yaw,
            altitude,
        }
    }

    /// Restarts the estimate from a level, zero-heading attitude.
    pub fn reset(&mut self) {
        self.roll_filter.reset(0.0);
        self.pitch_filter.reset(0.0);
        self.yaw_integrator.reset();
    }
}
