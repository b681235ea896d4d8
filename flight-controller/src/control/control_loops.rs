use std::{
    sync::atomic::Ordering,
    time::{Duration, Instant},
};

use shared_definitions::{
    controller::Placement,
    motorboard::{pwm_of, MOTOR_COUNT},
};

use super::{attitude_estimator::AttitudeEstimator, attitude_mixer::AttitudeMixer};
use crate::{
    communication_interfaces::serial::SerialConnector,
    config::store::AppConfig,
    drivers::navboard::{Navboard, NavboardSample},
    output::motors_state_manager::MotorsStateManager,
    shared_core_values::{AtomicControllerInput, AtomicTelemetry},
    util::error::SensorError,
};

/// Placement estimation and motor mixing, owned by the flight loop thread.
pub struct FlightStabilizer {
    estimator: AttitudeEstimator,
    mixer: AttitudeMixer,
}

impl FlightStabilizer {
    pub fn new(config: &AppConfig) -> Self {
        FlightStabilizer {
            estimator: AttitudeEstimator::new(&config.estimator),
            mixer: AttitudeMixer::new(&config.controller),
        }
    }

    /// Returns the estimated placement and the motor speeds correcting it.
    pub fn step(
        &mut self,
        sample: &NavboardSample,
        desired: Placement,
        dt: Duration,
    ) -> (Placement, [f64; MOTOR_COUNT]) {
        let actual = self.estimator.update(sample, dt);
        (actual, self.mixer.control(actual, desired, dt))
    }

    pub fn reset(&mut self) {
        self.estimator.reset();
        self.mixer.reset();
    }
}

/// Runs the control cycle until `input.shutdown` is set.
///
/// Each navboard sample drives one estimator and mixer step whose output is
/// handed to the motorboard. After `max_consecutive_failures` failed reads
/// in a row every motor is stopped and the last error is returned.
pub fn run_flight_loop<C: SerialConnector>(
    navboard: &mut Navboard<C>,
    stabilizer: &mut FlightStabilizer,
    motors: &MotorsStateManager,
    input: &AtomicControllerInput,
    telemetry: &AtomicTelemetry,
    max_consecutive_failures: usize,
) -> Result<(), SensorError> {
    let mut previous_sample_at: Option<Instant> = None;
    let mut consecutive_failures = 0_usize;

    while !input.shutdown.load(Ordering::Acquire) {
        let sample = match navboard.next_sample() {
            Ok(sample) => {
                consecutive_failures = 0;
                sample
            }
            Err(err) => {
                consecutive_failures += 1;
                telemetry.sensor_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Failed to read navboard ({consecutive_failures}/{max_consecutive_failures}). err={err}"
                );
                if consecutive_failures >= max_consecutive_failures {
                    log::error!("Too many navboard failures, stopping motors");
                    stop_motors(motors, telemetry);
                    return Err(err);
                }
                // Wipe the timing so the reopen pause doesn't count as a control step.
                previous_sample_at = None;
                continue;
            }
        };

        let now = Instant::now();
        let dt = previous_sample_at.map_or(Duration::ZERO, |previous| now - previous);
        previous_sample_at = Some(now);

        if input.kill_motors.load(Ordering::Acquire) {
            stop_motors(motors, telemetry);
            stabilizer.reset();
            continue;
        }

        let (actual, speeds) = stabilizer.step(&sample, input.desired.read(), dt);
        if let Err(err) = motors.set_speeds(speeds) {
            log::error!("Mixer produced unusable speeds {speeds:?}. err={err}");
        } else {
            for (power, speed) in telemetry.motor_power.iter().zip(speeds) {
                power.store(pwm_of(speed).unwrap_or_default(), Ordering::Relaxed);
            }
        }

        telemetry.estimated.store(actual);
        telemetry
            .last_sequence
            .store(sample.raw.seq, Ordering::Relaxed);
        telemetry
            .loop_exec_time_us
            .store(dt.as_micros() as u64, Ordering::Relaxed);
    }

    log::info!("Flight loop stopped");
    stop_motors(motors, telemetry);
    Ok(())
}

fn stop_motors(motors: &MotorsStateManager, telemetry: &AtomicTelemetry) {
    if let Err(err) = motors.set_speeds([0.0; MOTOR_COUNT]) {
        log::error!("Failed to stop motors. err={err}");
    }
    for power in &telemetry.motor_power {
        power.store(0, Ordering::Relaxed);
    }
}
