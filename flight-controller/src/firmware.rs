use std::{sync::atomic::Ordering, time::Instant};

use shared_definitions::motorboard::MOTOR_COUNT;

use crate::{
    communication_interfaces::serial::{SerialConnector, TtyConnector},
    config::{constants::TELEMETRY_PERIOD, store::AppConfig},
    control::control_loops::{run_flight_loop, FlightStabilizer},
    drivers::navboard::Navboard,
    output::motors_state_manager::MotorsStateManager,
    shared_core_values::{AtomicControllerInput, AtomicTelemetry},
    telemetry::start_telemetry_thread,
    util::error::{AppError, CalibrationError},
};

/// Owns both boards and the flight loop state.
pub struct Firmware<C: SerialConnector = TtyConnector> {
    config: AppConfig,
    navboard: Navboard<C>,
    motors: MotorsStateManager,
    stabilizer: FlightStabilizer,
}

impl Firmware {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let navboard_tty = TtyConnector::new(&config.navboard_tty);
        let motorboard_tty = TtyConnector::new(&config.motorboard_tty);
        Self::with_connectors(config, navboard_tty, &motorboard_tty)
    }
}

impl<C: SerialConnector> Firmware<C> {
    pub fn with_connectors<M: SerialConnector>(
        config: AppConfig,
        navboard_connector: C,
        motorboard_connector: &M,
    ) -> Result<Self, AppError> {
        let start = Instant::now();
        log::info!("Initializing firmware");

        log::debug!("Initializing navboard at TTY: {}", navboard_connector.name());
        let navboard = Navboard::new(
            navboard_connector,
            config.navboard_start_command.clone(),
            config.navboard_checksum.validator(),
        );

        let lap = Instant::now();
        log::debug!("Initializing motorboard at TTY: {}", motorboard_connector.name());
        let motors = MotorsStateManager::open(motorboard_connector, config.motorboard_frequency_hz)
            .map_err(|err| {
                log::error!("Could not initialize motorboard: {err}");
                err
            })?;
        log::debug!("Initialized motorboard, took: {:?}", lap.elapsed());

        let stabilizer = FlightStabilizer::new(&config);
        log::info!("Initialized firmware, took: {:?}", start.elapsed());
        Ok(Firmware {
            config,
            navboard,
            motors,
            stabilizer,
        })
    }

    pub fn motors(&self) -> &MotorsStateManager {
        &self.motors
    }

    pub fn navboard(&self) -> &Navboard<C> {
        &self.navboard
    }

    /// Calibrates the navboard and flies until shutdown or sensor loss.
    pub fn run(
        &mut self,
        input: &'static AtomicControllerInput,
        telemetry: &'static AtomicTelemetry,
    ) -> Result<(), AppError> {
        self.calibrate()?;
        self.stabilizer.reset();

        let telemetry_thread = start_telemetry_thread(telemetry, &input.shutdown, TELEMETRY_PERIOD)
            .map_err(|source| AppError::Thread {
                name: "telemetry",
                source,
            })?;

        log::info!("Starting main loop");
        let result = run_flight_loop(
            &mut self.navboard,
            &mut self.stabilizer,
            &self.motors,
            input,
            telemetry,
            self.config.max_consecutive_sensor_failures,
        );

        input.shutdown.store(true, Ordering::Release);
        telemetry_thread.thread().unpark();
        if telemetry_thread.join().is_err() {
            log::error!("Telemetry thread panicked");
        }
        result.map_err(AppError::from)
    }

    /// Stops the motors and the motorboard flush loop.
    pub fn shutdown(&self) {
        log::info!("Shutting down firmware");
        if let Err(err) = self.motors.set_speeds([0.0; MOTOR_COUNT]) {
            log::error!("Failed to stop motors. err={err}");
        }
        self.motors.shutdown();
    }

    fn calibrate(&mut self) -> Result<(), AppError> {
        let attempts = self.config.calibration_attempts;
        for attempt in 1..=attempts {
            log::info!("Calibrating navboard, attempt {attempt}/{attempts}");
            match self.navboard.calibrate() {
                Ok(()) => {
                    log::info!("Calibrated navboard: {:?}", self.navboard.calibration());
                    return Ok(());
                }
                Err(err @ CalibrationError::NoisyInput { .. }) if attempt < attempts => {
                    log::warn!("Calibration rejected, keep the vehicle still. err={err}");
                }
                Err(err) => {
                    log::error!("Could not calibrate navboard: {err}");
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }
}
