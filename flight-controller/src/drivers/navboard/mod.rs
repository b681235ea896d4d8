use std::io::{Read, Write};

use shared_definitions::navboard::{checksum::FrameChecksum, NavboardFrame, FRAME_SIZE};

pub mod calibration;

use calibration::{CalibrationVectors, RawSampleSource};

use crate::{
    communication_interfaces::serial::{SerialConnector, TtyConnector},
    util::{
        error::{CalibrationError, SensorError},
        vectors::ImuVector,
    },
};

/// A decoded frame together with its calibrated inertial values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavboardSample {
    pub raw: NavboardFrame,
    pub data: ImuVector,
}

/// Sensor board driver.
///
/// The tty is opened lazily and closed again after any failed read, so the
/// next call starts from a fresh connection. Not meant for concurrent use,
/// the control loop is the only reader.
pub struct Navboard<C: SerialConnector = TtyConnector> {
    connector: C,
    port: Option<C::Port>,
    start_command: Vec<u8>,
    checksum: Box<dyn FrameChecksum>,
    calibration: CalibrationVectors,
}

impl<C: SerialConnector> Navboard<C> {
    pub fn new(connector: C, start_command: Vec<u8>, checksum: Box<dyn FrameChecksum>) -> Self {
        Navboard {
            connector,
            port: None,
            start_command,
            checksum,
            calibration: CalibrationVectors::default(),
        }
    }

    pub fn next_sample(&mut self) -> Result<NavboardSample, SensorError> {
        let result = self.read_sample();
        if let Err(err) = &result {
            log::error!("Failed to read data. err={err}");
            self.close();
        }
        result
    }

    pub fn calibrate(&mut self) -> Result<(), CalibrationError> {
        let vectors = calibration::calibrate(self)?;
        self.set_calibration(vectors);
        Ok(())
    }

    pub fn calibration(&self) -> CalibrationVectors {
        self.calibration
    }

    pub fn set_calibration(&mut self, vectors: CalibrationVectors) {
        self.calibration = vectors;
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Drops the connection, a no-op when it is not open.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            log::debug!("Closing tty={}", self.connector.name());
        }
    }

    fn read_sample(&mut self) -> Result<NavboardSample, SensorError> {
        let mut buffer = [0_u8; FRAME_SIZE];
        self.open()?.read_exact(&mut buffer)?;

        let raw = NavboardFrame::decode(&buffer, self.checksum.as_ref())?;
        let data = self.calibration.apply(ImuVector::from_raw(raw.imu_values()));
        Ok(NavboardSample { raw, data })
    }

    fn open(&mut self) -> Result<&mut C::Port, SensorError> {
        let port = match self.port.take() {
            Some(port) => port,
            None => self.connect()?,
        };
        Ok(self.port.insert(port))
    }

    fn connect(&self) -> Result<C::Port, SensorError> {
        log::info!("Opening tty={}", self.connector.name());
        let mut port = self.connector.open().map_err(|err| {
            log::error!("Could not open tty. tty={} err={err}", self.connector.name());
            err
        })?;
        log::debug!("Writing start command");
        port.write_all(&self.start_command)?;
        port.flush()?;
        log::debug!("Opened tty={}", self.connector.name());
        Ok(port)
    }
}

impl<C: SerialConnector> RawSampleSource for Navboard<C> {
    fn next_raw(&mut self) -> Result<[i16; 6], SensorError> {
        Ok(self.next_sample()?.raw.imu_values())
    }
}
