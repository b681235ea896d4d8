use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use thiserror::Error;

pub mod checksum;

use checksum::FrameChecksum;

/// Size in bytes of one navboard frame, checksum included.
pub const FRAME_SIZE: usize = 58;
/// The checksum is the last field of the frame.
pub const CHECKSUM_OFFSET: usize = FRAME_SIZE - 2;

// Byte offsets of the inertial fields.
pub const SEQ_OFFSET: usize = 0;
pub const AX_OFFSET: usize = 2;
pub const AY_OFFSET: usize = 4;
pub const AZ_OFFSET: usize = 6;
pub const GX_OFFSET: usize = 8;
pub const GY_OFFSET: usize = 10;
pub const GZ_OFFSET: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("incomplete navboard frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("navboard frame checksum mismatch: frame says {expected:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { expected: u16, computed: u16 },
}

/// The six inertial axes, in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImuAxis {
    Ax,
    Ay,
    Az,
    Gx,
    Gy,
    Gz,
}

impl ImuAxis {
    pub const ALL: [ImuAxis; 6] = [
        ImuAxis::Ax,
        ImuAxis::Ay,
        ImuAxis::Az,
        ImuAxis::Gx,
        ImuAxis::Gy,
        ImuAxis::Gz,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ImuAxis::Ax => "Ax",
            ImuAxis::Ay => "Ay",
            ImuAxis::Az => "Az",
            ImuAxis::Gx => "Gx",
            ImuAxis::Gy => "Gy",
            ImuAxis::Gz => "Gz",
        }
    }
}

impl std::fmt::Display for ImuAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One raw telemetry record from the navboard. All fields are little-endian
/// on the wire, in declaration order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavboardFrame {
    pub seq: u16,

    // Accelerometers
    pub ax: i16,
    pub ay: i16,
    pub az: i16,

    // Gyroscopes
    pub gx: i16,
    pub gy: i16,
    pub gz: i16,

    pub temperature_acc: u16,
    pub temperature_gyro: u16,

    pub ultrasound: u16,
    pub us_debut_echo: u16,
    pub us_fin_echo: u16,
    pub us_association_echo: u16,
    pub us_distance_echo: u16,
    pub us_curve_time: u16,
    pub us_curve_value: u16,
    pub us_curve_ref: u16,

    pub nb_echo: u16,
    pub sum_echo: u32,
    pub gradient: i16,
    pub flag_echo_ini: u16,

    pub pressure: i32,
    pub temperature_pressure: i16,

    // Magnetometer
    pub mx: i16,
    pub my: i16,
    pub mz: i16,

    pub checksum: u16,
}

impl NavboardFrame {
    /// Decodes the first [`FRAME_SIZE`] bytes of `bytes`.
    pub fn decode(bytes: &[u8], checksum: &dyn FrameChecksum) -> Result<Self, FrameError> {
        if bytes.len() < FRAME_SIZE {
            return Err(FrameError::Truncated {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        let frame_bytes = &bytes[..FRAME_SIZE];
        let frame = Self::read_fields(&mut &frame_bytes[..]).map_err(|_| FrameError::Truncated {
            expected: FRAME_SIZE,
            actual: bytes.len(),
        })?;

        let payload = &frame_bytes[..CHECKSUM_OFFSET];
        if !checksum.verify(payload, frame.checksum) {
            return Err(FrameError::ChecksumMismatch {
                expected: frame.checksum,
                computed: checksum.compute(payload),
            });
        }
        Ok(frame)
    }

    /// Serializes the frame, replacing the stored checksum with the one
    /// computed by `checksum`.
    pub fn encode(&self, checksum: &dyn FrameChecksum) -> [u8; FRAME_SIZE] {
        let mut bytes = [0_u8; FRAME_SIZE];
        let mut writer = &mut bytes[..];
        // The buffer is exactly one frame long, writing the fields cannot run out of space.
        let _ = self.write_fields(&mut writer);
        let sum = checksum.compute(&bytes[..CHECKSUM_OFFSET]);
        bytes[CHECKSUM_OFFSET..].copy_from_slice(&sum.to_le_bytes());
        bytes
    }

    pub fn imu_values(&self) -> [i16; 6] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }

    fn read_fields(reader: &mut impl Read) -> io::Result<Self> {
        Ok(NavboardFrame {
            seq: reader.read_u16::<LittleEndian>()?,
            ax: reader.read_i16::<LittleEndian>()?,
            ay: reader.read_i16::<LittleEndian>()?,
            az: reader.read_i16::<LittleEndian>()?,
            gx: reader.read_i16::<LittleEndian>()?,
            gy: reader.read_i16::<LittleEndian>()?,
            gz: reader.read_i16::<LittleEndian>()?,
            temperature_acc: reader.read_u16::<LittleEndian>()?,
            temperature_gyro: reader.read_u16::<LittleEndian>()?,
            ultrasound: reader.read_u16::<LittleEndian>()?,
            us_debut_echo: reader.read_u16::<LittleEndian>()?,
            us_fin_echo: reader.read_u16::<LittleEndian>()?,
            us_association_echo: reader.read_u16::<LittleEndian>()?,
            us_distance_echo: reader.read_u16::<LittleEndian>()?,
            us_curve_time: reader.read_u16::<LittleEndian>()?,
            us_curve_value: reader.read_u16::<LittleEndian>()?,
            us_curve_ref: reader.read_u16::<LittleEndian>()?,
            nb_echo: reader.read_u16::<LittleEndian>()?,
            sum_echo: reader.read_u32::<LittleEndian>()?,
            gradient: reader.read_i16::<LittleEndian>()?,
            flag_echo_ini: reader.read_u16::<LittleEndian>()?,
            pressure: reader.read_i32::<LittleEndian>()?,
            temperature_pressure: reader.read_i16::<LittleEndian>()?,
            mx: reader.read_i16::<LittleEndian>()?,
            my: reader.read_i16::<LittleEndian>()?,
            mz: reader.read_i16::<LittleEndian>()?,
            checksum: reader.read_u16::<LittleEndian>()?,
        })
    }

    fn write_fields(&self, writer: &mut impl Write) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.seq)?;
        writer.write_i16::<LittleEndian>(self.ax)?;
        writer.write_i16::<LittleEndian>(self.ay)?;
        writer.write_i16::<LittleEndian>(self.az)?;
        writer.write_i16::<LittleEndian>(self.gx)?;
        writer.write_i16::<LittleEndian>(self.gy)?;
        writer.write_i16::<LittleEndian>(self.gz)?;
        writer.write_u16::<LittleEndian>(self.temperature_acc)?;
        writer.write_u16::<LittleEndian>(self.temperature_gyro)?;
        writer.write_u16::<LittleEndian>(self.ultrasound)?;
        writer.write_u16::<LittleEndian>(self.us_debut_echo)?;
        writer.write_u16::<LittleEndian>(self.us_fin_echo)?;
        writer.write_u16::<LittleEndian>(self.us_association_echo)?;
        writer.write_u16::<LittleEndian>(self.us_distance_echo)?;
        writer.write_u16::<LittleEndian>(self.us_curve_time)?;
        writer.write_u16::<LittleEndian>(self.us_curve_value)?;
        writer.write_u16::<LittleEndian>(self.us_curve_ref)?;
        writer.write_u16::<LittleEndian>(self.nb_echo)?;
        writer.write_u32::<LittleEndian>(self.sum_echo)?;
        writer.write_i16::<LittleEndian>(self.gradient)?;
        writer.write_u16::<LittleEndian>(self.flag_echo_ini)?;
        writer.write_i32::<LittleEndian>(self.pressure)?;
        writer.write_i16::<LittleEndian>(self.temperature_pressure)?;
        writer.write_i16::<LittleEndian>(self.mx)?;
        writer.write_i16::<LittleEndian>(self.my)?;
        writer.write_i16::<LittleEndian>(self.mz)?;
        writer.write_u16::<LittleEndian>(self.checksum)
    }
}
