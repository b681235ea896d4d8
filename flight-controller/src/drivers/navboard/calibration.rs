use shared_definitions::navboard::ImuAxis;

use crate::{
    config::constants::{CALIBRATION_MAX_STDEV, CALIBRATION_READ_RETRIES, CALIBRATION_SAMPLES},
    util::{
        error::{CalibrationError, SensorError},
        vectors::ImuVector,
    },
};

/// Offset and gain corrections, applied as `(raw - offsets) / gains`.
/// Always replaced as a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationVectors {
    pub offsets: ImuVector,
    pub gains: ImuVector,
}

impl Default for CalibrationVectors {
    fn default() -> Self {
        CalibrationVectors {
            offsets: ImuVector::splat(0.0),
            gains: ImuVector::splat(1.0),
        }
    }
}

impl CalibrationVectors {
    pub fn apply(&self, raw: ImuVector) -> ImuVector {
        (raw - self.offsets) / self.gains
    }
}

/// Anything that yields raw inertial readings, in [`ImuAxis`] order.
pub trait RawSampleSource {
    fn next_raw(&mut self) -> Result<[i16; 6], SensorError>;
}

/// Samples the resting vehicle and derives its calibration vectors.
///
/// Read failures are retried from a budget shared by the whole run. The
/// vehicle must sit on a level floor: Az is assumed to measure exactly 1g.
pub fn calibrate(
    source: &mut impl RawSampleSource,
) -> Result<CalibrationVectors, CalibrationError> {
    let mut samples: Vec<ImuVector> = Vec::with_capacity(CALIBRATION_SAMPLES);
    let mut retries = CALIBRATION_READ_RETRIES;

    while samples.len() < CALIBRATION_SAMPLES {
        match source.next_raw() {
            Ok(values) => samples.push(ImuVector::from_raw(values)),
            Err(err) => {
                if retries == 0 {
                    return Err(CalibrationError::Read(err));
                }
                retries -= 1;
                log::debug!("calibration read failed, {retries} retries left: {err}");
            }
        }
    }

    let count = samples.len() as f64;
    let mut means = ImuVector::default();
    for sample in &samples {
        for axis in ImuAxis::ALL {
            means[axis] += sample[axis];
        }
    }
    for axis in ImuAxis::ALL {
        means[axis] /= count;
    }

    let mut stdevs = ImuVector::default();
    for sample in &samples {
        for axis in ImuAxis::ALL {
            stdevs[axis] += (sample[axis] - means[axis]).powi(2);
        }
    }
    for axis in ImuAxis::ALL {
        stdevs[axis] = (stdevs[axis] / count).sqrt();
    }

    log::debug!("calibration means: {means:?}");
    log::debug!("calibration stdevs: {stdevs:?}");

    for axis in ImuAxis::ALL {
        if stdevs[axis] > CALIBRATION_MAX_STDEV {
            return Err(CalibrationError::NoisyInput {
                axis,
                stdev: stdevs[axis],
            });
        }
    }

    // One gain for all three accelerometers, measured against 1g on Az.
    let accel_gain = means.az - (means.ax + means.ay) / 2.0;
    // Applying a zero or negative gain would divide by zero or flip the axes.
    if accel_gain <= 0.0 {
        return Err(CalibrationError::NonPositiveGain(accel_gain));
    }
    let mut offsets = means;
    offsets.az -= accel_gain;

    // TODO: measure gyroscope gains, they are assumed to be 1 for now.
    let gains = ImuVector {
        ax: accel_gain,
        ay: accel_gain,
        az: accel_gain,
        gx: 1.0,
        gy: 1.0,
        gz: 1.0,
    };

    let vectors = CalibrationVectors { offsets, gains };
    log::debug!("calibration offsets: {:?}", vectors.offsets);
    log::debug!("calibration gains: {:?}", vectors.gains);
    Ok(vectors)
}
