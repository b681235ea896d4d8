use serde::{Deserialize, Serialize};

/// Attitude/altitude vector, used both as a setpoint and as an estimate.
/// Angles are radians, altitude is metres.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
    pub altitude: f64,
}

impl Placement {
    pub const fn new(pitch: f64, roll: f64, yaw: f64, altitude: f64) -> Self {
        Placement {
            pitch,
            roll,
            yaw,
            altitude,
        }
    }
}
