use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};

use shared_definitions::{controller::Placement, motorboard::MOTOR_COUNT};

/// Lock-free holder of a [`Placement`], each field stored as its `f64` bits.
pub struct AtomicPlacement {
    pitch: AtomicU64,
    roll: AtomicU64,
    yaw: AtomicU64,
    altitude: AtomicU64,
}

impl AtomicPlacement {
    pub const fn new() -> Self {
        // 0.0_f64 has the all-zero bit pattern.
        Self {
            pitch: AtomicU64::new(0),
            roll: AtomicU64::new(0),
            yaw: AtomicU64::new(0),
            altitude: AtomicU64::new(0),
        }
    }

    pub fn store(&self, placement: Placement) {
        self.pitch.store(placement.pitch.to_bits(), Ordering::Release);
        self.roll.store(placement.roll.to_bits(), Ordering::Release);
        self.yaw.store(placement.yaw.to_bits(), Ordering::Release);
        self.altitude
            .store(placement.altitude.to_bits(), Ordering::Release);
    }

    pub fn read(&self) -> Placement {
        Placement {
            pitch: f64::from_bits(self.pitch.load(Ordering::Acquire)),
            roll: f64::from_bits(self.roll.load(Ordering::Acquire)),
            yaw: f64::from_bits(self.yaw.load(Ordering::Acquire)),
            altitude: f64::from_bits(self.altitude.load(Ordering::Acquire)),
        }
    }
}

impl Default for AtomicPlacement {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AtomicControllerInput {
    pub desired: AtomicPlacement,
    pub kill_motors: AtomicBool,
    pub shutdown: AtomicBool,
}

impl AtomicControllerInput {
    pub const fn new() -> Self {
        AtomicControllerInput {
            desired: AtomicPlacement::new(),
            kill_motors: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }
}

impl Default for AtomicControllerInput {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AtomicTelemetry {
    pub loop_exec_time_us: AtomicU64,
    pub last_sequence: AtomicU16,
    pub sensor_failures: AtomicU32,
    pub estimated: AtomicPlacement,
    pub motor_power: [AtomicU16; MOTOR_COUNT],
}

impl AtomicTelemetry {
    pub const fn new() -> Self {
        AtomicTelemetry {
            loop_exec_time_us: AtomicU64::new(0),
            last_sequence: AtomicU16::new(0),
            sensor_failures: AtomicU32::new(0),
            estimated: AtomicPlacement::new(),
            motor_power: [
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
            ],
        }
    }

    pub fn motor_power(&self) -> [u16; MOTOR_COUNT] {
        [0, 1, 2, 3].map(|index| self.motor_power[index].load(Ordering::Relaxed))
    }
}

impl Default for AtomicTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

pub static INPUT_SHARED: AtomicControllerInput = AtomicControllerInput::new();
pub static TELEMETRY_SHARED: AtomicTelemetry = AtomicTelemetry::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_round_trips_exactly() {
        let shared = AtomicPlacement::new();
        assert_eq!(shared.read(), Placement::default());

        let placement = Placement::new(-0.125, 0.3, 1.0e-9, 0.75);
        shared.store(placement);
        assert_eq!(shared.read(), placement);
    }
}
