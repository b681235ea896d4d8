use serde::{Deserialize, Serialize};

pub mod commands;

pub const MOTOR_COUNT: usize = 4;
/// Largest duty value that fits the 9-bit PWM field.
pub const PWM_MAX: u16 = 511;

#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedColor {
    #[default]
    Off = 0,
    Red = 1,
    Green = 2,
    Orange = 3,
}

impl LedColor {
    pub fn has_red(self) -> bool {
        matches!(self, LedColor::Red | LedColor::Orange)
    }

    pub fn has_green(self) -> bool {
        matches!(self, LedColor::Green | LedColor::Orange)
    }

    pub fn from_channels(red: bool, green: bool) -> Self {
        match (red, green) {
            (false, false) => LedColor::Off,
            (true, false) => LedColor::Red,
            (false, true) => LedColor::Green,
            (true, true) => LedColor::Orange,
        }
    }
}

/// Converts a motor speed fraction into a PWM duty value.
///
/// Returns `None` for NaN or anything outside `[0, 1]`, the duty value is
/// never wrapped or clamped here.
pub fn pwm_of(speed: f64) -> Option<u16> {
    if !(0.0..=1.0).contains(&speed) {
        return None;
    }
    Some((speed * PWM_MAX as f64).round() as u16)
}

pub fn speed_of(pwm: u16) -> f64 {
    pwm as f64 / PWM_MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pwm_of_covers_the_full_range() {
        assert_eq!(pwm_of(0.0), Some(0));
        assert_eq!(pwm_of(1.0), Some(PWM_MAX));
        assert_eq!(pwm_of(0.5), Some(256));
    }

    #[test]
    fn pwm_of_rejects_out_of_range_speeds() {
        assert_eq!(pwm_of(-0.01), None);
        assert_eq!(pwm_of(1.01), None);
        assert_eq!(pwm_of(f64::NAN), None);
    }

    #[test]
    fn pwm_survives_a_trip_through_speed() {
        let mut speed = 0.0;
        while speed <= 1.0 {
            let pwm = pwm_of(speed).unwrap();
            assert_eq!(pwm_of(speed_of(pwm)), Some(pwm));
            assert!((speed_of(pwm) - speed).abs() <= 1.0 / PWM_MAX as f64);
            speed += 0.0037;
        }
    }

    #[test]
    fn led_channels_match_colors() {
        for color in [LedColor::Off, LedColor::Red, LedColor::Green, LedColor::Orange] {
            assert_eq!(
                LedColor::from_channels(color.has_red(), color.has_green()),
                color
            );
        }
    }
}
