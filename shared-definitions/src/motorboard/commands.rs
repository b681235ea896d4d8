//! Motorboard wire commands.
//!
//! LED command: `011rrrrx xxxggggx`, one red and one green bit per motor.
//! PWM command: `001aaaaa aaaabbbb bbbbbccc cccccccd ddddddd0`, four 9-bit
//! duty values packed back to back after a 3-bit prefix.

use bitfield_struct::bitfield;
use thiserror::Error;

use super::{LedColor, MOTOR_COUNT, PWM_MAX};

pub const LED_COMMAND_SIZE: usize = 2;
pub const PWM_COMMAND_SIZE: usize = 5;

const LED_COMMAND_PREFIX: u8 = 0x60;
const LED_PREFIX_MASK: u8 = 0xe0;
const PWM_COMMAND_PREFIX: u8 = 0x1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unexpected command prefix in byte {0:#04x}")]
    BadPrefix(u8),
    #[error("command needs {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

bitflags::bitflags! {
    /// One bit per motor LED, bit 0 is unused by the board.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LedMask: u8 {
        const MOTOR_1 = 1 << 1;
        const MOTOR_2 = 1 << 2;
        const MOTOR_3 = 1 << 3;
        const MOTOR_4 = 1 << 4;
    }
}

impl LedMask {
    pub fn motor(index: usize) -> Self {
        Self::from_bits_truncate(1 << (index + 1))
    }
}

pub struct LedCommand;

impl LedCommand {
    pub fn encode(colors: &[LedColor; MOTOR_COUNT]) -> [u8; LED_COMMAND_SIZE] {
        let mut red = LedMask::empty();
        let mut green = LedMask::empty();
        for (index, color) in colors.iter().enumerate() {
            if color.has_red() {
                red |= LedMask::motor(index);
            }
            if color.has_green() {
                green |= LedMask::motor(index);
            }
        }
        [LED_COMMAND_PREFIX | red.bits(), green.bits()]
    }

    pub fn decode(bytes: &[u8]) -> Result<[LedColor; MOTOR_COUNT], CommandError> {
        if bytes.len() < LED_COMMAND_SIZE {
            return Err(CommandError::Truncated {
                expected: LED_COMMAND_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] & LED_PREFIX_MASK != LED_COMMAND_PREFIX {
            return Err(CommandError::BadPrefix(bytes[0]));
        }
        let red = LedMask::from_bits_truncate(bytes[0]);
        let green = LedMask::from_bits_truncate(bytes[1]);

        let mut colors = [LedColor::Off; MOTOR_COUNT];
        for (index, color) in colors.iter_mut().enumerate() {
            let motor = LedMask::motor(index);
            *color = LedColor::from_channels(red.contains(motor), green.contains(motor));
        }
        Ok(colors)
    }
}

/// Ordered LSB to MSB, the command lives in the five most significant bytes
/// of the big-endian word.
#[bitfield(u64)]
pub struct PwmCommand {
    #[bits(25)]
    __: u32,
    #[bits(9)]
    pub pwm_4: u16,
    #[bits(9)]
    pub pwm_3: u16,
    #[bits(9)]
    pub pwm_2: u16,
    #[bits(9)]
    pub pwm_1: u16,
    #[bits(3)]
    pub prefix: u8,
}

impl PwmCommand {
    pub fn encode(pwms: &[u16; MOTOR_COUNT]) -> [u8; PWM_COMMAND_SIZE] {
        let command = PwmCommand::new()
            .with_prefix(PWM_COMMAND_PREFIX)
            .with_pwm_1(pwms[0] & PWM_MAX)
            .with_pwm_2(pwms[1] & PWM_MAX)
            .with_pwm_3(pwms[2] & PWM_MAX)
            .with_pwm_4(pwms[3] & PWM_MAX);

        let word = command.into_bits().to_be_bytes();
        let mut bytes = [0_u8; PWM_COMMAND_SIZE];
        bytes.copy_from_slice(&word[..PWM_COMMAND_SIZE]);
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<[u16; MOTOR_COUNT], CommandError> {
        if bytes.len() < PWM_COMMAND_SIZE {
            return Err(CommandError::Truncated {
                expected: PWM_COMMAND_SIZE,
                actual: bytes.len(),
            });
        }
        let mut word = [0_u8; 8];
        word[..PWM_COMMAND_SIZE].copy_from_slice(&bytes[..PWM_COMMAND_SIZE]);
        let command = PwmCommand::from_bits(u64::from_be_bytes(word));
        if command.prefix() != PWM_COMMAND_PREFIX {
            return Err(CommandError::BadPrefix(bytes[0]));
        }
        Ok([
            command.pwm_1(),
            command.pwm_2(),
            command.pwm_3(),
            command.pwm_4(),
        ])
    }
}
