use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use shared_definitions::motorboard::{
    commands::{LedCommand, PwmCommand},
    pwm_of, speed_of, LedColor, MOTOR_COUNT,
};

use crate::{communication_interfaces::serial::SerialConnector, util::error::ActuatorError};

#[derive(Debug, Default)]
struct MotorsState {
    pwms: [u16; MOTOR_COUNT],
    leds: [LedColor; MOTOR_COUNT],
    /// Cleared by the flush loop while it only holds the read lock.
    leds_changed: AtomicBool,
}

impl MotorsState {
    fn flush(&self, port: &mut impl Write) -> io::Result<()> {
        port.write_all(&PwmCommand::encode(&self.pwms))?;
        if self.leds_changed.load(Ordering::Acquire) {
            port.write_all(&LedCommand::encode(&self.leds))?;
            self.leds_changed.store(false, Ordering::Release);
        }
        Ok(())
    }
}

/// Motorboard driver.
///
/// Speeds and LED colors live behind a reader/writer lock. A background
/// thread writes the PWM state to the board every period and the LED state
/// whenever it changed, until [`MotorsStateManager::shutdown`] is called.
pub struct MotorsStateManager {
    state: Arc<RwLock<MotorsState>>,
    shutdown: Arc<AtomicBool>,
    flush_thread: Mutex<Option<JoinHandle<()>>>,
}

impl MotorsStateManager {
    pub fn open<C: SerialConnector>(
        connector: &C,
        frequency_hz: u32,
    ) -> Result<Self, ActuatorError> {
        log::info!("Opening motorboard tty={}", connector.name());
        let port = connector.open()?;
        Self::start(port, frequency_hz)
    }

    pub fn start<W: Write + Send + 'static>(
        port: W,
        frequency_hz: u32,
    ) -> Result<Self, ActuatorError> {
        let state = Arc::new(RwLock::new(MotorsState::default()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs(1) / frequency_hz.max(1);

        let flush_thread = {
            let state = state.clone();
            let shutdown = shutdown.clone();
            thread::Builder::new()
                .name("motorboard-flush".to_string())
                .spawn(move || flush_loop(port, &state, &shutdown, period))?
        };
        log::debug!("Started motorboard flush loop at {frequency_hz}Hz");

        Ok(MotorsStateManager {
            state,
            shutdown,
            flush_thread: Mutex::new(Some(flush_thread)),
        })
    }

    pub fn motor_count(&self) -> usize {
        MOTOR_COUNT
    }

    pub fn speed(&self, motor_id: usize) -> Result<f64, ActuatorError> {
        let state = self.read_state();
        let pwm = state
            .pwms
            .get(motor_id)
            .ok_or(ActuatorError::UnknownMotor(motor_id))?;
        Ok(speed_of(*pwm))
    }

    pub fn speeds(&self) -> [f64; MOTOR_COUNT] {
        self.read_state().pwms.map(speed_of)
    }

    pub fn set_speed(&self, motor_id: usize, speed: f64) -> Result<(), ActuatorError> {
        if motor_id >= MOTOR_COUNT {
            return Err(ActuatorError::UnknownMotor(motor_id));
        }
        let pwm = pwm_of(speed).ok_or(ActuatorError::SpeedOutOfRange(speed))?;
        self.write_state().pwms[motor_id] = pwm;
        Ok(())
    }

    /// Sets all four motors at once, or none of them if any speed is invalid.
    pub fn set_speeds(&self, speeds: [f64; MOTOR_COUNT]) -> Result<(), ActuatorError> {
        let mut pwms = [0_u16; MOTOR_COUNT];
        for (pwm, speed) in pwms.iter_mut().zip(speeds) {
            *pwm = pwm_of(speed).ok_or(ActuatorError::SpeedOutOfRange(speed))?;
        }
        self.write_state().pwms = pwms;
        Ok(())
    }

    pub fn leds(&self) -> [LedColor; MOTOR_COUNT] {
        self.read_state().leds
    }

    pub fn set_led(&self, motor_id: usize, color: LedColor) -> Result<(), ActuatorError> {
        if motor_id >= MOTOR_COUNT {
            return Err(ActuatorError::UnknownMotor(motor_id));
        }
        let mut state = self.write_state();
        state.leds[motor_id] = color;
        state.leds_changed.store(true, Ordering::Release);
        Ok(())
    }

    /// Copies as many colors as there are motors, extra entries are ignored.
    pub fn set_leds(&self, colors: &[LedColor]) {
        let mut state = self.write_state();
        for (led, color) in state.leds.iter_mut().zip(colors) {
            *led = *color;
        }
        state.leds_changed.store(true, Ordering::Release);
    }

    /// Stops the flush loop after one last write of the current state.
    pub fn shutdown(&self) {
        let handle = self
            .flush_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            self.shutdown.store(true, Ordering::Release);
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("Motorboard flush thread panicked");
            }
            log::debug!("Stopped motorboard flush loop");
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, MotorsState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, MotorsState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MotorsStateManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn flush_loop<W: Write>(
    mut port: W,
    state: &RwLock<MotorsState>,
    shutdown: &AtomicBool,
    period: Duration,
) {
    let flush = |port: &mut W| {
        let state = state.read().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = state.flush(port) {
            log::error!("Failed to update motorboard. err={err}");
        }
    };

    while !shutdown.load(Ordering::Acquire) {
        let deadline = Instant::now() + period;
        flush(&mut port);

        // A slow tick leaves nothing to wait for and the next one starts at once.
        loop {
            let now = Instant::now();
            if now >= deadline || shutdown.load(Ordering::Acquire) {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
    flush(&mut port);
}

#[cfg(test)]
mod tests {
    use shared_definitions::motorboard::{
        commands::{LED_COMMAND_SIZE, PWM_COMMAND_SIZE},
        PWM_MAX,
    };

    use super::*;
    use crate::communication_interfaces::serial::mock::MockSerial;

    enum Command {
        Pwm([u16; MOTOR_COUNT]),
        Led([LedColor; MOTOR_COUNT]),
    }

    fn parse_commands(mut bytes: &[u8]) -> Vec<Command> {
        let mut commands = Vec::new();
        while !bytes.is_empty() {
            if bytes[0] & 0xe0 == 0x60 {
                commands.push(Command::Led(LedCommand::decode(bytes).unwrap()));
                bytes = &bytes[LED_COMMAND_SIZE..];
            } else {
                commands.push(Command::Pwm(PwmCommand::decode(bytes).unwrap()));
                bytes = &bytes[PWM_COMMAND_SIZE..];
            }
        }
        commands
    }

    fn wait_for(serial: &MockSerial, mut done: impl FnMut(&[Command]) -> bool) -> Vec<Command> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let commands = parse_commands(&serial.tx_buffer());
            if done(&commands) {
                return commands;
            }
            assert!(Instant::now() < deadline, "motorboard never wrote the expected commands");
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn manager(serial: &MockSerial) -> MotorsStateManager {
        MotorsStateManager::open(serial, 200).unwrap()
    }

    #[test]
    fn speed_reads_back_within_one_pwm_step() {
        let serial = MockSerial::new();
        let motors = manager(&serial);
        motors.set_speed(0, 0.5).unwrap();
        assert!((motors.speed(0).unwrap() - 0.5).abs() <= 1.0 / PWM_MAX as f64);
        assert_eq!(motors.speed(1).unwrap(), 0.0);
        assert_eq!(motors.motor_count(), 4);
    }

    #[test]
    fn unknown_motor_is_rejected_without_side_effects() {
        let serial = MockSerial::new();
        let motors = manager(&serial);
        motors.set_speed(2, 0.25).unwrap();
        let before = motors.speeds();

        assert!(matches!(
            motors.set_speed(5, 0.5),
            Err(ActuatorError::UnknownMotor(5))
        ));
        assert!(matches!(motors.speed(4), Err(ActuatorError::UnknownMotor(4))));
        assert!(matches!(
            motors.set_led(4, LedColor::Red),
            Err(ActuatorError::UnknownMotor(4))
        ));
        assert_eq!(motors.speeds(), before);
    }

    #[test]
    fn out_of_range_speeds_fail_instead_of_clamping() {
        let serial = MockSerial::new();
        let motors = manager(&serial);
        assert!(matches!(
            motors.set_speed(0, 1.2),
            Err(ActuatorError::SpeedOutOfRange(_))
        ));
        assert!(matches!(
            motors.set_speed(0, -0.1),
            Err(ActuatorError::SpeedOutOfRange(_))
        ));
        assert!(motors.set_speeds([0.1, 0.2, f64::NAN, 0.4]).is_err());
        assert_eq!(motors.speeds(), [0.0; 4]);

        motors.set_speeds([0.0, 1.0, 0.5, 0.25]).unwrap();
        assert_eq!(motors.speed(1).unwrap(), 1.0);
    }

    #[test]
    fn flush_loop_writes_current_pwms() {
        let serial = MockSerial::new();
        let motors = manager(&serial);
        motors.set_speeds([1.0, 0.5, 0.0, 0.25]).unwrap();

        let expected = [PWM_MAX, 256, 0, 128];
        wait_for(&serial, |commands| {
            commands
                .iter()
                .any(|command| matches!(command, Command::Pwm(pwms) if *pwms == expected))
        });
    }

    #[test]
    fn leds_are_written_only_after_a_change() {
        let serial = MockSerial::new();
        let motors = manager(&serial);
        let pwm_count = |commands: &[Command]| {
            commands
                .iter()
                .filter(|command| matches!(command, Command::Pwm(_)))
                .count()
        };
        let commands = wait_for(&serial, |commands| pwm_count(commands) >= 3);
        assert!(commands.iter().all(|command| matches!(command, Command::Pwm(_))));

        let expected = [LedColor::Green, LedColor::Red, LedColor::Off, LedColor::Orange];
        motors.set_leds(&expected);

        let commands = wait_for(&serial, |commands| {
            match commands
                .iter()
                .position(|command| matches!(command, Command::Led(_)))
            {
                Some(led_at) => pwm_count(&commands[led_at..]) >= 3,
                None => false,
            }
        });
        let leds: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                Command::Led(colors) => Some(*colors),
                Command::Pwm(_) => None,
            })
            .collect();
        assert_eq!(leds, vec![expected]);
        assert_eq!(motors.leds(), expected);
    }

    #[test]
    fn set_leds_ignores_extra_colors() {
        let serial = MockSerial::new();
        let motors = manager(&serial);
        motors.set_leds(&[LedColor::Red; 6]);
        assert_eq!(motors.leds(), [LedColor::Red; 4]);

        motors.set_leds(&[LedColor::Green]);
        assert_eq!(
            motors.leds(),
            [LedColor::Green, LedColor::Red, LedColor::Red, LedColor::Red]
        );
    }

    #[test]
    fn write_failures_do_not_stop_the_loop() {
        let serial = MockSerial::new();
        serial.fail_next_writes(3);
        let motors = manager(&serial);
        motors.set_speed(3, 1.0).unwrap();
        wait_for(&serial, |commands| {
            commands
                .iter()
                .any(|command| matches!(command, Command::Pwm(pwms) if pwms[3] == PWM_MAX))
        });
    }

    #[test]
    fn shutdown_writes_final_state_and_stops() {
        let serial = MockSerial::new();
        let motors = manager(&serial);
        motors.set_speeds([0.5; 4]).unwrap();
        motors.set_speeds([0.0; 4]).unwrap();
        motors.shutdown();

        let written = serial.tx_buffer();
        let commands = parse_commands(&written);
        assert!(matches!(commands.last(), Some(Command::Pwm(pwms)) if *pwms == [0; 4]));

        thread::sleep(Duration::from_millis(30));
        assert_eq!(serial.tx_buffer().len(), written.len());
        motors.shutdown();
    }

    #[test]
    fn flush_sends_led_command_once() {
        let state = MotorsState::default();
        state.leds_changed.store(true, Ordering::Release);
        let mut port = Vec::new();
        state.flush(&mut port).unwrap();
        assert_eq!(port.len(), PWM_COMMAND_SIZE + LED_COMMAND_SIZE);

        port.clear();
        state.flush(&mut port).unwrap();
        assert_eq!(port, PwmCommand::encode(&[0; 4]).to_vec());
    }

    #[test]
    fn flush_loop_keeps_the_configured_rate() {
        let serial = MockSerial::new();
        let motors = MotorsStateManager::open(&serial, 20).unwrap();
        thread::sleep(Duration::from_secs(1));
        motors.shutdown();

        let ticks = parse_commands(&serial.tx_buffer())
            .iter()
            .filter(|command| matches!(command, Command::Pwm(_)))
            .count();
        assert!((18..=23).contains(&ticks), "{ticks} writes in one second at 20Hz");
    }

    /// Writer that takes longer than a 20Hz tick for every write.
    struct SlowPort {
        writes: Arc<Mutex<Vec<Instant>>>,
        delay: Duration,
    }

    impl Write for SlowPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.lock().unwrap().push(Instant::now());
            thread::sleep(self.delay);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn slow_ticks_run_back_to_back() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let port = SlowPort {
            writes: writes.clone(),
            delay: Duration::from_millis(100),
        };
        let motors = MotorsStateManager::start(port, 20).unwrap();
        thread::sleep(Duration::from_secs(1));
        motors.shutdown();

        let writes = writes.lock().unwrap();
        assert!(writes.len() >= 8, "only {} writes", writes.len());
        let gaps: Vec<Duration> = writes
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();
        let average = gaps.iter().sum::<Duration>() / gaps.len() as u32;
        // A 50ms sleep after each 100ms write would push the gap to 150ms.
        assert!(average < Duration::from_millis(130), "average gap {average:?}");
    }
}
