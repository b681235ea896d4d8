use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::shared_core_values::AtomicTelemetry;

/// Periodically logs the flight loop telemetry until `shutdown` is set.
pub fn start_telemetry_thread(
    telemetry_data: &'static AtomicTelemetry,
    shutdown: &'static AtomicBool,
    period: Duration,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("telemetry".to_string())
        .spawn(move || {
            while !shutdown.load(Ordering::Acquire) {
                log::info!(
                    "Iteration Time: {}us Sequence: {} Sensor failures: {} Placement: {:?} Motor: {:?}",
                    telemetry_data.loop_exec_time_us.load(Ordering::Relaxed),
                    telemetry_data.last_sequence.load(Ordering::Relaxed),
                    telemetry_data.sensor_failures.load(Ordering::Relaxed),
                    telemetry_data.estimated.read(),
                    telemetry_data.motor_power(),
                );
                let deadline = Instant::now() + period;
                while !shutdown.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::park_timeout(deadline - now);
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_stops_on_shutdown() {
        let telemetry: &'static AtomicTelemetry = Box::leak(Box::new(AtomicTelemetry::new()));
        let shutdown: &'static AtomicBool = Box::leak(Box::new(AtomicBool::new(false)));

        let handle = start_telemetry_thread(telemetry, shutdown, Duration::from_secs(60)).unwrap();
        shutdown.store(true, Ordering::Release);
        handle.thread().unpark();
        handle.join().unwrap();
    }
}
