use std::time::Duration;

use super::integrator::Integrator;
use crate::config::store::PidGains;

/// Single axis PID compensator.
///
/// No output clamping or anti-windup happens here, the accumulated error
/// grows for as long as the error persists. Not meant to be shared between
/// threads, every axis owns its own instance.
#[derive(Debug, Clone)]
pub struct PID {
    previous_error: f64,
    proportional_multiplier: f64,
    integral_multiplier: f64,
    derivative_multiplier: f64,
    error_integrator: Integrator,
}

impl PID {
    pub fn new(
        proportional_multiplier: f64,
        integral_multiplier: f64,
        derivative_multiplier: f64,
    ) -> Self {
        PID {
            previous_error: 0.0_f64,
            proportional_multiplier,
            integral_multiplier,
            derivative_multiplier,
            error_integrator: Integrator::new(),
        }
    }

    pub fn from_gains(gains: &PidGains) -> Self {
        Self::new(gains.p, gains.i, gains.d)
    }

    pub fn update(&mut self, actual: f64, desired: f64, dt: Duration) -> f64 {
        let iteration_length = dt.as_secs_f64();
        let error = desired - actual;
        let current_accumulated_error = self
            .error_integrator
            .add_new_value(error, iteration_length);

        let change_rate = if iteration_length > 0.0 {
            (error - self.previous_error) / iteration_length
        } else {
            0.0
        };
        self.previous_error = error;

        let proportional_output = error * self.proportional_multiplier;
        let integral_output = current_accumulated_error * self.integral_multiplier;
        let derivative_output = change_rate * self.derivative_multiplier;

        proportional_output + integral_output + derivative_output
    }

    pub fn accumulated_error(&self) -> f64 {
        self.error_integrator.get_current_value()
    }

    /// Forgets the accumulated and previous error.
    pub fn reset(&mut self) {
        self.error_integrator.reset();
        self.previous_error = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn proportional_only() {
        let mut pid = PID::new(2.0, 0.0, 0.0);
        assert!(close(pid.update(1.0, 4.0, TICK), 6.0));
        assert!(close(pid.update(5.0, 4.0, TICK), -2.0));
    }

    #[test]
    fn integral_accumulates_error_times_dt() {
        let mut pid = PID::new(0.0, 1.0, 0.0);
        assert!(close(pid.update(0.0, 1.0, TICK), 0.1));
        assert!(close(pid.update(0.0, 1.0, TICK), 0.2));
        assert!(close(pid.update(0.0, 3.0, TICK), 0.5));
        assert!(close(pid.accumulated_error(), 0.5));
    }

    #[test]
    fn derivative_uses_change_of_error() {
        let mut pid = PID::new(0.0, 0.0, 1.0);
        // previous error starts at zero
        assert!(close(pid.update(0.0, 1.0, TICK), 10.0));
        assert!(close(pid.update(0.0, 1.0, TICK), 0.0));
        assert!(close(pid.update(0.0, 0.5, TICK), -5.0));
    }

    #[test]
    fn zero_dt_has_no_derivative() {
        let mut pid = PID::new(1.0, 1.0, 1.0);
        let output = pid.update(0.0, 2.0, Duration::ZERO);
        assert!(output.is_finite());
        assert!(close(output, 2.0));
    }

    #[test]
    fn integral_is_unbounded() {
        let mut pid = PID::new(0.0, 1.0, 0.0);
        for _ in 0..10_000 {
            pid.update(0.0, 1.0, Duration::from_secs(1));
        }
        assert!(close(pid.accumulated_error(), 10_000.0));
    }

    #[test]
    fn reset_clears_state() {
        let mut pid = PID::new(1.0, 1.0, 1.0);
        pid.update(0.0, 3.0, TICK);
        pid.reset();
        assert!(close(pid.accumulated_error(), 0.0));
        let mut fresh = PID::new(1.0, 1.0, 1.0);
        assert!(close(pid.update(0.0, 1.0, TICK), fresh.update(0.0, 1.0, TICK)));
    }
}
