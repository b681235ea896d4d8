/// One dimensional Kalman filter, predicting with a rate input and
/// correcting with a direct measurement of the state.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    state_prediction: f64,
    prediction_uncertainty: f64,
    input_variance: f64,
    measurement_uncertainty: f64,
}

impl KalmanFilter {
    pub fn new(input_variance: f64, measurement_uncertainty: f64) -> Self {
        KalmanFilter {
            input_variance,
            measurement_uncertainty,
            state_prediction: 0.0_f64,
            prediction_uncertainty: 0.0_f64,
        }
    }

    pub fn get_next_state_prediction(
        &mut self,
        current_rate: f64,
        measured_value: f64,
        t_interval_seconds: f64,
    ) -> f64 {
        let mut state_prediction = self.state_prediction + t_interval_seconds * current_rate;

        let mut prediction_uncertainty = self.prediction_uncertainty
            + t_interval_seconds.powi(2) * self.input_variance.powi(2);

        let kalman_gain = prediction_uncertainty
            / (prediction_uncertainty + self.measurement_uncertainty.powi(2));

        state_prediction += kalman_gain * (measured_value - state_prediction);
        prediction_uncertainty *= 1.0_f64 - kalman_gain;

        self.state_prediction = state_prediction;
        self.prediction_uncertainty = prediction_uncertainty;

        self.state_prediction
    }

    pub fn get_current_state_prediction(&self) -> f64 {
        self.state_prediction
    }

    pub fn get_current_uncertainty(&self) -> f64 {
        self.prediction_uncertainty
    }

    pub fn reset(&mut self, state: f64) {
        self.state_prediction = state;
        self.prediction_uncertainty = 0.0;
    }
}
