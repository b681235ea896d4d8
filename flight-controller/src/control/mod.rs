pub mod attitude_estimator;
pub mod attitude_mixer;
pub mod control_loops;
pub mod integrator;
pub mod kalman_filter;
pub mod pid;
