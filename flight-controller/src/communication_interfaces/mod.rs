pub mod motors_api;
pub mod serial;
