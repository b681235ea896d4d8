pub mod motors_state_manager;
