use std::time::Instant;

use once_cell::sync::Lazy;

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Instant of the first call, made by the logger when it is installed.
pub fn process_start() -> Instant {
    *PROCESS_START
}
