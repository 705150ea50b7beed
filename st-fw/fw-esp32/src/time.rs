//! Millisecond clock over the embassy time driver.

use embassy_time::Instant;
use st_shared::TimeProvider;

/// Monotonic clock since boot.
#[derive(Clone, Copy, Default)]
pub struct Esp32Time;

impl Esp32Time {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for Esp32Time {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
