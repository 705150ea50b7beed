//! Engine loop for the ESP32 firmware.
//!
//! Drives the whole synchronization layer at a fixed cadence: dispatch
//! inbound envelopes, tick every value's timer and debounce deadline, and
//! yield back to the I/O tasks.

use embassy_time::{Duration, Timer};

use fw_core::SerialMessageManager;
use st_shared::TimeProvider;

use crate::time::Esp32Time;
use crate::values::TowerValues;

/// Engine cadence; must stay below the fastest transmit period.
const TICK_MS: u64 = 10;

/// Log link statistics this often.
const STATS_PERIOD_MS: u64 = 10_000;

/// Run the engine loop (never returns).
pub async fn run_engine_loop(
    mut manager: SerialMessageManager,
    values: TowerValues,
    time: Esp32Time,
) -> ! {
    let mut next_stats_ms = STATS_PERIOD_MS;

    loop {
        // Dispatch everything the link delivered since the last tick.
        manager.poll();

        let now_ms = time.now_ms();

        #[cfg(feature = "demo_feed")]
        crate::demo_feed::feed(&values, now_ms);

        values.sound_state.borrow_mut().tick(now_ms);
        values.band_levels.borrow_mut().tick(now_ms);
        values.max_band.borrow_mut().tick(now_ms);
        values.bt_source.borrow_mut().tick(now_ms);
        values.volume.borrow_mut().tick(now_ms);
        values.band_gain.borrow_mut().tick(now_ms);

        if now_ms >= next_stats_ms {
            next_stats_ms = now_ms + STATS_PERIOD_MS;
            let stats = manager.stats();
            log::debug!(
                "link: {} envelopes accepted, {} rejected, {} unmatched",
                stats.ok_count(),
                stats.failure_count(),
                manager.unmatched()
            );
        }

        Timer::after(Duration::from_millis(TICK_MS)).await;
    }
}
