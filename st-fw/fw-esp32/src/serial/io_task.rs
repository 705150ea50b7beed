//! UART I/O tasks for the inter-CPU link.
//!
//! Two tasks per link:
//! - `rx_task` reads available bytes, frames them into lines, and pushes
//!   complete lines to the incoming queue (drop on full; the reader never
//!   blocks on a slow consumer)
//! - `tx_task` drains the outgoing queue FIFO and writes each line plus
//!   `\n` to the UART
//!
//! Dispatch of decoded envelopes happens in the engine loop, which drains
//! the incoming queue through the manager.

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use embedded_io_async::{Read, Write};
use esp_hal::Async;
use esp_hal::uart::{UartRx, UartTx};

use fw_core::LineFramer;

use super::message_router;

/// One dropped-line warning per this many drops.
const RX_DROP_WARN_EVERY: u32 = 16;

#[embassy_executor::task]
pub async fn rx_task(mut rx: UartRx<'static, Async>) {
    let router = message_router();
    let mut framer = LineFramer::new();
    let mut rx_drops: u32 = 0;

    loop {
        // Read from the UART (short timeout keeps the task responsive to
        // link resets without spinning)
        let mut buf = [0u8; 64];
        match select(
            Timer::after(Duration::from_millis(1)),
            Read::read(&mut rx, &mut buf),
        )
        .await
        {
            Either::Second(Ok(n)) if n > 0 => {
                framer.push_bytes(&buf[..n], |line| {
                    if router.push_incoming(line).is_err() {
                        rx_drops = rx_drops.wrapping_add(1);
                        if rx_drops % RX_DROP_WARN_EVERY == 1 {
                            log::warn!("incoming queue full, {} lines dropped so far", rx_drops);
                        }
                    }
                });
            }
            Either::Second(Err(_)) => {
                // Read error - link may be resetting, keep going
            }
            _ => {
                // Timeout or no data - continue
            }
        }

        // Small delay to yield
        Timer::after(Duration::from_millis(1)).await;
    }
}

#[embassy_executor::task]
pub async fn tx_task(mut tx: UartTx<'static, Async>) {
    let router = message_router();

    loop {
        // Drain the outgoing queue FIFO and send over the UART
        while let Some(line) = router.try_receive_outgoing() {
            if Write::write_all(&mut tx, line.as_bytes()).await.is_err() {
                // Write error - drop the line and retry with the next one
                break;
            }
            let _ = Write::write_all(&mut tx, b"\n").await;
            let _ = Write::flush(&mut tx).await;
        }

        // Small delay to yield while the queue is empty
        Timer::after(Duration::from_millis(1)).await;
    }
}
