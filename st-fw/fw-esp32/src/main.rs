//! ESP32 firmware application.
//!
//! This binary is the main entry point for a SoundTower controller CPU.
//! It initializes the hardware, sets up the inter-CPU UART link and the
//! flash-backed preference store, declares this CPU's synchronized values,
//! and runs the engine loop.

#![no_std]
#![no_main]

extern crate alloc;
#[macro_use]
extern crate log;

use esp_backtrace as _; // Import to activate panic handler

mod board;
mod engine_loop;
mod nvs;
mod serial;
mod time;
mod values;

#[cfg(feature = "demo_feed")]
mod demo_feed;

use alloc::rc::Rc;
use core::cell::RefCell;

use board::{init_board, start_runtime};
use engine_loop::run_engine_loop;
use fw_core::SerialMessageManager;
use nvs::FlashPrefStore;
use serial::{message_router, rx_task, tx_task};
use st_shared::PreferenceStore;
use time::Esp32Time;
use values::declare_values;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: embassy_executor::Spawner) {
    // Initialize board (clock, heap, runtime) and get hardware peripherals
    esp_println::println!("[INIT] Initializing board...");
    let (sw_int, timg0, uart) = init_board();
    start_runtime(timg0, sw_int);

    esp_println::logger::init_logger_from_env();
    info!("fw-esp32 starting...");

    // Spawn the UART I/O tasks; everything else talks to the link through
    // the bounded channels behind the router.
    let (uart_rx, uart_tx) = uart.split();
    spawner.spawn(rx_task(uart_rx)).expect("spawn rx_task");
    spawner.spawn(tx_task(uart_tx)).expect("spawn tx_task");
    debug!("I/O tasks spawned");

    // Flash-backed preferences.
    let store: Rc<RefCell<dyn PreferenceStore>> = Rc::new(RefCell::new(FlashPrefStore::load()));

    // Declare this CPU's synchronized values and register their RX sides.
    let mut manager = SerialMessageManager::new(message_router());
    let values = declare_values(&mut manager, store);
    info!("fw-esp32 initialized, starting engine loop...");

    // Run engine loop (never returns)
    run_engine_loop(manager, values, Esp32Time::new()).await;
}
