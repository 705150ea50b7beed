//! Board bring-up: clocks, heap, runtime, and the inter-CPU UART.

use esp_hal::Config;
use esp_hal::clock::CpuClock;
use esp_hal::interrupt::software::{SoftwareInterrupt, SoftwareInterruptControl};
use esp_hal::peripherals::TIMG0;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{self, Uart};
use esp_hal::Async;

/// Inter-CPU link baud rate.
const LINK_BAUD: u32 = 500_000;

/// Initialize clocks, heap and peripherals.
///
/// Returns the pieces the runtime and the I/O task need: the software
/// interrupt for the scheduler, TIMG0 for the time driver, and the
/// configured UART for the inter-CPU link (GPIO4 RX / GPIO5 TX).
pub fn init_board() -> (SoftwareInterrupt<'static, 0>, TIMG0<'static>, Uart<'static, Async>) {
    let peripherals = esp_hal::init(Config::default().with_cpu_clock(CpuClock::max()));

    esp_alloc::heap_allocator!(size: 96 * 1024);

    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);

    let uart_config = uart::Config::default().with_baudrate(LINK_BAUD);
    let uart = Uart::new(peripherals.UART1, uart_config)
        .expect("UART1 init")
        .with_rx(peripherals.GPIO4)
        .with_tx(peripherals.GPIO5)
        .into_async();

    (sw_int.software_interrupt0, peripherals.TIMG0, uart)
}

/// Start the scheduler and the embassy time driver.
pub fn start_runtime(timg0: TIMG0<'static>, sw_int: SoftwareInterrupt<'static, 0>) {
    let timg0 = TimerGroup::new(timg0);
    esp_rtos::start(timg0.timer0, sw_int);
}
