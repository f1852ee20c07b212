//! Command processing task.
//!
//! Receives assembled lines from the serial task and runs the dispatcher.
//! While the line is quiet (20 ms receive timeout) it advances the drive
//! ramp and lets the avoidance loop poll, which reproduces the classic
//! read-command / update / check-obstacles main loop. A blocking actuator
//! move keeps the task busy until it is acknowledged; newly arriving lines
//! queue up in the channel meanwhile.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use esp_hal::gpio::{Input, Output};
use esp_hal::ledc::channel::Channel;
use esp_hal::ledc::LowSpeed;
use esp_hal::uart::UartTx;
use esp_hal::Async;
use log::error;

use crate::dispatcher::Dispatcher;
use crate::hal::esp::EspClock;
use crate::hal::MemoryStore;
use crate::robot::commands::BufferedSink;
use crate::tasks::serial_task::CommandLine;
use crate::LINE_CHANNEL_SIZE;

/// Dispatcher over the concrete ESP32 pin types.
pub type RobotDispatcher = Dispatcher<
    Channel<'static, LowSpeed>,
    Output<'static>,
    Input<'static>,
    EspClock,
    MemoryStore,
>;

const RAMP_TICK: Duration = Duration::from_millis(20);

#[embassy_executor::task]
pub async fn control_task(
    mut dispatcher: RobotDispatcher,
    line_receiver: Receiver<'static, CriticalSectionRawMutex, CommandLine, LINE_CHANNEL_SIZE>,
    mut tx: UartTx<'static, Async>,
) {
    let mut sink = BufferedSink::new();
    dispatcher.announce_ready();

    loop {
        match with_timeout(RAMP_TICK, line_receiver.receive()).await {
            Ok(line) => dispatcher.handle(line.as_str(), &mut sink),
            Err(_) => dispatcher.tick(&mut sink),
        }
        flush(&mut tx, &mut sink).await;
    }
}

/// Drain buffered response lines out over the UART, CRLF-terminated.
async fn flush(tx: &mut UartTx<'static, Async>, sink: &mut BufferedSink) {
    for line in sink.lines.iter() {
        if let Err(e) = tx.write_all(line.as_bytes()).await {
            error!("[control] uart write failed: {:?}", e);
        }
        if let Err(e) = tx.write_all(b"\r\n").await {
            error!("[control] uart write failed: {:?}", e);
        }
    }
    if let Err(e) = tx.flush().await {
        error!("[control] uart flush failed: {:?}", e);
    }
    sink.clear();
}
