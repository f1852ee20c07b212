//! UART line reader task.
//!
//! Assembles the incoming byte stream into trimmed command lines and
//! forwards them to the control task. Overlong lines are discarded whole
//! rather than truncated, so a garbled burst can never turn into a valid
//! command by accident.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embedded_io_async::Read;
use esp_hal::uart::UartRx;
use esp_hal::Async;
use heapless::{String, Vec};
use log::{error, warn};

use crate::config::CMD_LINE_SIZE;
use crate::LINE_CHANNEL_SIZE;

pub type CommandLine = String<CMD_LINE_SIZE>;

#[embassy_executor::task]
pub async fn serial_task(
    mut rx: UartRx<'static, Async>,
    line_sender: Sender<'static, CriticalSectionRawMutex, CommandLine, LINE_CHANNEL_SIZE>,
) {
    let mut buf = [0u8; 64];
    let mut line: Vec<u8, CMD_LINE_SIZE> = Vec::new();
    let mut overflow = false;

    loop {
        match rx.read(&mut buf).await {
            Ok(0) => {}
            Ok(n) => {
                for &byte in &buf[..n] {
                    match byte {
                        b'\n' => {
                            if overflow {
                                warn!("[serial] line too long, discarded");
                            } else if let Ok(text) = core::str::from_utf8(&line) {
                                let trimmed = text.trim();
                                if !trimmed.is_empty() {
                                    let mut owned = CommandLine::new();
                                    // cannot fail: trimmed fits the buffer it came from
                                    let _ = owned.push_str(trimmed);
                                    line_sender.send(owned).await;
                                }
                            }
                            line.clear();
                            overflow = false;
                        }
                        b'\r' => {}
                        _ => {
                            if line.push(byte).is_err() {
                                overflow = true;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                error!("[serial] read error: {:?}", e);
            }
        }
    }
}
