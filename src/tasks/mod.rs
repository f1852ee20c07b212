//! Asynchronous tasks for robot operation.
//!
//! Embassy tasks for the firmware runtime:
//! - [`serial_task`]: reads the UART byte stream and assembles command lines.
//! - [`control_task`]: dispatches lines, writes responses, and runs the
//!   idle-loop work (drive ramp, obstacle avoidance) between lines.
//!
//! Tasks are spawned from `main.rs` and communicate via an Embassy channel.

pub mod control_task;
pub mod serial_task;
