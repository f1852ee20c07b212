//! Library root for the AgriBot firmware.
//!
//! Re-exports the main modules: [`robot`] (actuator and sensor controllers),
//! [`dispatcher`] (serial command handling), [`hal`] (timing, storage and
//! mock seams) and [`tasks`] (Embassy tasks, target builds only).
//!
//! The control core only touches hardware through `embedded-hal` traits and
//! the [`hal::Clock`] seam, so everything except `tasks` and `main` builds
//! and tests on the host.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dispatcher;
pub mod hal;
pub mod robot;
#[cfg(target_os = "none")]
pub mod tasks;

pub const LINE_CHANNEL_SIZE: usize = 4;
