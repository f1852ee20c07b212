//! Spray pump relay.

use embedded_hal::digital::OutputPin;
use log::info;

use crate::hal::Clock;

pub struct Pump<O, C> {
    relay: O,
    clock: C,
    is_on: bool,
}

impl<O, C> Pump<O, C>
where
    O: OutputPin,
    C: Clock,
{
    pub fn new(relay: O, clock: C) -> Self {
        let mut pump = Self {
            relay,
            clock,
            is_on: false,
        };
        pump.off();
        pump
    }

    /// Timed run; blocks for the duration.
    pub fn spray(&mut self, seconds: f32) {
        info!("[pump] spraying for {:.2} s", seconds);
        self.on();
        self.clock.delay_ms((seconds * 1_000.0) as u64);
        self.off();
    }

    pub fn on(&mut self) {
        let _ = self.relay.set_high();
        self.is_on = true;
    }

    pub fn off(&mut self) {
        let _ = self.relay.set_low();
        self.is_on = false;
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }
}
