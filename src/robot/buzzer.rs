//! Buzzer feedback patterns.
//!
//! Plain on/off beeps on a GPIO; the success/error/warning signatures are
//! timed beep sequences. Durations follow the original feedback patterns.

use embedded_hal::digital::OutputPin;

use crate::config::{BUZZER_BEEP_MS, BUZZER_PAUSE_MS};
use crate::hal::Clock;

pub struct Buzzer<O, C> {
    pin: O,
    clock: C,
}

impl<O, C> Buzzer<O, C>
where
    O: OutputPin,
    C: Clock,
{
    pub fn new(pin: O, clock: C) -> Self {
        let mut buzzer = Self { pin, clock };
        buzzer.off();
        buzzer
    }

    pub fn on(&mut self) {
        let _ = self.pin.set_high();
    }

    pub fn off(&mut self) {
        let _ = self.pin.set_low();
    }

    pub fn beep(&mut self) {
        self.beep_ms(BUZZER_BEEP_MS);
    }

    pub fn beep_ms(&mut self, duration_ms: u64) {
        self.on();
        self.clock.delay_ms(duration_ms);
        self.off();
    }

    pub fn beep_times(&mut self, times: u32) {
        for i in 0..times {
            self.beep();
            if i + 1 < times {
                self.clock.delay_ms(BUZZER_PAUSE_MS);
            }
        }
    }

    /// Two short beeps.
    pub fn play_success(&mut self) {
        self.beep_ms(100);
        self.clock.delay_ms(50);
        self.beep_ms(150);
    }

    /// Three beeps.
    pub fn play_error(&mut self) {
        for _ in 0..3 {
            self.beep_ms(100);
            self.clock.delay_ms(100);
        }
    }

    /// One long beep.
    pub fn play_warning(&mut self) {
        self.beep_ms(500);
    }

    /// Rising four-step boot chirp.
    pub fn play_startup(&mut self) {
        for duration in [100, 100, 100, 200] {
            self.beep_ms(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::hal::mock::{MockClock, MockPin};

    #[test]
    fn beep_times_spends_beep_and_pause_time() {
        let now_us = Cell::new(0);
        let level = Cell::new(false);
        let mut buzzer = Buzzer::new(MockPin::new(&level), MockClock::new(&now_us));

        let before = now_us.get();
        buzzer.beep_times(3);
        // 3 beeps of 100 ms with 2 pauses of 100 ms in between
        assert_eq!(now_us.get() - before, 500_000);
        assert!(!level.get());
    }

    #[test]
    fn single_beep_ends_silent() {
        let now_us = Cell::new(0);
        let level = Cell::new(false);
        let mut buzzer = Buzzer::new(MockPin::new(&level), MockClock::new(&now_us));
        buzzer.beep();
        assert!(!level.get());
    }
}
