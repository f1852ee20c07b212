//! Mock pins and clocks for host-side tests.
//!
//! Everything here is `Cell`-backed and borrows its state from the test, so
//! a test can hand a pin to a controller and still observe (or script) the
//! electrical level from outside. Compiled for host builds only; integration
//! tests under `tests/` use these as their hardware.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};

use super::Clock;

/// Simulated clock over a shared microsecond counter.
///
/// Every `now_us` read nudges the counter forward by 1 µs so that polling
/// loops with no delay inside cannot spin forever; delays advance it by the
/// full requested amount. Tests may also move the counter directly.
#[derive(Clone, Copy)]
pub struct MockClock<'a> {
    now_us: &'a Cell<u64>,
}

impl<'a> MockClock<'a> {
    pub fn new(now_us: &'a Cell<u64>) -> Self {
        Self { now_us }
    }
}

impl Clock for MockClock<'_> {
    fn now_us(&self) -> u64 {
        let now = self.now_us.get() + 1;
        self.now_us.set(now);
        now
    }

    fn delay_us(&mut self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

/// PWM pin that records the last duty cycle written to it (0..=255 scale,
/// matching the firmware's 8-bit speeds).
pub struct MockPwm<'a> {
    duty: &'a Cell<u16>,
}

impl<'a> MockPwm<'a> {
    pub fn new(duty: &'a Cell<u16>) -> Self {
        Self { duty }
    }
}

impl PwmErrorType for MockPwm<'_> {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm<'_> {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty.set(duty);
        Ok(())
    }
}

/// Output pin that mirrors its level into a shared cell.
pub struct MockPin<'a> {
    level: &'a Cell<bool>,
}

impl<'a> MockPin<'a> {
    pub fn new(level: &'a Cell<bool>) -> Self {
        Self { level }
    }
}

impl PinErrorType for MockPin<'_> {
    type Error = Infallible;
}

impl OutputPin for MockPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(true);
        Ok(())
    }
}

/// Echo input simulating an HC-SR04 target at a scripted distance.
///
/// Every measurement sees a pulse: the first poll arms an echo rising 50 µs
/// later whose width matches the scripted distance, and the window disarms
/// once it has passed, so repeated measurements each get a fresh pulse.
/// Without a scripted distance (the default) the pin stays low and the
/// sensor reports its out-of-range sentinel.
pub struct MockEcho<'a> {
    now_us: &'a Cell<u64>,
    distance_cm: Cell<Option<f32>>,
    window: Cell<Option<(u64, u64)>>,
}

impl<'a> MockEcho<'a> {
    pub fn new(now_us: &'a Cell<u64>) -> Self {
        Self {
            now_us,
            distance_cm: Cell::new(None),
            window: Cell::new(None),
        }
    }

    /// Place a target at `distance_cm`; subsequent measurements read it.
    pub fn set_distance_cm(&self, distance_cm: f32) {
        self.distance_cm.set(Some(distance_cm));
    }

    /// Remove the target; subsequent measurements time out.
    pub fn silence(&self) {
        self.distance_cm.set(None);
        self.window.set(None);
    }
}

impl PinErrorType for MockEcho<'_> {
    type Error = Infallible;
}

impl InputPin for MockEcho<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let now = self.now_us.get();
        if let Some((rise, fall)) = self.window.get() {
            if now < fall {
                return Ok(now >= rise);
            }
            self.window.set(None);
            return Ok(false);
        }
        if let Some(cm) = self.distance_cm.get() {
            let width = (cm * 2.0 / crate::config::SOUND_SPEED_CM_US) as u64;
            let rise = now + 50;
            self.window.set(Some((rise, rise + width)));
        }
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
