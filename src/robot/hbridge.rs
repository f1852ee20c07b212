//! Signed-speed control of a 4-pin H-bridge motor channel.
//!
//! One PWM pin carries the forward duty, the other the reverse duty; the
//! inactive pin is always driven to zero. Speeds are the firmware-wide
//! signed 8-bit scale (-255..=255).

use embedded_hal::pwm::SetDutyCycle;
use log::error;

/// One motor channel of a 4-pin driver (no enable pin).
pub struct HBridge<A, B> {
    forward: A,
    backward: B,
}

impl<A, B> HBridge<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(forward: A, backward: B) -> Self {
        Self { forward, backward }
    }

    /// Drive at a signed speed; magnitude clamped to 0..=255, 0 coasts.
    pub fn drive(&mut self, speed: i16) {
        let duty = speed.unsigned_abs().min(255);
        let (fwd, rev) = if speed > 0 {
            (duty, 0)
        } else if speed < 0 {
            (0, duty)
        } else {
            (0, 0)
        };
        if let Err(e) = self.forward.set_duty_cycle_fraction(fwd, 255) {
            error!("[hbridge] forward pwm write failed: {:?}", e);
        }
        if let Err(e) = self.backward.set_duty_cycle_fraction(rev, 255) {
            error!("[hbridge] backward pwm write failed: {:?}", e);
        }
    }

    pub fn stop(&mut self) {
        self.drive(0);
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::hal::mock::MockPwm;

    #[test]
    fn forward_drives_one_pin_only() {
        let (fwd, rev) = (Cell::new(0), Cell::new(0));
        let mut bridge = HBridge::new(MockPwm::new(&fwd), MockPwm::new(&rev));
        bridge.drive(200);
        assert_eq!((fwd.get(), rev.get()), (200, 0));
    }

    #[test]
    fn reverse_drives_the_other_pin() {
        let (fwd, rev) = (Cell::new(0), Cell::new(0));
        let mut bridge = HBridge::new(MockPwm::new(&fwd), MockPwm::new(&rev));
        bridge.drive(-150);
        assert_eq!((fwd.get(), rev.get()), (0, 150));
    }

    #[test]
    fn magnitude_is_clamped_and_zero_coasts() {
        let (fwd, rev) = (Cell::new(0), Cell::new(0));
        let mut bridge = HBridge::new(MockPwm::new(&fwd), MockPwm::new(&rev));
        bridge.drive(300);
        assert_eq!(fwd.get(), 255);
        bridge.stop();
        assert_eq!((fwd.get(), rev.get()), (0, 0));
    }
}
