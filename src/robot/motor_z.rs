//! Z-axis arm actuator (extend/retract).
//!
//! Two control modes: time-based (drive for a duration, blocking) and
//! encoder-based (closed loop on the quadrature position until the target
//! is inside tolerance or the time budget runs out). The blocking loop is
//! fine here — the host treats every Z command as a synchronous, acknowledged
//! operation and nothing else needs the CPU during a move.

use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};
use micromath::F32Ext;

use crate::config::{MOTOR_Z_SAMPLE_MS, MOTOR_Z_SPEED, MOTOR_Z_TIMEOUT_MS, MOTOR_Z_TOLERANCE_MM};
use crate::hal::Clock;
use crate::robot::encoder::Encoder;
use crate::robot::hbridge::HBridge;
use crate::robot::MotionError;

pub struct MotorZ<P, C> {
    bridge: HBridge<P, P>,
    encoder: Encoder,
    clock: C,
    speed: i16,
    encoder_enabled: bool,
}

impl<P, C> MotorZ<P, C>
where
    P: SetDutyCycle,
    C: Clock,
{
    /// Encoder mode starts enabled; `Z_ENC_OFF` drops back to time-based
    /// control only.
    pub fn new(bridge: HBridge<P, P>, encoder: Encoder, clock: C) -> Self {
        Self {
            bridge,
            encoder,
            clock,
            speed: MOTOR_Z_SPEED,
            encoder_enabled: true,
        }
    }

    // === Time-based control ===

    /// Extend for a duration; blocks until the actuator is stopped again.
    pub fn extend(&mut self, seconds: f32) {
        self.run(true, (seconds * 1_000.0) as u64);
    }

    pub fn retract(&mut self, seconds: f32) {
        self.run(false, (seconds * 1_000.0) as u64);
    }

    fn run(&mut self, forward: bool, duration_ms: u64) {
        self.bridge.drive(if forward { self.speed } else { -self.speed });
        self.clock.delay_ms(duration_ms);
        self.stop();
    }

    // === Encoder-based control ===

    /// Closed-loop move to an absolute position in cm.
    ///
    /// Polls the encoder every 10 ms and drives toward the target until the
    /// error is within 2 mm; aborts with [`MotionError::Timeout`] after 10 s.
    /// The actuator is stopped on every exit path.
    pub fn move_to_cm(&mut self, target_cm: f32) -> Result<(), MotionError> {
        if !self.encoder_enabled {
            warn!("[motor_z] closed-loop move refused, encoder mode disabled");
            return Err(MotionError::EncoderDisabled);
        }

        let target_mm = target_cm * 10.0;
        let start_ms = self.clock.now_ms();
        info!("[motor_z] moving to {:.1} cm", target_cm);

        loop {
            let error_mm = target_mm - self.encoder.position_mm();

            if error_mm.abs() <= MOTOR_Z_TOLERANCE_MM {
                self.stop();
                info!("[motor_z] reached target, at {:.2} cm", self.position_cm());
                return Ok(());
            }

            if self.clock.now_ms().wrapping_sub(start_ms) > MOTOR_Z_TIMEOUT_MS {
                self.stop();
                warn!("[motor_z] move timed out");
                return Err(MotionError::Timeout);
            }

            if error_mm > 0.0 {
                self.bridge.drive(self.speed);
            } else {
                self.bridge.drive(-self.speed);
            }

            // let some displacement accumulate between samples
            self.clock.delay_ms(MOTOR_Z_SAMPLE_MS);
        }
    }

    // === Position ===

    /// Current position in cm; 0 when encoder mode is disabled (position is
    /// unknown without feedback).
    pub fn position_cm(&self) -> f32 {
        if self.encoder_enabled {
            self.encoder.position_cm()
        } else {
            0.0
        }
    }

    /// Declare the current position to be 0 (homing).
    pub fn reset_position(&mut self) {
        self.encoder.reset();
    }

    // === Control ===

    pub fn stop(&mut self) {
        self.bridge.stop();
    }

    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed.clamp(0, 255) as i16;
    }

    // === Mode ===

    pub fn enable_encoder_mode(&mut self) {
        self.encoder_enabled = true;
        info!("[motor_z] encoder mode enabled");
    }

    pub fn disable_encoder_mode(&mut self) {
        self.encoder_enabled = false;
        info!("[motor_z] encoder mode disabled, time-based only");
    }

    pub fn encoder_enabled(&self) -> bool {
        self.encoder_enabled
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::config::MM_PER_PULSE;
    use crate::hal::mock::MockPwm;
    use crate::robot::encoder::PulseCounter;

    /// Clock whose delays also move a simulated plant: while the bridge
    /// drives, the encoder accumulates pulses in the driven direction.
    #[derive(Clone, Copy)]
    struct PlantClock<'a> {
        now_us: &'a Cell<u64>,
        fwd_duty: &'a Cell<u16>,
        rev_duty: &'a Cell<u16>,
        counter: &'static PulseCounter,
        /// Pulses accumulated per delay while driven; 0 simulates a stuck
        /// actuator.
        pulses_per_delay: i64,
    }

    impl Clock for PlantClock<'_> {
        fn now_us(&self) -> u64 {
            let now = self.now_us.get() + 1;
            self.now_us.set(now);
            now
        }

        fn delay_us(&mut self, us: u64) {
            self.now_us.set(self.now_us.get() + us);
            let direction = if self.fwd_duty.get() > 0 {
                1
            } else if self.rev_duty.get() > 0 {
                -1
            } else {
                0
            };
            self.counter
                .set(self.counter.snapshot() + direction * self.pulses_per_delay);
        }
    }

    struct Rig {
        now_us: Cell<u64>,
        fwd: Cell<u16>,
        rev: Cell<u16>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                now_us: Cell::new(0),
                fwd: Cell::new(0),
                rev: Cell::new(0),
            }
        }

        fn motor(
            &self,
            counter: &'static PulseCounter,
            pulses_per_delay: i64,
        ) -> MotorZ<MockPwm<'_>, PlantClock<'_>> {
            let clock = PlantClock {
                now_us: &self.now_us,
                fwd_duty: &self.fwd,
                rev_duty: &self.rev,
                counter,
                pulses_per_delay,
            };
            MotorZ::new(
                HBridge::new(MockPwm::new(&self.fwd), MockPwm::new(&self.rev)),
                Encoder::new(counter),
                clock,
            )
        }
    }

    #[test]
    fn closed_loop_move_converges_within_tolerance() {
        static COUNTER: PulseCounter = PulseCounter::new();
        let rig = Rig::new();
        let mut motor = rig.motor(&COUNTER, 1);

        assert_eq!(motor.move_to_cm(15.0), Ok(()));
        assert!((motor.position_cm() - 15.0).abs() <= 0.2);
        // actuator left stopped
        assert_eq!((rig.fwd.get(), rig.rev.get()), (0, 0));
    }

    #[test]
    fn closed_loop_move_back_down_converges_too() {
        static COUNTER: PulseCounter = PulseCounter::new();
        let rig = Rig::new();
        COUNTER.set((120.0 / MM_PER_PULSE) as i64); // start at 12 cm
        let mut motor = rig.motor(&COUNTER, 1);

        assert_eq!(motor.move_to_cm(3.0), Ok(()));
        assert!((motor.position_cm() - 3.0).abs() <= 0.2);
    }

    #[test]
    fn stuck_encoder_times_out_after_the_budget() {
        static COUNTER: PulseCounter = PulseCounter::new();
        let rig = Rig::new();
        let mut motor = rig.motor(&COUNTER, 0);

        let start_ms = rig.now_us.get() / 1_000;
        assert_eq!(motor.move_to_cm(10.0), Err(MotionError::Timeout));
        let elapsed_ms = rig.now_us.get() / 1_000 - start_ms;
        assert!(elapsed_ms > MOTOR_Z_TIMEOUT_MS);
        assert!(elapsed_ms < MOTOR_Z_TIMEOUT_MS + 100);
        assert_eq!((rig.fwd.get(), rig.rev.get()), (0, 0));
    }

    #[test]
    fn move_with_encoder_disabled_fails_without_moving() {
        static COUNTER: PulseCounter = PulseCounter::new();
        let rig = Rig::new();
        let mut motor = rig.motor(&COUNTER, 1);
        motor.disable_encoder_mode();

        assert_eq!(motor.move_to_cm(5.0), Err(MotionError::EncoderDisabled));
        assert_eq!(COUNTER.snapshot(), 0);
        assert_eq!(motor.position_cm(), 0.0);
    }

    #[test]
    fn timed_extend_runs_then_stops() {
        static COUNTER: PulseCounter = PulseCounter::new();
        let rig = Rig::new();
        let mut motor = rig.motor(&COUNTER, 1);

        let before = rig.now_us.get();
        motor.extend(1.5);
        assert!(rig.now_us.get() - before >= 1_500_000);
        assert_eq!((rig.fwd.get(), rig.rev.get()), (0, 0));
        // the plant moved while the bridge was driven
        assert!(COUNTER.snapshot() > 0);
    }
}
