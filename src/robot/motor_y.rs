//! Y-axis spray head actuator (up/down).
//!
//! Time-based moves like the Z axis, plus a height-seek loop closed over
//! the vertical ultrasonic channel. Unlike the Z axis, a height-seek that
//! runs out of attempts returns quietly — the protocol has no error line
//! for it, the head is simply left stopped wherever it got to.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, info, warn};
use micromath::F32Ext;

use crate::config::{
    MOTOR_Y_MAX_ATTEMPTS, MOTOR_Y_SAMPLE_MS, MOTOR_Y_SPEED, MOTOR_Y_TOLERANCE_CM,
    MOTOR_Y_TRAVEL_MS,
};
use crate::hal::Clock;
use crate::robot::hbridge::HBridge;
use crate::robot::ultrasonic::UltrasonicArray;

pub struct MotorY<P, C> {
    bridge: HBridge<P, P>,
    clock: C,
    speed: i16,
}

impl<P, C> MotorY<P, C>
where
    P: SetDutyCycle,
    C: Clock,
{
    pub fn new(bridge: HBridge<P, P>, clock: C) -> Self {
        Self {
            bridge,
            clock,
            speed: MOTOR_Y_SPEED,
        }
    }

    /// Full-travel raise; blocks for the fixed travel duration.
    pub fn up(&mut self) {
        info!("[motor_y] moving up");
        self.run(true, MOTOR_Y_TRAVEL_MS);
    }

    pub fn down(&mut self) {
        info!("[motor_y] moving down");
        self.run(false, MOTOR_Y_TRAVEL_MS);
    }

    pub fn up_for(&mut self, seconds: f32) {
        self.run(true, (seconds * 1_000.0) as u64);
    }

    pub fn down_for(&mut self, seconds: f32) {
        self.run(false, (seconds * 1_000.0) as u64);
    }

    fn run(&mut self, up: bool, duration_ms: u64) {
        self.bridge.drive(if up { self.speed } else { -self.speed });
        self.clock.delay_ms(duration_ms);
        self.stop();
    }

    pub fn stop(&mut self) {
        self.bridge.stop();
    }

    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed.clamp(0, 255) as i16;
    }

    /// Seek the spray head to a height over ground, measured by the vertical
    /// ultrasonic channel.
    ///
    /// Samples every 100 ms, driving up when too low and down when too high,
    /// and gives up after 50 attempts. Success and timeout both end with the
    /// actuator stopped; neither is reported to the host.
    pub fn move_to_height<O, I, C2>(
        &mut self,
        target_cm: f32,
        sensors: &mut UltrasonicArray<O, I, C2>,
    ) where
        O: OutputPin,
        I: InputPin,
        C2: Clock,
    {
        info!("[motor_y] seeking height {:.1} cm", target_cm);

        for _ in 0..MOTOR_Y_MAX_ATTEMPTS {
            let height = sensors.y_distance();
            let diff = height - target_cm;
            debug!("[motor_y] at {:.1} cm, diff {:.1}", height, diff);

            if diff.abs() <= MOTOR_Y_TOLERANCE_CM {
                self.stop();
                info!("[motor_y] target height reached");
                return;
            }

            if diff < 0.0 {
                self.bridge.drive(self.speed); // below target, go up
            } else {
                self.bridge.drive(-self.speed);
            }

            self.clock.delay_ms(MOTOR_Y_SAMPLE_MS);
        }

        self.stop();
        warn!("[motor_y] height seek gave up, target not reached");
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::hal::mock::{MockClock, MockEcho, MockPin, MockPwm};

    struct Rig {
        now_us: Cell<u64>,
        fwd: Cell<u16>,
        rev: Cell<u16>,
        trig: [Cell<bool>; 3],
    }

    impl Rig {
        fn new() -> Self {
            Self {
                now_us: Cell::new(0),
                fwd: Cell::new(0),
                rev: Cell::new(0),
                trig: [Cell::new(false), Cell::new(false), Cell::new(false)],
            }
        }

        fn motor(&self) -> MotorY<MockPwm<'_>, MockClock<'_>> {
            MotorY::new(
                HBridge::new(MockPwm::new(&self.fwd), MockPwm::new(&self.rev)),
                MockClock::new(&self.now_us),
            )
        }

        fn sensors(&self) -> UltrasonicArray<MockPin<'_>, MockEcho<'_>, MockClock<'_>> {
            UltrasonicArray::new(
                (MockPin::new(&self.trig[0]), MockEcho::new(&self.now_us)),
                (MockPin::new(&self.trig[1]), MockEcho::new(&self.now_us)),
                (MockPin::new(&self.trig[2]), MockEcho::new(&self.now_us)),
                MockClock::new(&self.now_us),
            )
        }
    }

    #[test]
    fn timed_moves_drive_then_stop() {
        let rig = Rig::new();
        let mut motor = rig.motor();
        let before = rig.now_us.get();
        motor.up_for(0.5);
        assert!(rig.now_us.get() - before >= 500_000);
        assert_eq!((rig.fwd.get(), rig.rev.get()), (0, 0));
    }

    #[test]
    fn height_seek_gives_up_quietly_after_max_attempts() {
        let rig = Rig::new();
        let mut motor = rig.motor();
        // echo never scheduled: every read is the 999 sentinel, far above
        // target, so the head keeps driving down until attempts run out
        let mut sensors = rig.sensors();

        motor.move_to_height(15.0, &mut sensors);
        assert_eq!((rig.fwd.get(), rig.rev.get()), (0, 0));
    }
}
