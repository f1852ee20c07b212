//! Differential wheel drive with smooth acceleration and trim correction.
//!
//! Direction commands only set targets; [`Drive::update`] must run on every
//! idle-loop pass and ramps both sides toward the target at a bounded step,
//! applies the trim offset and the direction sign, and writes the bridges.
//! Turns and curves bypass the ramp and write the bridges directly; the next
//! ramp application overwrites them, so callers that need a turn to persist
//! hold it with a blocking delay (the avoidance maneuvers do exactly that).

use embedded_hal::pwm::SetDutyCycle;
use log::{debug, info};

use crate::config::{MOTOR_ACCEL_INTERVAL_MS, MOTOR_ACCEL_STEP, MOTOR_DEFAULT_SPEED, TRIM_KEY, TRIM_LIMIT};
use crate::hal::{Clock, Storage};
use crate::robot::hbridge::HBridge;

/// Travel direction of the drive pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Stopped,
    Forward,
    Backward,
}

impl Direction {
    fn sign(self) -> i16 {
        match self {
            Direction::Stopped => 0,
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

pub struct Drive<P, C> {
    left: HBridge<P, P>,
    right: HBridge<P, P>,
    clock: C,
    direction: Direction,
    target_speed: i16,
    current_left: i16,
    current_right: i16,
    trim: i16,
    last_ramp_ms: u64,
}

impl<P, C> Drive<P, C>
where
    P: SetDutyCycle,
    C: Clock,
{
    pub fn new(left: HBridge<P, P>, right: HBridge<P, P>, clock: C) -> Self {
        Self {
            left,
            right,
            clock,
            direction: Direction::Stopped,
            target_speed: 0,
            current_left: 0,
            current_right: 0,
            trim: 0,
            last_ramp_ms: 0,
        }
    }

    // === Movement ===

    /// Drive forward; keeps a previously set speed, otherwise cruises at the
    /// default.
    pub fn forward(&mut self) {
        self.direction = Direction::Forward;
        if self.target_speed == 0 {
            self.target_speed = MOTOR_DEFAULT_SPEED;
        }
    }

    pub fn backward(&mut self) {
        self.direction = Direction::Backward;
        if self.target_speed == 0 {
            self.target_speed = MOTOR_DEFAULT_SPEED;
        }
    }

    /// Graceful stop; the ramp in [`Drive::update`] decays the speed.
    pub fn stop(&mut self) {
        self.direction = Direction::Stopped;
        self.target_speed = 0;
    }

    /// Immediate stop, bypassing the ramp: speeds and both bridges to zero.
    pub fn emergency_stop(&mut self) {
        self.direction = Direction::Stopped;
        self.target_speed = 0;
        self.current_left = 0;
        self.current_right = 0;
        self.left.stop();
        self.right.stop();
        info!("[drive] emergency stop");
    }

    // === Turning (direct, not ramped) ===

    /// Rotate in place: left backward, right forward, half speed.
    pub fn turn_left(&mut self) {
        self.drive_sides(-MOTOR_DEFAULT_SPEED / 2, MOTOR_DEFAULT_SPEED / 2);
    }

    pub fn turn_right(&mut self) {
        self.drive_sides(MOTOR_DEFAULT_SPEED / 2, -MOTOR_DEFAULT_SPEED / 2);
    }

    /// Curve: inner wheel at a third, outer at full speed.
    pub fn curve_left(&mut self) {
        self.drive_sides(MOTOR_DEFAULT_SPEED / 3, MOTOR_DEFAULT_SPEED);
    }

    pub fn curve_right(&mut self) {
        self.drive_sides(MOTOR_DEFAULT_SPEED, MOTOR_DEFAULT_SPEED / 3);
    }

    /// Write both bridges directly with signed per-side speeds.
    pub fn drive_sides(&mut self, left: i16, right: i16) {
        self.left.drive(left);
        self.right.drive(right);
    }

    // === Speed control ===

    /// Clamp to 0..=255 and set the ramp target. Selects forward motion if
    /// the drive was stopped and the speed is positive.
    pub fn set_speed(&mut self, speed: i32) {
        self.target_speed = speed.clamp(0, 255) as i16;
        if self.direction == Direction::Stopped && self.target_speed > 0 {
            self.direction = Direction::Forward;
        }
    }

    pub fn speed(&self) -> i16 {
        self.target_speed
    }

    /// Ramped per-side speeds, before trim and direction are applied.
    pub fn current_speeds(&self) -> (i16, i16) {
        (self.current_left, self.current_right)
    }

    pub fn is_moving(&self) -> bool {
        self.current_left != 0 || self.current_right != 0
    }

    // === Trim ===

    pub fn set_trim(&mut self, offset: i32) {
        self.trim = offset.clamp(-TRIM_LIMIT as i32, TRIM_LIMIT as i32) as i16;
        debug!("[drive] trim set to {}", self.trim);
    }

    pub fn trim(&self) -> i16 {
        self.trim
    }

    /// Persist the trim offset, biased by +50 into an unsigned cell.
    pub fn save_trim(&self, store: &mut impl Storage) {
        store.put_u8(TRIM_KEY, (self.trim + TRIM_LIMIT) as u8);
        info!("[drive] trim saved: {}", self.trim);
    }

    /// Load the trim offset; a missing or out-of-range cell loads as zero.
    pub fn load_trim(&mut self, store: &mut impl Storage) {
        self.trim = match store.get_u8(TRIM_KEY) {
            Some(stored) if stored <= 2 * TRIM_LIMIT as u8 => stored as i16 - TRIM_LIMIT,
            _ => 0,
        };
    }

    // === Ramp (call on every idle-loop pass) ===

    /// Advance the acceleration ramp and refresh the bridge outputs.
    /// Rate-limited internally, so calling it more often is free.
    pub fn update(&mut self) {
        let now = self.clock.now_ms();
        if now.wrapping_sub(self.last_ramp_ms) < MOTOR_ACCEL_INTERVAL_MS {
            return;
        }
        self.last_ramp_ms = now;

        self.current_left = ramp_toward(self.current_left, self.target_speed);
        self.current_right = ramp_toward(self.current_right, self.target_speed);

        self.apply_speed();
    }

    /// Apply trim, then the direction sign, then write both bridges.
    fn apply_speed(&mut self) {
        let mut left = self.current_left;
        let mut right = self.current_right;

        if self.trim > 0 {
            right -= self.trim; // right side runs fast, slow it down
        } else if self.trim < 0 {
            left += self.trim;
        }

        let sign = self.direction.sign();
        self.left.drive(left * sign);
        self.right.drive(right * sign);
    }
}

/// Step `current` toward `target` by at most [`MOTOR_ACCEL_STEP`], never
/// overshooting.
fn ramp_toward(current: i16, target: i16) -> i16 {
    if current < target {
        (current + MOTOR_ACCEL_STEP).min(target)
    } else if current > target {
        (current - MOTOR_ACCEL_STEP).max(target)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::hal::mock::{MockClock, MockPwm};
    use crate::hal::MemoryStore;

    struct Rig {
        now_us: Cell<u64>,
        left_fwd: Cell<u16>,
        left_rev: Cell<u16>,
        right_fwd: Cell<u16>,
        right_rev: Cell<u16>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                now_us: Cell::new(0),
                left_fwd: Cell::new(0),
                left_rev: Cell::new(0),
                right_fwd: Cell::new(0),
                right_rev: Cell::new(0),
            }
        }

        fn drive(&self) -> Drive<MockPwm<'_>, MockClock<'_>> {
            Drive::new(
                HBridge::new(MockPwm::new(&self.left_fwd), MockPwm::new(&self.left_rev)),
                HBridge::new(MockPwm::new(&self.right_fwd), MockPwm::new(&self.right_rev)),
                MockClock::new(&self.now_us),
            )
        }

        /// Advance simulated time past the ramp gate and tick once.
        fn tick(&self, drive: &mut Drive<MockPwm<'_>, MockClock<'_>>) {
            self.now_us.set(self.now_us.get() + 20_000);
            drive.update();
        }
    }

    #[test]
    fn ramp_steps_are_bounded_and_never_overshoot() {
        let rig = Rig::new();
        let mut drive = rig.drive();
        drive.set_speed(42);
        drive.forward();

        let mut previous = 0;
        for _ in 0..40 {
            rig.tick(&mut drive);
            let (left, _) = drive.current_speeds();
            assert!((left - previous).abs() <= MOTOR_ACCEL_STEP);
            assert!(left <= 42);
            previous = left;
        }
        assert_eq!(drive.current_speeds(), (42, 42));

        drive.stop();
        for _ in 0..40 {
            rig.tick(&mut drive);
            let (left, _) = drive.current_speeds();
            assert!(left >= 0);
        }
        assert_eq!(drive.current_speeds(), (0, 0));
    }

    #[test]
    fn update_is_rate_limited() {
        let rig = Rig::new();
        let mut drive = rig.drive();
        drive.forward();

        rig.tick(&mut drive);
        let after_first = drive.current_speeds();
        // immediate second call inside the 20 ms window does nothing
        drive.update();
        assert_eq!(drive.current_speeds(), after_first);
    }

    #[test]
    fn emergency_stop_zeroes_speeds_and_pins_in_one_call() {
        let rig = Rig::new();
        let mut drive = rig.drive();
        drive.forward();
        for _ in 0..40 {
            rig.tick(&mut drive);
        }
        assert!(drive.is_moving());

        drive.emergency_stop();
        assert_eq!(drive.current_speeds(), (0, 0));
        assert_eq!(rig.left_fwd.get(), 0);
        assert_eq!(rig.left_rev.get(), 0);
        assert_eq!(rig.right_fwd.get(), 0);
        assert_eq!(rig.right_rev.get(), 0);
    }

    #[test]
    fn positive_trim_slows_the_right_side() {
        let rig = Rig::new();
        let mut drive = rig.drive();
        drive.set_trim(10);
        drive.set_speed(100);
        drive.forward();
        for _ in 0..30 {
            rig.tick(&mut drive);
        }
        assert_eq!(rig.left_fwd.get(), 100);
        assert_eq!(rig.right_fwd.get(), 90);
    }

    #[test]
    fn backward_direction_drives_the_reverse_pins() {
        let rig = Rig::new();
        let mut drive = rig.drive();
        drive.set_speed(60);
        drive.backward();
        for _ in 0..20 {
            rig.tick(&mut drive);
        }
        assert_eq!(rig.left_fwd.get(), 0);
        assert_eq!(rig.left_rev.get(), 60);
        assert_eq!(rig.right_rev.get(), 60);
    }

    #[test]
    fn explicit_speed_survives_a_direction_command() {
        let rig = Rig::new();
        let mut drive = rig.drive();
        drive.set_speed(120);
        drive.forward();
        assert_eq!(drive.speed(), 120);

        // bare direction command from stopped picks the default
        let mut drive = rig.drive();
        drive.forward();
        assert_eq!(drive.speed(), MOTOR_DEFAULT_SPEED);
    }

    #[test]
    fn trim_round_trips_through_storage() {
        let rig = Rig::new();
        let mut store = MemoryStore::new();
        for offset in -50..=50 {
            let mut drive = rig.drive();
            drive.set_trim(offset);
            drive.save_trim(&mut store);
            let mut reloaded = rig.drive();
            reloaded.load_trim(&mut store);
            assert_eq!(reloaded.trim(), offset as i16);
        }
    }

    #[test]
    fn out_of_range_stored_trim_loads_as_zero() {
        let rig = Rig::new();
        let mut store = MemoryStore::new();
        store.put_u8(TRIM_KEY, 101);
        let mut drive = rig.drive();
        drive.set_trim(33);
        drive.load_trim(&mut store);
        assert_eq!(drive.trim(), 0);
    }

    #[test]
    fn turns_write_the_bridges_directly() {
        let rig = Rig::new();
        let mut drive = rig.drive();
        drive.turn_left();
        assert_eq!(rig.left_rev.get(), (MOTOR_DEFAULT_SPEED / 2) as u16);
        assert_eq!(rig.right_fwd.get(), (MOTOR_DEFAULT_SPEED / 2) as u16);

        drive.curve_right();
        assert_eq!(rig.left_fwd.get(), MOTOR_DEFAULT_SPEED as u16);
        assert_eq!(rig.right_fwd.get(), (MOTOR_DEFAULT_SPEED / 3) as u16);
    }
}
