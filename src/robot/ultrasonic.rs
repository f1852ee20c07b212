//! Three-channel ultrasonic ranging (front, right, vertical).
//!
//! All channels share one measurement primitive: a 10 µs trigger pulse,
//! then the echo pulse width is timed with a 30 ms ceiling. A missing echo
//! is not an error — it reads as the 999 cm out-of-range sentinel and flows
//! through the ordinary threshold logic downstream.

use embedded_hal::digital::{InputPin, OutputPin};
use log::trace;

use crate::config::{
    OUT_OF_RANGE_CM, SOUND_SPEED_CM_US, US_TIMEOUT_US, Y_MAX_HEIGHT_CM, Y_MIN_HEIGHT_CM,
    Y_TARGET_HEIGHT_CM, Y_TARGET_TOLERANCE_CM,
};
use crate::hal::Clock;

/// Combined front/right obstacle classification. Wire codes 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstacle {
    None = 0,
    Front = 1,
    Right = 2,
    FrontRight = 3,
}

impl Obstacle {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Threshold test over two live samples.
pub fn classify(front_cm: f32, right_cm: f32, threshold_cm: f32) -> Obstacle {
    let front = front_cm < threshold_cm;
    let right = right_cm < threshold_cm;
    match (front, right) {
        (true, true) => Obstacle::FrontRight,
        (true, false) => Obstacle::Front,
        (false, true) => Obstacle::Right,
        (false, false) => Obstacle::None,
    }
}

struct SensorChannel<O, I> {
    trig: O,
    echo: I,
    last_cm: f32,
}

pub struct UltrasonicArray<O, I, C> {
    front: SensorChannel<O, I>,
    right: SensorChannel<O, I>,
    vertical: SensorChannel<O, I>,
    clock: C,
}

impl<O, I, C> UltrasonicArray<O, I, C>
where
    O: OutputPin,
    I: InputPin,
    C: Clock,
{
    /// Channels are (trigger, echo) pairs: front, right, vertical.
    pub fn new(front: (O, I), right: (O, I), vertical: (O, I), clock: C) -> Self {
        let channel = |(trig, echo)| SensorChannel {
            trig,
            echo,
            last_cm: OUT_OF_RANGE_CM,
        };
        Self {
            front: channel(front),
            right: channel(right),
            vertical: channel(vertical),
            clock,
        }
    }

    fn measure(clock: &mut C, channel: &mut SensorChannel<O, I>) -> f32 {
        // trigger pulse
        let _ = channel.trig.set_low();
        clock.delay_us(2);
        let _ = channel.trig.set_high();
        clock.delay_us(10);
        let _ = channel.trig.set_low();

        // wait for the echo to start
        let deadline = clock.now_us() + US_TIMEOUT_US;
        while !channel.echo.is_high().unwrap_or(false) {
            if clock.now_us() > deadline {
                channel.last_cm = OUT_OF_RANGE_CM;
                return OUT_OF_RANGE_CM;
            }
        }

        // time the pulse itself
        let rise = clock.now_us();
        while channel.echo.is_high().unwrap_or(false) {
            if clock.now_us() > rise + US_TIMEOUT_US {
                channel.last_cm = OUT_OF_RANGE_CM;
                return OUT_OF_RANGE_CM;
            }
        }
        let width = clock.now_us() - rise;

        let distance = width as f32 * SOUND_SPEED_CM_US / 2.0;
        trace!("[ultrasonic] echo {} us -> {:.1} cm", width, distance);
        channel.last_cm = distance;
        distance
    }

    // === Live reads (each one triggers a fresh measurement) ===

    pub fn front_distance(&mut self) -> f32 {
        Self::measure(&mut self.clock, &mut self.front)
    }

    pub fn right_distance(&mut self) -> f32 {
        Self::measure(&mut self.clock, &mut self.right)
    }

    pub fn y_distance(&mut self) -> f32 {
        Self::measure(&mut self.clock, &mut self.vertical)
    }

    /// Cached readings (front, right, y) from the most recent measurements.
    pub fn last_distances(&self) -> (f32, f32, f32) {
        (self.front.last_cm, self.right.last_cm, self.vertical.last_cm)
    }

    // === Obstacle detection (front + right) ===

    pub fn check_obstacles(&mut self, threshold_cm: f32) -> Obstacle {
        let front = self.front_distance();
        let right = self.right_distance();
        classify(front, right, threshold_cm)
    }

    // === Spray head height window (vertical channel) ===

    pub fn is_y_too_close(&mut self) -> bool {
        self.y_distance() < Y_MIN_HEIGHT_CM
    }

    pub fn is_y_too_far(&mut self) -> bool {
        self.y_distance() > Y_MAX_HEIGHT_CM
    }

    pub fn is_y_at_target(&mut self) -> bool {
        let distance = self.y_distance();
        (Y_TARGET_HEIGHT_CM - Y_TARGET_TOLERANCE_CM..=Y_TARGET_HEIGHT_CM + Y_TARGET_TOLERANCE_CM)
            .contains(&distance)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::hal::mock::{MockClock, MockEcho, MockPin};

    struct Rig {
        now_us: Cell<u64>,
        trig: [Cell<bool>; 3],
    }

    impl Rig {
        fn new() -> Self {
            Self {
                now_us: Cell::new(0),
                trig: [Cell::new(false), Cell::new(false), Cell::new(false)],
            }
        }

        fn array(&self) -> UltrasonicArray<MockPin<'_>, MockEcho<'_>, MockClock<'_>> {
            UltrasonicArray::new(
                (MockPin::new(&self.trig[0]), MockEcho::new(&self.now_us)),
                (MockPin::new(&self.trig[1]), MockEcho::new(&self.now_us)),
                (MockPin::new(&self.trig[2]), MockEcho::new(&self.now_us)),
                MockClock::new(&self.now_us),
            )
        }
    }

    #[test]
    fn classification_truth_table() {
        assert_eq!(classify(20.0, 50.0, 30.0), Obstacle::Front);
        assert_eq!(classify(50.0, 20.0, 30.0), Obstacle::Right);
        assert_eq!(classify(10.0, 10.0, 30.0), Obstacle::FrontRight);
        assert_eq!(classify(50.0, 50.0, 30.0), Obstacle::None);
        assert_eq!(Obstacle::Front.code(), 1);
        assert_eq!(Obstacle::FrontRight.code(), 3);
    }

    #[test]
    fn echo_width_converts_to_distance() {
        let rig = Rig::new();
        let front_echo = MockEcho::new(&rig.now_us);
        front_echo.set_distance_cm(20.0); // 2*20/0.034 us echo pulse
        let mut array = UltrasonicArray::new(
            (MockPin::new(&rig.trig[0]), front_echo),
            (MockPin::new(&rig.trig[1]), MockEcho::new(&rig.now_us)),
            (MockPin::new(&rig.trig[2]), MockEcho::new(&rig.now_us)),
            MockClock::new(&rig.now_us),
        );

        let distance = array.front_distance();
        assert!((distance - 20.0).abs() < 0.5, "got {}", distance);
        // a second measurement sees a fresh pulse
        let distance = array.front_distance();
        assert!((distance - 20.0).abs() < 0.5, "got {}", distance);

        // unscripted channel times out to the sentinel
        let distance = array.right_distance();
        assert_eq!(distance, OUT_OF_RANGE_CM);
        assert_eq!(array.last_distances().1, OUT_OF_RANGE_CM);
    }

    #[test]
    fn height_window_helpers() {
        let rig = Rig::new();
        // sentinel reading: clearly too far, not at target
        let mut array = rig.array();
        assert!(!array.is_y_too_close());
        let mut array = rig.array();
        assert!(array.is_y_too_far());
        let mut array = rig.array();
        assert!(!array.is_y_at_target());
    }
}
