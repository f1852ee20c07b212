//! Reactive obstacle avoidance over the drive and the ultrasonic array.
//!
//! No persistent state machine: each call re-evaluates the sensors from
//! scratch. The only memory is the enable flag, the configured threshold
//! and the rate-limit timestamp. Only a front and a right sensor exist, so
//! every maneuver escapes to the left.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::info;

use crate::config::{
    AVOID_BACKUP_DURATION_MS, AVOID_CHECK_INTERVAL_MS, AVOID_PAUSE_MS, AVOID_TURN_DURATION_MS,
    MOTOR_DEFAULT_SPEED, OBSTACLE_THRESHOLD_CM,
};
use crate::hal::Clock;
use crate::robot::commands::{Response, ResponseSink};
use crate::robot::drive::Drive;
use crate::robot::ultrasonic::{Obstacle, UltrasonicArray};

pub struct ObstacleAvoidance<C> {
    clock: C,
    enabled: bool,
    threshold_cm: f32,
    last_check_ms: u64,
}

impl<C> ObstacleAvoidance<C>
where
    C: Clock,
{
    /// Starts disabled; the host opts in with `AVOID_ON`.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            enabled: false,
            threshold_cm: OBSTACLE_THRESHOLD_CM,
            last_check_ms: 0,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        info!("[avoid] enabled");
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        info!("[avoid] disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_threshold(&mut self, cm: i32) {
        self.threshold_cm = cm as f32;
        info!("[avoid] threshold set to {} cm", cm);
    }

    /// Poll the sensors and, when something is in the way, run the fixed
    /// escape maneuver for the classification. Returns whether a maneuver
    /// ran. Self-rate-limited to one check per 100 ms; disabled or
    /// rate-limited calls are no-ops.
    pub fn check_and_avoid<P, O, I, C2, C3>(
        &mut self,
        drive: &mut Drive<P, C2>,
        sensors: &mut UltrasonicArray<O, I, C3>,
        sink: &mut impl ResponseSink,
    ) -> bool
    where
        P: SetDutyCycle,
        O: OutputPin,
        I: InputPin,
        C2: Clock,
        C3: Clock,
    {
        if !self.enabled {
            return false;
        }

        let now = self.clock.now_ms();
        if now.wrapping_sub(self.last_check_ms) < AVOID_CHECK_INTERVAL_MS {
            return false;
        }
        self.last_check_ms = now;

        let obstacle = sensors.check_obstacles(self.threshold_cm);
        match obstacle {
            Obstacle::None => return false,
            Obstacle::Front | Obstacle::FrontRight => {
                info!("[avoid] {:?}: backing up and turning left", obstacle);
                self.avoid_front(drive);
            }
            Obstacle::Right => {
                info!("[avoid] right: slight left turn");
                self.avoid_right(drive);
            }
        }

        // report where things stand; note the front,right,y field order
        let (front, right, y) = sensors.last_distances();
        sink.send(Response::Dist([front, right, y]));
        true
    }

    /// Obstacle ahead: stop, back off, rotate left in place, end stopped.
    fn avoid_front<P, C2>(&mut self, drive: &mut Drive<P, C2>)
    where
        P: SetDutyCycle,
        C2: Clock,
    {
        drive.emergency_stop();
        self.clock.delay_ms(AVOID_PAUSE_MS);

        drive.drive_sides(-MOTOR_DEFAULT_SPEED, -MOTOR_DEFAULT_SPEED);
        self.clock.delay_ms(AVOID_BACKUP_DURATION_MS);
        drive.emergency_stop();
        self.clock.delay_ms(AVOID_PAUSE_MS);

        drive.turn_left();
        self.clock.delay_ms(AVOID_TURN_DURATION_MS);
        drive.emergency_stop();
    }

    /// Obstacle to the right only: curve away briefly, then resume forward.
    fn avoid_right<P, C2>(&mut self, drive: &mut Drive<P, C2>)
    where
        P: SetDutyCycle,
        C2: Clock,
    {
        drive.emergency_stop();
        self.clock.delay_ms(AVOID_PAUSE_MS);

        drive.curve_left();
        self.clock.delay_ms(AVOID_TURN_DURATION_MS / 2);
        drive.forward();
    }
}
