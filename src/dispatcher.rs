//! Serial command dispatch.
//!
//! One entry point per received line: parse into a [`Command`], run exactly
//! one controller operation, answer through the sink. Unknown or malformed
//! lines produce an `ERROR:` echo and leave every actuator untouched. The
//! idle-loop work (drive ramp, avoidance check) lives in [`Dispatcher::tick`]
//! and must be called between lines.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::config::OBSTACLE_THRESHOLD_CM;
use crate::hal::{Clock, Storage};
use crate::robot::avoidance::ObstacleAvoidance;
use crate::robot::buzzer::Buzzer;
use crate::robot::commands::{Command, Response, ResponseSink};
use crate::robot::drive::Drive;
use crate::robot::motor_y::MotorY;
use crate::robot::motor_z::MotorZ;
use crate::robot::pump::Pump;
use crate::robot::ultrasonic::UltrasonicArray;

/// Owns every controller and routes commands to them.
///
/// `P` is the PWM pin type of the motor bridges, `O`/`I` the digital pin
/// types of the sensor array and accessories, `C` the clock handle and `S`
/// the non-volatile store.
pub struct Dispatcher<P, O, I, C, S> {
    drive: Drive<P, C>,
    motor_z: MotorZ<P, C>,
    motor_y: MotorY<P, C>,
    sensors: UltrasonicArray<O, I, C>,
    avoidance: ObstacleAvoidance<C>,
    pump: Pump<O, C>,
    buzzer: Buzzer<O, C>,
    storage: S,
}

impl<P, O, I, C, S> Dispatcher<P, O, I, C, S>
where
    P: SetDutyCycle,
    O: OutputPin,
    I: InputPin,
    C: Clock,
    S: Storage,
{
    /// Wire the controllers together and restore persisted trim.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mut drive: Drive<P, C>,
        motor_z: MotorZ<P, C>,
        motor_y: MotorY<P, C>,
        sensors: UltrasonicArray<O, I, C>,
        avoidance: ObstacleAvoidance<C>,
        pump: Pump<O, C>,
        buzzer: Buzzer<O, C>,
        mut storage: S,
    ) -> Self {
        drive.load_trim(&mut storage);
        Self {
            drive,
            motor_z,
            motor_y,
            sensors,
            avoidance,
            pump,
            buzzer,
            storage,
        }
    }

    /// Process one command line. Blocks for the whole operation, including
    /// any timed or closed-loop move, then acknowledges.
    pub fn handle(&mut self, line: &str, sink: &mut impl ResponseSink) {
        let line = line.trim();
        debug!("[dispatcher] <- {}", line);

        let Ok(command) = Command::try_from(line) else {
            sink.send(Response::Unknown(line));
            return;
        };

        match command {
            // === Movement ===
            Command::MoveForward => {
                self.drive.forward();
                sink.send(Response::Done);
            }
            Command::MoveBackward => {
                self.drive.backward();
                sink.send(Response::Done);
            }
            Command::MoveStop => {
                self.drive.stop();
                sink.send(Response::Done);
            }
            Command::MoveForwardAt(speed) => {
                self.drive.set_speed(speed);
                self.drive.forward();
                sink.send(Response::Done);
            }
            Command::MoveBackwardAt(speed) => {
                self.drive.set_speed(speed);
                self.drive.backward();
                sink.send(Response::Done);
            }
            Command::MoveSetSpeed(speed) => {
                self.drive.set_speed(speed);
                sink.send(Response::Done);
            }
            Command::MoveGetSpeed => {
                sink.send(Response::Speed(self.drive.speed()));
            }
            Command::MoveXForward => {
                self.drive.curve_right();
                sink.send(Response::Done);
            }
            Command::MoveXBackward => {
                self.drive.curve_left();
                sink.send(Response::Done);
            }

            // === Z axis ===
            Command::ZOut(seconds) => {
                self.motor_z.extend(seconds);
                sink.send(Response::Done);
            }
            Command::ZIn(seconds) => {
                self.motor_z.retract(seconds);
                sink.send(Response::Done);
            }
            Command::ZMoveTo(cm) => {
                match self.motor_z.move_to_cm(cm) {
                    Ok(()) => sink.send(Response::Pos(self.motor_z.position_cm())),
                    Err(_) => sink.send(Response::Error("Move failed or timeout")),
                }
                sink.send(Response::Done);
            }
            Command::ZHome => {
                if self.motor_z.move_to_cm(0.0).is_ok() {
                    self.motor_z.reset_position();
                }
                sink.send(Response::Done);
            }
            Command::ZPos => {
                sink.send(Response::Pos(self.motor_z.position_cm()));
            }
            Command::ZReset => {
                self.motor_z.reset_position();
                sink.send(Response::Done);
            }
            Command::ZEncoderOn => {
                self.motor_z.enable_encoder_mode();
                sink.send(Response::Done);
            }
            Command::ZEncoderOff => {
                self.motor_z.disable_encoder_mode();
                sink.send(Response::Done);
            }

            // === Y axis ===
            Command::YUp => {
                self.motor_y.up();
                sink.send(Response::Done);
            }
            Command::YDown => {
                self.motor_y.down();
                sink.send(Response::Done);
            }
            Command::YUpFor(seconds) => {
                self.motor_y.up_for(seconds);
                sink.send(Response::Done);
            }
            Command::YDownFor(seconds) => {
                self.motor_y.down_for(seconds);
                sink.send(Response::Done);
            }
            Command::YStop => {
                self.motor_y.stop();
                sink.send(Response::Done);
            }

            // === Pump ===
            Command::Spray(seconds) => {
                self.pump.spray(seconds);
                sink.send(Response::Done);
            }
            Command::PumpOn => {
                self.pump.on();
                sink.send(Response::Done);
            }
            Command::PumpOff => {
                self.pump.off();
                sink.send(Response::Done);
            }

            // === Ultrasonic ===
            Command::GetDistances => {
                let front = self.sensors.front_distance();
                let y = self.sensors.y_distance();
                let right = self.sensors.right_distance();
                sink.send(Response::Dist([front, y, right]));
            }
            Command::CheckObstacles => {
                let obstacle = self.sensors.check_obstacles(OBSTACLE_THRESHOLD_CM);
                sink.send(Response::Obstacle(obstacle.code()));
            }

            // === Obstacle avoidance ===
            Command::AvoidOn => {
                self.avoidance.enable();
                sink.send(Response::Done);
            }
            Command::AvoidOff => {
                self.avoidance.disable();
                sink.send(Response::Done);
            }
            Command::AvoidSetThreshold(cm) => {
                self.avoidance.set_threshold(cm);
                sink.send(Response::Done);
            }

            // === Drive primitives ===
            Command::DriveForward => {
                self.drive.forward();
                sink.send(Response::Done);
            }
            Command::DriveBackward => {
                self.drive.backward();
                sink.send(Response::Done);
            }
            Command::DriveStop => {
                self.drive.stop();
                sink.send(Response::Done);
            }
            Command::DriveEmergencyStop => {
                self.drive.emergency_stop();
                sink.send(Response::Done);
            }
            Command::TurnLeft => {
                self.drive.turn_left();
                sink.send(Response::Done);
            }
            Command::TurnRight => {
                self.drive.turn_right();
                sink.send(Response::Done);
            }
            Command::CurveLeft => {
                self.drive.curve_left();
                sink.send(Response::Done);
            }
            Command::CurveRight => {
                self.drive.curve_right();
                sink.send(Response::Done);
            }
            Command::DriveSpeed(speed) => {
                self.drive.set_speed(speed);
                sink.send(Response::Done);
            }
            Command::TrimSet(offset) => {
                self.drive.set_trim(offset);
                sink.send(Response::Done);
            }
            Command::TrimSave => {
                self.drive.save_trim(&mut self.storage);
                sink.send(Response::Done);
            }
            Command::TrimGet => {
                sink.send(Response::Trim(self.drive.trim()));
            }

            // === System ===
            Command::StopAll => {
                self.stop_all();
                sink.send(Response::Done);
            }
            Command::Status => {
                sink.send(Response::Ok);
            }
            Command::Ping => {
                sink.send(Response::Pong);
            }

            // === Buzzer ===
            Command::Beep => {
                self.buzzer.beep();
                sink.send(Response::Done);
            }
            Command::BeepTimes(times) => {
                self.buzzer.beep_times(times.max(0) as u32);
                sink.send(Response::Done);
            }
            Command::BuzzerOn => {
                self.buzzer.on();
                sink.send(Response::Done);
            }
            Command::BuzzerOff => {
                self.buzzer.off();
                sink.send(Response::Done);
            }
            Command::BuzzerSuccess => {
                self.buzzer.play_success();
                sink.send(Response::Done);
            }
            Command::BuzzerError => {
                self.buzzer.play_error();
                sink.send(Response::Done);
            }
            Command::BuzzerWarning => {
                self.buzzer.play_warning();
                sink.send(Response::Done);
            }
        }
    }

    /// Idle-loop pass: advance the drive ramp and let the avoidance loop
    /// poll. Call on every pass, not only after movement commands, so speed
    /// changes stay smooth while the line is quiet.
    pub fn tick(&mut self, sink: &mut impl ResponseSink) {
        self.drive.update();
        self.avoidance
            .check_and_avoid(&mut self.drive, &mut self.sensors, sink);
    }

    /// Halt every actuator and disable avoidance.
    pub fn stop_all(&mut self) {
        self.motor_z.stop();
        self.motor_y.stop();
        self.drive.emergency_stop();
        self.pump.off();
        self.avoidance.disable();
    }

    /// Startup feedback once the boot sequence is through.
    pub fn announce_ready(&mut self) {
        self.buzzer.play_startup();
    }
}
