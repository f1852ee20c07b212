//! Command and response vocabulary of the serial protocol.
//!
//! One newline-delimited ASCII line maps to one [`Command`]; every handled
//! command answers with one or two [`Response`] lines through a
//! [`ResponseSink`]. Parsing happens up front so the dispatcher is a single
//! exhaustive `match` instead of a ladder of prefix tests.

use core::fmt::{self, Display, Write};

/// Parsed form of one command line.
///
/// Numeric payloads keep the raw parsed value; range clamping is the
/// receiving controller's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    // Movement (host vocabulary)
    MoveForward,
    MoveBackward,
    MoveStop,
    MoveForwardAt(i32),
    MoveBackwardAt(i32),
    MoveSetSpeed(i32),
    MoveGetSpeed,
    /// Camera-axis alignment nudges: curve right / curve left.
    MoveXForward,
    MoveXBackward,

    // Z-axis arm
    ZOut(f32),
    ZIn(f32),
    ZMoveTo(f32),
    ZHome,
    ZPos,
    ZReset,
    ZEncoderOn,
    ZEncoderOff,

    // Y-axis spray head
    YUp,
    YDown,
    YUpFor(f32),
    YDownFor(f32),
    YStop,

    // Pump
    Spray(f32),
    PumpOn,
    PumpOff,

    // Ultrasonic sensors
    GetDistances,
    CheckObstacles,

    // Obstacle avoidance
    AvoidOn,
    AvoidOff,
    AvoidSetThreshold(i32),

    // Drive primitives
    DriveForward,
    DriveBackward,
    DriveStop,
    DriveEmergencyStop,
    TurnLeft,
    TurnRight,
    CurveLeft,
    CurveRight,
    DriveSpeed(i32),
    TrimSet(i32),
    TrimSave,
    TrimGet,

    // System
    StopAll,
    Status,
    Ping,

    // Buzzer
    Beep,
    BeepTimes(i32),
    BuzzerOn,
    BuzzerOff,
    BuzzerSuccess,
    BuzzerError,
    BuzzerWarning,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseCommandError;

/// Integer payload after the last `:`; malformed text parses to 0.
fn int_arg(line: &str) -> i32 {
    line.rsplit_once(':')
        .map(|(_, v)| v.trim().parse().unwrap_or(0))
        .unwrap_or(0)
}

/// Decimal payload after the last `:`; malformed text parses to 0.0.
fn float_arg(line: &str) -> f32 {
    line.rsplit_once(':')
        .map(|(_, v)| v.trim().parse().unwrap_or(0.0))
        .unwrap_or(0.0)
}

impl TryFrom<&str> for Command {
    type Error = ParseCommandError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let line = value.trim();

        match line {
            "MOVE_FORWARD" => Ok(Self::MoveForward),
            "MOVE_BACKWARD" => Ok(Self::MoveBackward),
            "MOVE_STOP" => Ok(Self::MoveStop),
            "MOVE_GET_SPEED" => Ok(Self::MoveGetSpeed),
            "MOVE_X:FW" => Ok(Self::MoveXForward),
            "MOVE_X:BW" => Ok(Self::MoveXBackward),
            "Z_HOME" => Ok(Self::ZHome),
            "Z_POS" => Ok(Self::ZPos),
            "Z_RESET" => Ok(Self::ZReset),
            "Z_ENC_ON" => Ok(Self::ZEncoderOn),
            "Z_ENC_OFF" => Ok(Self::ZEncoderOff),
            "ACT:Y_UP" => Ok(Self::YUp),
            "ACT:Y_DOWN" => Ok(Self::YDown),
            "Y_STOP" => Ok(Self::YStop),
            "PUMP_ON" => Ok(Self::PumpOn),
            "PUMP_OFF" => Ok(Self::PumpOff),
            "US_GET_DIST" => Ok(Self::GetDistances),
            "US_CHECK" => Ok(Self::CheckObstacles),
            "AVOID_ON" => Ok(Self::AvoidOn),
            "AVOID_OFF" => Ok(Self::AvoidOff),
            "DRIVE_FW" => Ok(Self::DriveForward),
            "DRIVE_BW" => Ok(Self::DriveBackward),
            "DRIVE_STOP" => Ok(Self::DriveStop),
            "DRIVE_ESTOP" => Ok(Self::DriveEmergencyStop),
            "TURN_LEFT" => Ok(Self::TurnLeft),
            "TURN_RIGHT" => Ok(Self::TurnRight),
            "CURVE_LEFT" => Ok(Self::CurveLeft),
            "CURVE_RIGHT" => Ok(Self::CurveRight),
            "TRIM_SAVE" => Ok(Self::TrimSave),
            "TRIM_GET" => Ok(Self::TrimGet),
            "STOP_ALL" => Ok(Self::StopAll),
            "STATUS" => Ok(Self::Status),
            "PING" => Ok(Self::Ping),
            "BEEP" => Ok(Self::Beep),
            "BUZZER_ON" => Ok(Self::BuzzerOn),
            "BUZZER_OFF" => Ok(Self::BuzzerOff),
            "BUZZER_SUCCESS" => Ok(Self::BuzzerSuccess),
            "BUZZER_ERROR" => Ok(Self::BuzzerError),
            "BUZZER_WARNING" => Ok(Self::BuzzerWarning),
            _ if line.starts_with("MOVE_FW:") => Ok(Self::MoveForwardAt(int_arg(line))),
            _ if line.starts_with("MOVE_BW:") => Ok(Self::MoveBackwardAt(int_arg(line))),
            _ if line.starts_with("MOVE_SET_SPEED:") => Ok(Self::MoveSetSpeed(int_arg(line))),
            _ if line.starts_with("ACT:Z_OUT:") => Ok(Self::ZOut(float_arg(line))),
            _ if line.starts_with("ACT:Z_IN:") => Ok(Self::ZIn(float_arg(line))),
            _ if line.starts_with("Z_MOVE:") => Ok(Self::ZMoveTo(float_arg(line))),
            _ if line.starts_with("Y_UP:") => Ok(Self::YUpFor(float_arg(line))),
            _ if line.starts_with("Y_DOWN:") => Ok(Self::YDownFor(float_arg(line))),
            _ if line.starts_with("ACT:SPRAY:") => Ok(Self::Spray(float_arg(line))),
            _ if line.starts_with("AVOID_SET:") => Ok(Self::AvoidSetThreshold(int_arg(line))),
            _ if line.starts_with("DRIVE_SPEED:") => Ok(Self::DriveSpeed(int_arg(line))),
            _ if line.starts_with("TRIM_SET:") => Ok(Self::TrimSet(int_arg(line))),
            _ if line.starts_with("BEEP:") => Ok(Self::BeepTimes(int_arg(line))),
            _ => Err(ParseCommandError),
        }
    }
}

/// One response line, rendered to the wire by its [`Display`] impl.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response<'a> {
    Done,
    Ok,
    Pong,
    Speed(i16),
    Trim(i16),
    /// Z position in cm, two decimals.
    Pos(f32),
    /// Three distances in cm, one decimal, printed in array order. The
    /// sensor query uses front,y,right; the avoidance report front,right,y.
    Dist([f32; 3]),
    /// Obstacle classification code 0..=3.
    Obstacle(u8),
    /// `ERROR:<message>`
    Error(&'a str),
    /// `ERROR:Unknown command: <line>`
    Unknown(&'a str),
}

impl Display for Response<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Done => f.write_str("DONE"),
            Response::Ok => f.write_str("OK"),
            Response::Pong => f.write_str("PONG"),
            Response::Speed(speed) => write!(f, "SPEED:{}", speed),
            Response::Trim(trim) => write!(f, "TRIM:{}", trim),
            Response::Pos(cm) => write!(f, "POS:{:.2}", cm),
            Response::Dist([a, b, c]) => write!(f, "DIST:{:.1},{:.1},{:.1}", a, b, c),
            Response::Obstacle(code) => write!(f, "OBSTACLE:{}", code),
            Response::Error(message) => write!(f, "ERROR:{}", message),
            Response::Unknown(line) => write!(f, "ERROR:Unknown command: {}", line),
        }
    }
}

/// Where the dispatcher and the avoidance loop put their response lines.
pub trait ResponseSink {
    fn send(&mut self, response: Response<'_>);
}

/// [`ResponseSink`] that renders each response into a fixed-size line
/// buffer. The serial task drains it after every dispatch; tests read the
/// rendered lines directly.
#[derive(Default)]
pub struct BufferedSink {
    pub lines: heapless::Vec<heapless::String<160>, 8>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl ResponseSink for BufferedSink {
    fn send(&mut self, response: Response<'_>) {
        let mut line = heapless::String::new();
        if write!(line, "{}", response).is_err() {
            log::warn!("[commands] response line truncated");
        }
        if self.lines.push(line).is_err() {
            log::warn!("[commands] response buffer full, line dropped");
        }
    }
}
