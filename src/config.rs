use core::f32::consts::PI;

// ==================== DEFAULT PIN ASSIGNMENTS ====================
// 4-pin motor drivers, PWM driven directly through IN1/IN2 (no ENA/ENB).

// Wheel motors (differential drive)
pub const PIN_WHEEL_L_IN1: u8 = 32; // PWM forward
pub const PIN_WHEEL_L_IN2: u8 = 33; // PWM backward
pub const PIN_WHEEL_R_IN1: u8 = 17;
pub const PIN_WHEEL_R_IN2: u8 = 16;

// Z-axis arm motor (extend/retract)
pub const PIN_MOTOR_Z_IN1: u8 = 26;
pub const PIN_MOTOR_Z_IN2: u8 = 27;

// Y-axis spray head motor (up/down)
pub const PIN_MOTOR_Y_IN1: u8 = 13;
pub const PIN_MOTOR_Y_IN2: u8 = 2;

// Quadrature encoder on the Z axis
pub const PIN_ENCODER_A: u8 = 35;
pub const PIN_ENCODER_B: u8 = 36;

// Ultrasonic sensors
pub const PIN_US_FRONT_TRIG: u8 = 12;
pub const PIN_US_FRONT_ECHO: u8 = 5;
pub const PIN_US_RIGHT_TRIG: u8 = 18;
pub const PIN_US_RIGHT_ECHO: u8 = 19;
pub const PIN_US_Y_TRIG: u8 = 25;
pub const PIN_US_Y_ECHO: u8 = 23;

// Accessories
pub const PIN_PUMP_RELAY: u8 = 4;
pub const PIN_BUZZER: u8 = 14;

// ==================== DRIVE ====================

/// Cruise speed when a direction command arrives with no speed set (0-255).
pub const MOTOR_DEFAULT_SPEED: i16 = 200;
/// Per-tick change of the ramped speed.
pub const MOTOR_ACCEL_STEP: i16 = 5;
/// Minimum spacing between ramp ticks.
pub const MOTOR_ACCEL_INTERVAL_MS: u64 = 20;
/// Trim offset bounds (signed, applied to one side).
pub const TRIM_LIMIT: i16 = 50;
/// Storage key and bias for the persisted trim offset.
pub const TRIM_KEY: &str = "trim";

// ==================== Z AXIS ====================

pub const MOTOR_Z_SPEED: i16 = 200;
/// Acceptable closed-loop position error (mm).
pub const MOTOR_Z_TOLERANCE_MM: f32 = 2.0;
/// Encoder sampling interval inside the closed loop.
pub const MOTOR_Z_SAMPLE_MS: u64 = 10;
/// Budget for a closed-loop move.
pub const MOTOR_Z_TIMEOUT_MS: u64 = 10_000;

// ==================== Y AXIS ====================

pub const MOTOR_Y_SPEED: i16 = 200;
/// Full-travel duration for the bare up/down commands.
pub const MOTOR_Y_TRAVEL_MS: u64 = 3_000;
/// Acceptable height-seek error (cm).
pub const MOTOR_Y_TOLERANCE_CM: f32 = 2.0;
/// Sensor sampling interval inside the height seek loop.
pub const MOTOR_Y_SAMPLE_MS: u64 = 100;
/// Height seek gives up after this many samples.
pub const MOTOR_Y_MAX_ATTEMPTS: u32 = 50;

// ==================== ENCODER ====================

pub const ENCODER_PPR: f32 = 20.0;
pub const GEAR_RATIO: f32 = 1.0;
pub const SHAFT_DIAMETER_MM: f32 = 30.0;
pub const MM_PER_PULSE: f32 = PI * SHAFT_DIAMETER_MM / (ENCODER_PPR * GEAR_RATIO);

// ==================== ULTRASONIC ====================

/// Distance below which a reading counts as an obstacle (cm).
pub const OBSTACLE_THRESHOLD_CM: f32 = 30.0;
/// Echo timeout; a missing echo reports [`OUT_OF_RANGE_CM`].
pub const US_TIMEOUT_US: u64 = 30_000;
pub const SOUND_SPEED_CM_US: f32 = 0.034;
/// Sentinel reading for "no echo / out of range".
pub const OUT_OF_RANGE_CM: f32 = 999.0;

// Spray head height window over the vertical sensor
pub const Y_MIN_HEIGHT_CM: f32 = 5.0;
pub const Y_MAX_HEIGHT_CM: f32 = 30.0;
pub const Y_TARGET_HEIGHT_CM: f32 = 15.0;
pub const Y_TARGET_TOLERANCE_CM: f32 = 3.0;

// ==================== OBSTACLE AVOIDANCE ====================

pub const AVOID_CHECK_INTERVAL_MS: u64 = 100;
pub const AVOID_BACKUP_DURATION_MS: u64 = 300;
pub const AVOID_TURN_DURATION_MS: u64 = 500;
pub const AVOID_PAUSE_MS: u64 = 100;

// ==================== BUZZER ====================

pub const BUZZER_BEEP_MS: u64 = 100;
pub const BUZZER_PAUSE_MS: u64 = 100;

// ==================== SERIAL ====================

pub const SERIAL_BAUD_RATE: u32 = 115_200;
/// Longest accepted command line; anything longer is discarded whole.
pub const CMD_LINE_SIZE: usize = 128;
