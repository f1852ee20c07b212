//! Persisted GPIO assignment map.
//!
//! One byte cell per pin plus a version cell. At boot the map is loaded
//! from storage; a missing or mismatching version silently restores the
//! compile-time defaults and writes them back, so a firmware update that
//! changes the layout never reads stale assignments.

use log::{info, warn};

use crate::config;
use crate::hal::Storage;

pub const PIN_CONFIG_VERSION: u8 = 1;

/// GPIO pin pair of one motor driver channel or one ultrasonic sensor.
pub type PinPair = (u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub motor_y: PinPair,
    pub motor_z: PinPair,
    pub wheel_left: PinPair,
    pub wheel_right: PinPair,
    pub us_front: PinPair,
    pub us_y: PinPair,
    pub us_right: PinPair,
    pub pump_relay: u8,
    pub buzzer: u8,
    pub version: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            motor_y: (config::PIN_MOTOR_Y_IN1, config::PIN_MOTOR_Y_IN2),
            motor_z: (config::PIN_MOTOR_Z_IN1, config::PIN_MOTOR_Z_IN2),
            wheel_left: (config::PIN_WHEEL_L_IN1, config::PIN_WHEEL_L_IN2),
            wheel_right: (config::PIN_WHEEL_R_IN1, config::PIN_WHEEL_R_IN2),
            us_front: (config::PIN_US_FRONT_TRIG, config::PIN_US_FRONT_ECHO),
            us_y: (config::PIN_US_Y_TRIG, config::PIN_US_Y_ECHO),
            us_right: (config::PIN_US_RIGHT_TRIG, config::PIN_US_RIGHT_ECHO),
            pump_relay: config::PIN_PUMP_RELAY,
            buzzer: config::PIN_BUZZER,
            version: PIN_CONFIG_VERSION,
        }
    }
}

impl PinConfig {
    /// Load from storage; on version mismatch or absence the defaults are
    /// restored and saved back.
    pub fn load(store: &mut impl Storage) -> Self {
        match store.get_u8("version") {
            Some(PIN_CONFIG_VERSION) => {}
            Some(other) => {
                warn!("[pin_config] version {} != {}, resetting", other, PIN_CONFIG_VERSION);
                let config = Self::default();
                config.save(store);
                return config;
            }
            None => {
                info!("[pin_config] no saved config, using defaults");
                let config = Self::default();
                config.save(store);
                return config;
            }
        }

        let defaults = Self::default();
        let mut cell = |key: &str, fallback: u8| store.get_u8(key).unwrap_or(fallback);
        Self {
            motor_y: (
                cell("my_p1", defaults.motor_y.0),
                cell("my_p2", defaults.motor_y.1),
            ),
            motor_z: (
                cell("mz_p1", defaults.motor_z.0),
                cell("mz_p2", defaults.motor_z.1),
            ),
            wheel_left: (
                cell("wl_p1", defaults.wheel_left.0),
                cell("wl_p2", defaults.wheel_left.1),
            ),
            wheel_right: (
                cell("wr_p1", defaults.wheel_right.0),
                cell("wr_p2", defaults.wheel_right.1),
            ),
            us_front: (
                cell("usf_t", defaults.us_front.0),
                cell("usf_e", defaults.us_front.1),
            ),
            us_y: (cell("usy_t", defaults.us_y.0), cell("usy_e", defaults.us_y.1)),
            us_right: (
                cell("usr_t", defaults.us_right.0),
                cell("usr_e", defaults.us_right.1),
            ),
            pump_relay: cell("pump", defaults.pump_relay),
            buzzer: cell("buzz", defaults.buzzer),
            version: PIN_CONFIG_VERSION,
        }
    }

    pub fn save(&self, store: &mut impl Storage) {
        store.put_u8("version", self.version);
        store.put_u8("my_p1", self.motor_y.0);
        store.put_u8("my_p2", self.motor_y.1);
        store.put_u8("mz_p1", self.motor_z.0);
        store.put_u8("mz_p2", self.motor_z.1);
        store.put_u8("wl_p1", self.wheel_left.0);
        store.put_u8("wl_p2", self.wheel_left.1);
        store.put_u8("wr_p1", self.wheel_right.0);
        store.put_u8("wr_p2", self.wheel_right.1);
        store.put_u8("usf_t", self.us_front.0);
        store.put_u8("usf_e", self.us_front.1);
        store.put_u8("usy_t", self.us_y.0);
        store.put_u8("usy_e", self.us_y.1);
        store.put_u8("usr_t", self.us_right.0);
        store.put_u8("usr_e", self.us_right.1);
        store.put_u8("pump", self.pump_relay);
        store.put_u8("buzz", self.buzzer);
    }

    /// Swap the wheel driver channels (left <-> right), for harnesses wired
    /// mirror-image.
    pub fn swap_wheels(&mut self) {
        core::mem::swap(&mut self.wheel_left, &mut self.wheel_right);
    }

    /// Swap the Y and Z motor driver channels.
    pub fn swap_arm_motors(&mut self) {
        core::mem::swap(&mut self.motor_y, &mut self.motor_z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MemoryStore;

    #[test]
    fn absent_storage_yields_defaults_and_saves_them() {
        let mut store = MemoryStore::new();
        let config = PinConfig::load(&mut store);
        assert_eq!(config, PinConfig::default());
        // save-back happened
        assert_eq!(store.get_u8("version"), Some(PIN_CONFIG_VERSION));
        assert_eq!(store.get_u8("wl_p1"), Some(config::PIN_WHEEL_L_IN1));
    }

    #[test]
    fn saved_config_round_trips() {
        let mut store = MemoryStore::new();
        let mut config = PinConfig::default();
        config.swap_wheels();
        config.save(&mut store);

        let loaded = PinConfig::load(&mut store);
        assert_eq!(loaded.wheel_left, (config::PIN_WHEEL_R_IN1, config::PIN_WHEEL_R_IN2));
        assert_eq!(loaded.wheel_right, (config::PIN_WHEEL_L_IN1, config::PIN_WHEEL_L_IN2));
    }

    #[test]
    fn version_mismatch_restores_defaults() {
        let mut store = MemoryStore::new();
        let mut config = PinConfig::default();
        config.swap_arm_motors();
        config.version = 0; // stale layout
        config.save(&mut store);

        let loaded = PinConfig::load(&mut store);
        assert_eq!(loaded, PinConfig::default());
        assert_eq!(store.get_u8("version"), Some(PIN_CONFIG_VERSION));
    }
}
