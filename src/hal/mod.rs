//! Thin seams between the control core and the hardware.
//!
//! PWM and GPIO go through the `embedded-hal` traits directly; the only
//! extra abstraction this firmware needs is a monotonic clock with blocking
//! delays ([`Clock`]), because every actuator move in the protocol is a
//! synchronous, acknowledged operation.

#[cfg(target_os = "none")]
pub mod esp;
#[cfg(not(target_os = "none"))]
pub mod mock;

/// Monotonic time plus blocking delays.
///
/// Implementations are cheap handles (`Copy`) so every controller can carry
/// its own. On the target this is backed by the Embassy time driver; tests
/// substitute a simulated clock and step it explicitly.
pub trait Clock {
    fn now_us(&self) -> u64;

    fn delay_us(&mut self, us: u64);

    fn now_ms(&self) -> u64 {
        self.now_us() / 1_000
    }

    fn delay_ms(&mut self, ms: u64) {
        self.delay_us(ms.saturating_mul(1_000));
    }
}

/// Non-volatile byte-cell store, the firmware's view of the ESP32 NVS.
///
/// Keys are short ASCII names, values single bytes; that is all the trim
/// offset and the pin map need. A missing or corrupt cell reads as `None`
/// and callers fall back to defaults.
pub trait Storage {
    fn get_u8(&mut self, key: &str) -> Option<u8>;

    fn put_u8(&mut self, key: &str, value: u8);
}

impl<S: Storage> Storage for &mut S {
    fn get_u8(&mut self, key: &str) -> Option<u8> {
        (**self).get_u8(key)
    }

    fn put_u8(&mut self, key: &str, value: u8) {
        (**self).put_u8(key, value);
    }
}

/// RAM-backed [`Storage`].
///
/// Used by the host tests, and as a volatile stand-in on the target until a
/// flash partition driver is wired up.
// TODO: back this with the NVS partition via esp-storage so trim and the pin
// map survive power cycles on real hardware.
#[derive(Default)]
pub struct MemoryStore {
    cells: heapless::FnvIndexMap<heapless::String<16>, u8, 32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get_u8(&mut self, key: &str) -> Option<u8> {
        let key = heapless::String::<16>::try_from(key).ok()?;
        self.cells.get(&key).copied()
    }

    fn put_u8(&mut self, key: &str, value: u8) {
        let Ok(key) = heapless::String::try_from(key) else {
            log::warn!("[storage] key too long: {}", key);
            return;
        };
        if self.cells.insert(key, value).is_err() {
            log::warn!("[storage] store full, dropping write");
        }
    }
}
