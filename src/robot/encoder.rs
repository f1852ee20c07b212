//! Quadrature pulse counter for the Z-axis motor.
//!
//! The counter is the only state shared between the main flow and an
//! interrupt context (the channel-A edge handler), so every access goes
//! through a critical section — the Rust analogue of the classic
//! disable-interrupts / read / re-enable bracket. Direction comes from the
//! phase relation: on a channel-A edge, B differing from the new A level
//! means forward rotation.

use core::cell::Cell;

use critical_section::Mutex;

use crate::config::MM_PER_PULSE;

/// Interrupt-shared pulse count. Lives in a `static` and is fed by the GPIO
/// edge handler via [`PulseCounter::on_edge`]; everything else reads it
/// through [`PulseCounter::snapshot`].
pub struct PulseCounter {
    pulses: Mutex<Cell<i64>>,
    last_a: Mutex<Cell<bool>>,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            pulses: Mutex::new(Cell::new(0)),
            last_a: Mutex::new(Cell::new(false)),
        }
    }

    /// Feed one sample of both channel levels. Call on every electrical
    /// transition of channel A (rising and falling).
    pub fn on_edge(&self, a: bool, b: bool) {
        critical_section::with(|cs| {
            let last_a = self.last_a.borrow(cs);
            if a != last_a.get() {
                let pulses = self.pulses.borrow(cs);
                if b != a {
                    pulses.set(pulses.get() + 1); // extending
                } else {
                    pulses.set(pulses.get() - 1); // retracting
                }
                last_a.set(a);
            }
        });
    }

    /// Consistent read of the count; never observes a half-written value.
    pub fn snapshot(&self) -> i64 {
        critical_section::with(|cs| self.pulses.borrow(cs).get())
    }

    pub fn set(&self, pulses: i64) {
        critical_section::with(|cs| self.pulses.borrow(cs).set(pulses));
    }

    pub fn reset(&self) {
        self.set(0);
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Position view over a [`PulseCounter`], in pulses, mm and cm.
pub struct Encoder {
    counter: &'static PulseCounter,
}

impl Encoder {
    pub fn new(counter: &'static PulseCounter) -> Self {
        Self { counter }
    }

    pub fn position(&self) -> i64 {
        self.counter.snapshot()
    }

    pub fn position_mm(&self) -> f32 {
        self.position() as f32 * MM_PER_PULSE
    }

    pub fn position_cm(&self) -> f32 {
        self.position_mm() / 10.0
    }

    pub fn reset(&mut self) {
        self.counter.reset();
        log::info!("[encoder] position reset to 0");
    }

    pub fn set_position(&mut self, pulses: i64) {
        self.counter.set(pulses);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk the counter through `n` full quadrature steps. Forward steps are
    /// A-edges where B holds the opposite level of the new A.
    fn step(counter: &PulseCounter, n: i64, forward: bool) {
        let mut a = false;
        for _ in 0..n {
            a = !a;
            let b = if forward { !a } else { a };
            counter.on_edge(a, b);
        }
    }

    #[test]
    fn forward_edges_count_up() {
        static COUNTER: PulseCounter = PulseCounter::new();
        step(&COUNTER, 10, true);
        assert_eq!(COUNTER.snapshot(), 10);
    }

    #[test]
    fn reverse_edges_count_down() {
        static COUNTER: PulseCounter = PulseCounter::new();
        step(&COUNTER, 7, false);
        assert_eq!(COUNTER.snapshot(), -7);
    }

    #[test]
    fn repeated_level_is_ignored() {
        static COUNTER: PulseCounter = PulseCounter::new();
        COUNTER.on_edge(true, false);
        COUNTER.on_edge(true, false); // no transition, no count
        assert_eq!(COUNTER.snapshot(), 1);
    }

    #[test]
    fn position_converts_to_mm_and_cm() {
        static COUNTER: PulseCounter = PulseCounter::new();
        let mut encoder = Encoder::new(&COUNTER);
        encoder.set_position(20); // one full revolution
        let expected_mm = 20.0 * MM_PER_PULSE;
        assert!((encoder.position_mm() - expected_mm).abs() < 1e-4);
        assert!((encoder.position_cm() - expected_mm / 10.0).abs() < 1e-5);
        encoder.reset();
        assert_eq!(encoder.position(), 0);
    }
}
