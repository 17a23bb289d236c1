//! Randomness for ids and spawn positions
//!
//! Injected as a trait so tests can script exact positions.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::warn;

/// Source of uniform values in [0, 1).
pub trait RandomSource {
    fn next_f32(&mut self) -> f32;

    /// Uniform integer in `lo..=hi`.
    fn range_u32(&mut self, lo: u32, hi: u32) -> u32 {
        let span = (hi - lo + 1) as f32;
        lo + ((self.next_f32() * span) as u32).min(hi - lo)
    }
}

/// Draws taken from the fallback generator, process-wide
static FALLBACK_DRAWS: AtomicU32 = AtomicU32::new(0);

/// Map a 32-bit value to [0, 1) keeping 24 bits of mantissa precision.
fn unit_f32(bits: u32) -> f32 {
    (bits >> 8) as f32 / (1u32 << 24) as f32
}

/// Integer hash (lowbias32) so consecutive counters spread over the range
fn mix32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^ (x >> 16)
}

/// OS-backed randomness (`crypto.getRandomValues` in the browser).
///
/// If the OS source fails, draws come from a hashed process-wide counter
/// so consecutive values still differ.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn next_f32(&mut self) -> f32 {
        let mut buf = [0u8; 4];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => unit_f32(u32::from_le_bytes(buf)),
            Err(e) => {
                let n = FALLBACK_DRAWS.fetch_add(1, Ordering::Relaxed);
                if n == 0 {
                    warn!(error = %e, "OS randomness unavailable, using counter fallback");
                }
                unit_f32(mix32(n))
            }
        }
    }
}

/// Cycles through a fixed list of values.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values = values.into();
        Self {
            values: if values.is_empty() { vec![0.5] } else { values },
            cursor: 0,
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f32(&mut self) -> f32 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_in_unit_interval() {
        let mut rng = SystemRandom;
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn fallback_draws_are_distinct() {
        let draws: Vec<f32> = (0..64).map(|n| unit_f32(mix32(n))).collect();
        assert!(draws.iter().all(|v| (0.0..1.0).contains(v)));
        let mut ids: Vec<u32> = draws.iter().map(|v| (v * 9000.0) as u32).collect();
        ids.sort_unstable();
        ids.dedup();
        assert!(ids.len() > 56);
    }

    #[test]
    fn range_is_inclusive_and_bounded() {
        let mut rng = SequenceRandom::new([0.0, 0.999_999]);
        assert_eq!(rng.range_u32(1000, 9999), 1000);
        assert_eq!(rng.range_u32(1000, 9999), 9999);
    }
}
