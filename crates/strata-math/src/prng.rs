// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Explicitly seeded `xoroshiro128+` generator.
//!
//! There is no global instance. Every consumer (AI tick, scenario builder,
//! test) owns its generator, so jobs running on different worker threads
//! never share PRNG state.

use crate::fixed::FixedPoint;

/// Stateful `xoroshiro128+` pseudo-random number generator.
///
/// * Not cryptographically secure; use only for simulation.
/// * Matching seeds yield identical sequences on every supported platform.
#[derive(Debug, Clone, Copy)]
pub struct Prng {
    state: [u64; 2],
}

impl Prng {
    /// Constructs a PRNG from two 64-bit seeds.
    pub fn from_seed(seed0: u64, seed1: u64) -> Self {
        let mut state = [seed0, seed1];
        if state[0] == 0 && state[1] == 0 {
            state[0] = 0x9e37_79b9_7f4a_7c15;
        }
        Self { state }
    }

    /// Constructs a PRNG from a single 64-bit seed via SplitMix64 expansion.
    pub fn from_seed_u64(seed: u64) -> Self {
        fn splitmix64(state: &mut u64) -> u64 {
            *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        }

        let mut sm_state = seed;
        Self::from_seed(splitmix64(&mut sm_state), splitmix64(&mut sm_state))
    }

    /// Returns the next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.state[1] = s1.rotate_left(36);

        result
    }

    /// Returns the next integer in the inclusive range `[min, max]`.
    ///
    /// Rejection sampling keeps every value equally likely.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn next_i64(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "invalid range: {min}..={max}");
        let span = (i128::from(max) - i128::from(min)) as u128 + 1;
        if span > u128::from(u64::MAX) {
            return self.next_u64() as i64;
        }
        let span = span as u64;
        if span == 1 {
            return min;
        }

        let value = if span.is_power_of_two() {
            self.next_u64() & (span - 1)
        } else {
            let bound = u64::MAX - u64::MAX % span;
            loop {
                let candidate = self.next_u64();
                if candidate < bound {
                    break candidate % span;
                }
            }
        };

        (i128::from(min) + i128::from(value)) as i64
    }

    /// Returns the next integer in `[min, max]`.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn next_int(&mut self, min: i32, max: i32) -> i32 {
        self.next_i64(i64::from(min), i64::from(max)) as i32
    }

    /// Returns a fixed-point value in `[min, max]`, uniform over raw units.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn next_fixed(&mut self, min: FixedPoint, max: FixedPoint) -> FixedPoint {
        FixedPoint::from_raw(self.next_i64(min.raw(), max.raw()))
    }

    /// Returns `true` with probability `1 / n` (`n == 0` never fires).
    pub fn one_in(&mut self, n: u32) -> bool {
        n != 0 && self.next_i64(0, i64::from(n) - 1) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_int_returns_single_value_for_equal_bounds() {
        let mut prng = Prng::from_seed(42, 99);
        assert_eq!(prng.next_int(7, 7), 7);
    }

    #[test]
    fn matching_seeds_match_sequences() {
        let mut a = Prng::from_seed_u64(0xDEAD_BEEF);
        let mut b = Prng::from_seed_u64(0xDEAD_BEEF);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn next_fixed_stays_in_range() {
        let mut prng = Prng::from_seed(123, 456);
        let lo = FixedPoint::from_int(-2);
        let hi = FixedPoint::from_int(3);
        for _ in 0..256 {
            let v = prng.next_fixed(lo, hi);
            assert!(v >= lo && v <= hi);
        }
    }

    #[test]
    fn zero_seed_is_replaced() {
        let mut prng = Prng::from_seed(0, 0);
        assert_ne!(prng.next_u64(), 0);
    }
}
