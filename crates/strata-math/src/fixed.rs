// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic Q43.20 fixed-point scalar.
//!
//! The representation is an `i64` storing an integer scaled by `2^20`:
//! `real_value = raw / 2^20`. Every operation is a pure function of the raw
//! integers involved, so identical inputs produce bit-identical outputs on
//! every platform. Native floating point is never touched.
//!
//! Rounding policy:
//! - Multiplication and division widen to `i128`, then round to nearest with
//!   ties-to-even at the Q43.20 boundary.
//! - Results outside the `i64` range saturate in the operator impls; the
//!   `checked_*` variants report overflow as `None` instead.
//! - `sqrt` returns the exact floor of the real square root at Q43.20.

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::error::MathError;

/// Number of fractional bits in the Q43.20 encoding.
pub const FRAC_BITS: u32 = 20;

/// The raw integer value corresponding to `1.0`.
const ONE_RAW: i64 = 1_i64 << FRAC_BITS;

fn saturate_i128_to_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value.is_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Shifts a wide product back down to Q43.20, rounding ties to even.
fn round_rescale(prod: i128) -> i128 {
    let abs: u128 = prod.unsigned_abs();
    let q = abs >> FRAC_BITS;
    let r = abs & ((1_u128 << FRAC_BITS) - 1);
    let half = 1_u128 << (FRAC_BITS - 1);

    let mut rounded = q;
    if r > half || (r == half && (q & 1) == 1) {
        rounded = rounded.saturating_add(1);
    }

    let rounded = i128::try_from(rounded).unwrap_or(i128::MAX);
    if prod.is_negative() {
        -rounded
    } else {
        rounded
    }
}

/// Rounded wide division (ties to even). `den` must be non-zero.
pub(crate) fn div_round(num: i128, den: i128) -> i128 {
    let abs_num = num.unsigned_abs();
    let abs_den = den.unsigned_abs();
    let q = abs_num / abs_den;
    let r = abs_num % abs_den;

    let mut rounded = q;
    let twice_r = r.saturating_mul(2);
    if twice_r > abs_den || (twice_r == abs_den && (q & 1) == 1) {
        rounded = rounded.saturating_add(1);
    }

    let rounded = i128::try_from(rounded).unwrap_or(i128::MAX);
    if (num < 0) ^ (den < 0) {
        -rounded
    } else {
        rounded
    }
}

/// Exact floor square root of a non-negative wide integer.
///
/// Newton iteration on integers, seeded from the bit length so the first
/// guess is never below the root.
fn isqrt_u128(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x = 1_u128 << bits.div_ceil(2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Signed Q43.20 fixed-point scalar.
///
/// Immutable and `Copy`; ordering and equality compare the raw integers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FixedPoint(i64);

impl FixedPoint {
    /// Additive identity.
    pub const ZERO: Self = Self(0);
    /// Multiplicative identity.
    pub const ONE: Self = Self(ONE_RAW);
    /// `0.5`.
    pub const HALF: Self = Self(ONE_RAW >> 1);
    /// Smallest positive value (one raw unit, `2^-20`).
    pub const EPSILON: Self = Self(1);
    /// Largest representable value.
    pub const MAX: Self = Self(i64::MAX);
    /// Smallest representable value.
    pub const MIN: Self = Self(i64::MIN);

    /// Constructs a value from an integer, saturating outside the Q43 range.
    #[must_use]
    pub const fn from_int(n: i64) -> Self {
        Self(n.saturating_mul(ONE_RAW))
    }

    /// Constructs directly from raw Q43.20 bits (no scaling).
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw Q43.20 representation.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Constructs `num / den`.
    pub fn from_ratio(num: i64, den: i64) -> Result<Self, MathError> {
        Self::from_int(num).try_div(Self::from_int(den))
    }

    /// Division that reports a zero divisor instead of saturating.
    pub fn try_div(self, rhs: Self) -> Result<Self, MathError> {
        if rhs.0 == 0 {
            return Err(MathError::DivisionByZero);
        }
        let num = i128::from(self.0) << FRAC_BITS;
        Ok(Self(saturate_i128_to_i64(div_round(num, i128::from(rhs.0)))))
    }

    /// Multiplication that reports overflow as `None`.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let wide = round_rescale(i128::from(self.0) * i128::from(rhs.0));
        i64::try_from(wide).ok().map(Self)
    }

    /// Addition that reports overflow as `None`.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Subtraction that reports overflow as `None`.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Computes `a1 * b1 + a2 * b2` in a single wide accumulator.
    ///
    /// Only the final sum is rescaled, so the two products do not each pick up
    /// a rounding error. Returns `None` when the result leaves the `i64` range.
    pub fn dot2(a1: Self, b1: Self, a2: Self, b2: Self) -> Option<Self> {
        let sum = (i128::from(a1.0) * i128::from(b1.0))
            .checked_add(i128::from(a2.0) * i128::from(b2.0))?;
        Self::from_wide(sum)
    }

    /// Computes `self * mul / div` with a single rounding step.
    ///
    /// `None` for a zero divisor or a result outside the `i64` range.
    pub fn mul_div(self, mul: Self, div: Self) -> Option<Self> {
        if div.0 == 0 {
            return None;
        }
        let num = i128::from(self.0) * i128::from(mul.0);
        i64::try_from(div_round(num, i128::from(div.0))).ok().map(Self)
    }

    /// Rescales a value carried at the doubled `2^40` scale (the product of two
    /// raw values) back to Q43.20. `None` when the result leaves the `i64` range.
    pub fn from_wide(wide: i128) -> Option<Self> {
        i64::try_from(round_rescale(wide)).ok().map(Self)
    }

    /// Like [`FixedPoint::from_wide`], saturating instead of failing.
    pub fn from_wide_saturating(wide: i128) -> Self {
        Self(saturate_i128_to_i64(round_rescale(wide)))
    }

    /// Square root, exact floor at Q43.20.
    pub fn sqrt(self) -> Result<Self, MathError> {
        if self.0 < 0 {
            return Err(MathError::NegativeSqrt);
        }
        // sqrt(raw / 2^20) * 2^20 == sqrt(raw * 2^20)
        let scaled = u128::from(self.0.unsigned_abs()) << FRAC_BITS;
        let root = isqrt_u128(scaled);
        Ok(Self(saturate_i128_to_i64(i128::try_from(root).unwrap_or(i128::MAX))))
    }

    /// Square root of a raw value already carried at the doubled `2^40` scale.
    ///
    /// Used for magnitudes accumulated in `i128` (`x_raw² + y_raw²`) so the
    /// sum never has to be narrowed before the root is taken. Returns `None`
    /// for negative input or a root outside the `i64` range.
    pub fn sqrt_wide(wide: i128) -> Option<Self> {
        if wide < 0 {
            return None;
        }
        let root = isqrt_u128(wide.unsigned_abs());
        i64::try_from(root).ok().map(Self)
    }

    /// Absolute value (saturating at `MAX`).
    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Returns `-1`, `0`, or `1` as a plain integer.
    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    /// Returns the smaller of two values.
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    /// Returns the larger of two values.
    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }

    /// Returns `true` for exactly zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` for strictly negative values.
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Largest integer not greater than `self`, as a fixed-point value.
    pub fn floor(self) -> Self {
        Self(self.0 & !(ONE_RAW - 1))
    }

    /// Number of whole `step`s contained in `self`, rounded toward negative
    /// infinity. `None` for a zero step.
    ///
    /// Works on the raw integers directly, so `step * quotient` is exact.
    pub fn floor_steps(self, step: Self) -> Option<i64> {
        if step.0 == 0 {
            return None;
        }
        let q = self.0.div_euclid(step.0);
        // div_euclid rounds toward -inf only for positive divisors.
        if step.0 < 0 && self.0.rem_euclid(step.0) != 0 {
            return Some(q - 1);
        }
        Some(q)
    }

    /// Multiplies by a plain integer, saturating.
    pub fn mul_int(self, n: i64) -> Self {
        Self(self.0.saturating_mul(n))
    }

    /// Halves the value (arithmetic shift, rounds toward negative infinity).
    pub fn half(self) -> Self {
        Self(self.0 >> 1)
    }

    /// Doubles the value, saturating.
    pub fn double(self) -> Self {
        Self(self.0.saturating_mul(2))
    }
}

impl Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(saturate_i128_to_i64(round_rescale(
            i128::from(self.0) * i128::from(rhs.0),
        )))
    }
}

/// Saturating division.
///
/// A zero divisor saturates toward the sign of the dividend (`0 / 0 == 0`)
/// rather than panicking; use [`FixedPoint::try_div`] where a zero divisor
/// must be reported.
impl Div for FixedPoint {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        match self.try_div(rhs) {
            Ok(v) => v,
            Err(_) if self.0 == 0 => Self::ZERO,
            Err(_) if self.0 < 0 => Self::MIN,
            Err(_) => Self::MAX,
        }
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.checked_neg().unwrap_or(i64::MAX))
    }
}

impl AddAssign for FixedPoint {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixedPoint {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl From<i32> for FixedPoint {
    fn from(n: i32) -> Self {
        Self::from_int(i64::from(n))
    }
}

/// Decimal rendering computed with integers only (six fractional digits,
/// truncated).
impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neg = self.0 < 0;
        let abs = self.0.unsigned_abs();
        let whole = abs >> FRAC_BITS;
        let frac = abs & ((1_u64 << FRAC_BITS) - 1);
        let micros = (u128::from(frac) * 1_000_000) >> FRAC_BITS;
        write!(f, "{}{whole}.{micros:06}", if neg { "-" } else { "" })
    }
}
