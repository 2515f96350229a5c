// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use proptest::prelude::*;

use strata_math::{FixedPoint, MathError, Vector};

// Raw values kept well inside Q43.20 so products stay representable.
fn raw_scalar() -> impl Strategy<Value = i64> {
    -(1_i64 << 40)..(1_i64 << 40)
}

#[test]
fn integer_arithmetic_is_exact() {
    let a = FixedPoint::from_int(7);
    let b = FixedPoint::from_int(-3);
    assert_eq!(a + b, FixedPoint::from_int(4));
    assert_eq!(a - b, FixedPoint::from_int(10));
    assert_eq!(a * b, FixedPoint::from_int(-21));
    assert_eq!(FixedPoint::from_int(21).try_div(b), Ok(FixedPoint::from_int(-7)));
}

#[test]
fn division_by_zero_is_reported() {
    assert_eq!(
        FixedPoint::ONE.try_div(FixedPoint::ZERO),
        Err(MathError::DivisionByZero)
    );
    assert_eq!(FixedPoint::from_ratio(1, 0), Err(MathError::DivisionByZero));
    // The operator saturates instead.
    assert_eq!(FixedPoint::ONE / FixedPoint::ZERO, FixedPoint::MAX);
    assert_eq!(FixedPoint::ZERO / FixedPoint::ZERO, FixedPoint::ZERO);
}

#[test]
fn ratio_of_quarter_is_exact() {
    let quarter = FixedPoint::from_ratio(1, 4).unwrap();
    assert_eq!(quarter.raw(), 1 << 18);
}

#[test]
fn sqrt_of_perfect_squares_is_exact() {
    for n in [0_i64, 1, 4, 9, 144, 1 << 20] {
        let root = FixedPoint::from_int(n * n).sqrt().unwrap();
        assert_eq!(root, FixedPoint::from_int(n));
    }
    assert_eq!(FixedPoint::from_int(-1).sqrt(), Err(MathError::NegativeSqrt));
}

#[test]
fn try_magnitude_of_three_four_five() {
    let v = Vector::from_ints(3, 4);
    assert_eq!(v.try_magnitude(), Some(FixedPoint::from_int(5)));
}

#[test]
fn multiplication_saturates_instead_of_wrapping() {
    let big = FixedPoint::from_int(1 << 40);
    assert_eq!(big * big, FixedPoint::MAX);
    assert_eq!(big * -big, FixedPoint::MIN);
    assert_eq!(big.checked_mul(big), None);
}

proptest! {
    #[test]
    fn operations_are_bitwise_reproducible(a in raw_scalar(), b in raw_scalar()) {
        let (x, y) = (FixedPoint::from_raw(a), FixedPoint::from_raw(b));
        // Recomputing from the same raw bits must give the same raw bits.
        prop_assert_eq!((x * y).raw(), (FixedPoint::from_raw(a) * FixedPoint::from_raw(b)).raw());
        prop_assert_eq!((x + y).raw(), a + b);
        prop_assert_eq!((x - y).raw(), a - b);
        prop_assert_eq!(x * y, y * x);
    }

    #[test]
    fn sqrt_is_floor_of_true_root(a in 0_i64..(1_i64 << 50)) {
        let x = FixedPoint::from_raw(a);
        let root = x.sqrt().unwrap();
        // root² ≤ x < (root + ε)², compared at the doubled scale.
        let r = i128::from(root.raw());
        let scaled = i128::from(a) << 20;
        prop_assert!(r * r <= scaled);
        prop_assert!((r + 1) * (r + 1) > scaled);
    }

    #[test]
    fn division_inverts_multiplication(a in -(1_i64 << 20)..(1_i64 << 20), b in 1_i64..(1_i64 << 10)) {
        let x = FixedPoint::from_int(a);
        let y = FixedPoint::from_int(b);
        prop_assert_eq!((x * y).try_div(y), Ok(x));
    }

    #[test]
    fn dot2_matches_vector_dot(ax in raw_scalar(), ay in raw_scalar(), bx in raw_scalar(), by in raw_scalar()) {
        let a = Vector::new(FixedPoint::from_raw(ax), FixedPoint::from_raw(ay));
        let b = Vector::new(FixedPoint::from_raw(bx), FixedPoint::from_raw(by));
        prop_assert_eq!(FixedPoint::dot2(a.x, b.x, a.y, b.y), a.checked_dot(b));
    }
}
