//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Get the absolute angular difference between two angles, in the range [0, pi].
///
/// The inputs do not need to be wrapped, any multiple of 2pi is accepted on either angle.
pub fn abs_ang_diff<T>(a: T, b: T) -> T
where
    T: Float,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    // d is in [0, 2pi) from here on
    let mut d = rem_euclid((a - b).abs(), tau_t);

    while d > pi_t {
        d = d - tau_t;
    }

    d.abs()
}

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_pi<T>(value: T) -> T
where
    T: Float,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let w = rem_euclid(value + pi_t, tau_t) - pi_t;

    if w <= -pi_t {
        w + tau_t
    } else {
        w
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}
