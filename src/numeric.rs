//! Epsilon-aware comparisons for distances.
//! Raw `==`/`<` on path lengths is never used in the searches; rounding in
//! long sums must not change extraction order or deletion decisions.

/// Absolute tolerance for all distance comparisons.
pub const EPSILON: f64 = 1e-9;

/// Distance sentinel for "not reached".
pub const FARAWAY: f64 = 1e15;

#[inline(always)]
pub fn is_eq(a: f64, b: f64) -> bool { (a - b).abs() <= EPSILON }

#[inline(always)]
pub fn is_lt(a: f64, b: f64) -> bool { a - b < -EPSILON }

#[inline(always)]
pub fn is_le(a: f64, b: f64) -> bool { a - b <= EPSILON }

#[inline(always)]
pub fn is_gt(a: f64, b: f64) -> bool { a - b > EPSILON }

#[inline(always)]
pub fn is_ge(a: f64, b: f64) -> bool { a - b >= -EPSILON }

#[inline(always)]
pub fn is_zero(a: f64) -> bool { a.abs() <= EPSILON }

/// `true` for any value that is still the unreached sentinel (or beyond it).
#[inline(always)]
pub fn is_faraway(a: f64) -> bool { a >= FARAWAY }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relations_absorb_rounding() {
        let sum = 0.1 + 0.2;
        assert!(is_eq(sum, 0.3));
        assert!(!is_lt(sum, 0.3));
        assert!(!is_gt(sum, 0.3));
        assert!(is_le(sum, 0.3) && is_ge(sum, 0.3));
        assert!(is_lt(1.0, 1.0 + 1e-6));
        assert!(is_zero(1e-12));
        assert!(is_faraway(FARAWAY));
    }
}
