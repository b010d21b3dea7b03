//! Utility functions shared by the spatial pooler and sequence memory.
//!
//! Every randomized scan in the layer draws from the layer's own seeded
//! generator through these helpers, so a fixed seed reproduces a run exactly.

use crate::params::{PERMANENCE_MAX, PERMANENCE_MIN};
use rand::Rng;

/// Pick a uniformly random index in `[0, n)`.
///
/// Used for randomized scan starts. `n` must be non-zero.
///
/// # Examples
///
/// ```
/// use htm_cla::utils::rand_index;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let idx = rand_index(10, &mut rng);
/// assert!(idx < 10);
/// ```
#[inline]
pub fn rand_index<R: Rng>(n: usize, rng: &mut R) -> usize {
    debug_assert!(n > 0, "rand_index requires a non-empty range");
    rng.gen_range(0..n)
}

/// Generate a random real number in `[lo, hi)`.
///
/// # Examples
///
/// ```
/// use htm_cla::utils::rand_real;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let val = rand_real(0.45, 0.55, &mut rng);
/// assert!(val >= 0.45 && val < 0.55);
/// ```
#[inline]
pub fn rand_real<R: Rng>(lo: f32, hi: f32, rng: &mut R) -> f32 {
    if hi <= lo {
        return lo;
    }
    rng.gen_range(lo..hi)
}

/// Sign of `x` as -1.0, 0.0 or 1.0.
///
/// Unlike [`f32::signum`], zero maps to zero.
#[inline]
pub fn sgn(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Clamp a permanence into `[PERMANENCE_MIN, PERMANENCE_MAX]`.
#[inline]
pub fn clamp_permanence(p: f32) -> f32 {
    p.clamp(PERMANENCE_MIN, PERMANENCE_MAX)
}

/// Apply `delta` to a permanence and clamp the result.
///
/// NaN deltas leave the permanence untouched.
#[inline]
pub fn permanence_update(p: &mut f32, delta: f32) {
    if !delta.is_nan() {
        *p = clamp_permanence(*p + delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_rand_index() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(rand_index(7, &mut rng) < 7);
        }
        assert_eq!(rand_index(1, &mut rng), 0);
    }

    #[test]
    fn test_rand_real() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let val = rand_real(0.1, 0.2, &mut rng);
            assert!((0.1..0.2).contains(&val));
        }
        // degenerate range
        assert_eq!(rand_real(0.3, 0.3, &mut rng), 0.3);
    }

    #[test]
    fn test_sgn() {
        assert_eq!(sgn(2.5), 1.0);
        assert_eq!(sgn(-0.1), -1.0);
        assert_eq!(sgn(0.0), 0.0);
    }

    #[test]
    fn test_permanence_update_clamps() {
        let mut p = 0.95;
        permanence_update(&mut p, 0.2);
        assert_eq!(p, PERMANENCE_MAX);

        permanence_update(&mut p, -3.0);
        assert_eq!(p, PERMANENCE_MIN);
    }

    #[test]
    fn test_permanence_update_skips_nan() {
        let mut p = 0.4;
        permanence_update(&mut p, f32::NAN);
        assert_eq!(p, 0.4);
    }

    #[test]
    fn test_rand_deterministic() {
        let mut rng1 = rand::rngs::StdRng::seed_from_u64(42);
        let mut rng2 = rand::rngs::StdRng::seed_from_u64(42);

        for _ in 0..20 {
            assert_eq!(rand_index(100, &mut rng1), rand_index(100, &mut rng2));
        }
    }
}
