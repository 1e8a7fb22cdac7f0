/*!

Deterministic, seeded shuffling, used by inductive generalization to randomize the literal
drop order when a `random_seed` is configured.

*/

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffles `items` in place using a RNG seeded deterministically from `seed`. A `seed` of `0`
/// is a no-op: callers use `seed > 0` to opt into randomization, per spec.
pub fn seeded_shuffle<T>(items: &mut [T], seed: u64) {
    if seed == 0 {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_is_noop() {
        let mut v = vec![1, 2, 3, 4, 5];
        let original = v.clone();
        seeded_shuffle(&mut v, 0);
        assert_eq!(v, original);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut b = a.clone();
        seeded_shuffle(&mut a, 42);
        seeded_shuffle(&mut b, 42);
        assert_eq!(a, b);
    }
}
