//! Unbiased question ordering.
//!
//! Fisher–Yates over a copy of the input, via `SliceRandom::shuffle`. Every
//! permutation of `N` items is equally likely, and a seeded RNG reproduces the
//! same order.

use rand::Rng;
use rand::seq::SliceRandom;

/// Returns a uniformly shuffled copy of `items` using the thread-local RNG.
#[must_use]
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::rng())
}

/// Returns a uniformly shuffled copy of `items`, drawing from `rng`.
///
/// The input slice is never touched; empty and single-element inputs come back
/// unchanged.
#[must_use]
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}
