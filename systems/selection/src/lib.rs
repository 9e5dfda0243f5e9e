#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random selection primitives used when rolling dungeon layouts and spawn points.
//!
//! Two deliberately different algorithms live here: [`pick_weighted`] rolls an
//! index proportionally to integer weights, while [`pick_uniform`] treats every
//! candidate equally.

use mini_dungeons_core::RandomSource;

/// Reasons a weighted pick can fail to produce an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// No candidates were supplied.
    #[error("no candidates to pick from")]
    Empty,
    /// Every candidate has zero weight.
    #[error("the sum of the weights is 0")]
    ZeroTotalWeight,
    /// The roll walked past the last candidate without a match.
    #[error("roll {roll} exhausted the candidates, the sum of the weights is {total}")]
    Exhausted {
        /// Value drawn from `[0, total)`.
        roll: u64,
        /// Sum of every weight.
        total: u64,
    },
}

/// Picks an index with probability `weights[i] / sum(weights)`.
///
/// A roll `r` is drawn from `[0, sum)` and the candidates are walked in order,
/// consuming each weight until one covers `r`. Zero weights never match.
pub fn pick_weighted<R>(weights: &[u32], rng: &mut R) -> Result<usize, SelectionError>
where
    R: RandomSource + ?Sized,
{
    pick_weighted_by(weights, |weight| *weight, rng)
}

/// Weighted pick over arbitrary candidates, reading each weight through `weight_of`.
pub fn pick_weighted_by<T, R>(
    candidates: &[T],
    weight_of: impl Fn(&T) -> u32,
    rng: &mut R,
) -> Result<usize, SelectionError>
where
    R: RandomSource + ?Sized,
{
    if candidates.is_empty() {
        return Err(SelectionError::Empty);
    }

    let total: u64 = candidates
        .iter()
        .map(|candidate| u64::from(weight_of(candidate)))
        .sum();
    if total == 0 {
        return Err(SelectionError::ZeroTotalWeight);
    }

    let roll = rng.next_int(total);
    let mut remaining = roll;
    for (index, candidate) in candidates.iter().enumerate() {
        let weight = u64::from(weight_of(candidate));
        if remaining < weight {
            return Ok(index);
        }
        remaining -= weight;
    }

    Err(SelectionError::Exhausted { roll, total })
}

/// Picks one candidate uniformly at random, or `None` when the slice is empty.
pub fn pick_uniform<'a, T, R>(candidates: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: RandomSource + ?Sized,
{
    if candidates.is_empty() {
        return None;
    }
    let len = u64::try_from(candidates.len()).ok()?;
    let index = usize::try_from(rng.next_int(len)).ok()?;
    candidates.get(index)
}
