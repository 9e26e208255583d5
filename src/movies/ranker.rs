//! Random "suggestion" ordering. Not a recommendation algorithm: every
//! call draws fresh scores so repeated listings come back shuffled.

use rand::Rng;

/// Scores are drawn from `0..SCORE_CEILING`.
pub const SCORE_CEILING: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub item: T,
    pub score: u8,
}

/// Gives each item an independent uniform score and sorts by score,
/// highest first. Ties come out in no particular order.
pub fn rank<T, R>(items: Vec<T>, rng: &mut R) -> Vec<Scored<T>>
where
    R: Rng + ?Sized,
{
    let mut scored: Vec<Scored<T>> = items
        .into_iter()
        .map(|item| Scored {
            score: rng.gen_range(0..SCORE_CEILING),
            item,
        })
        .collect();
    scored.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    scored
}
