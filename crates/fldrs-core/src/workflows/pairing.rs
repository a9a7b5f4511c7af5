use itertools::Itertools;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Draws up to `count` distinct `(n_index, c_index)` pairs for the combined
/// N- and C-terminal case.
///
/// Pairs are sampled without replacement from the cartesian product of
/// `0..n_count` and `0..c_count`. When `count` exceeds the number of possible
/// pairs, every pair is returned in random order.
pub fn sample_fragment_pairs<R: Rng>(
    n_count: usize,
    c_count: usize,
    count: usize,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let all: Vec<(usize, usize)> = (0..n_count).cartesian_product(0..c_count).collect();
    let take = count.min(all.len());
    debug!(available = all.len(), take, "Sampling fragment pairs.");
    all.choose_multiple(rng, take).copied().collect()
}
