//! Beam pruning of sparse DP columns.

use super::logsumexp::NEG_INF;
use rustc_hash::FxHashMap;

/// Keeps at most `beam_size` states of `column`, ranked by `bias`, and
/// returns the eviction threshold ([`NEG_INF`] when nothing was pruned).
///
/// States whose biased score ties the threshold are evicted, so the column
/// may end up slightly smaller than `beam_size`. A `beam_size` of 0 keeps
/// everything.
pub fn prune<F>(column: &mut FxHashMap<usize, f64>, beam_size: usize, bias: F) -> f64
where
    F: Fn(usize, f64) -> f64,
{
    if beam_size == 0 || column.len() <= beam_size {
        return NEG_INF;
    }

    let mut scores: Vec<f64> = column.iter().map(|(&i, &score)| bias(i, score)).collect();
    let len = scores.len();
    let threshold = quickselect(&mut scores, 0, len, len - beam_size);

    column.retain(|&i, &mut score| bias(i, score) > threshold);
    threshold
}

fn partition(scores: &mut [f64], lower: usize, upper: usize) -> usize {
    let pivot = scores[upper - 1];
    let (mut i, mut j) = (lower, upper - 1);
    while i < j {
        while scores[i] < pivot {
            i += 1;
        }
        while scores[j] > pivot {
            j -= 1;
        }
        if scores[i] == scores[j] {
            i += 1;
        } else if i < j {
            scores.swap(i, j);
        }
    }
    j
}

/// Value of the `k`-th smallest element (1-based) of `scores[lower..upper]`.
fn quickselect(scores: &mut [f64], lower: usize, upper: usize, k: usize) -> f64 {
    if upper - lower == 1 {
        return scores[lower];
    }
    let split = partition(scores, lower, upper);
    let length = split - lower + 1;
    if length == k {
        return scores[split];
    }
    if k < length {
        quickselect(scores, lower, split, k)
    } else {
        quickselect(scores, split + 1, upper, k - length)
    }
}
