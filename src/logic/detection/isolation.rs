//! Isolation Detector - Isolation Forest
//!
//! Anomalies are isolated by fewer random splits. Each tree is grown on a
//! sub-sample of `min(max_samples, n)` rows without replacement, up to depth
//! ceil(log2(sub-sample)). The score is 2^(-E[h(x)] / c(psi)).
//!
//! The decision threshold is the (1 - contamination) quantile of the
//! chunk's own scores; rows scoring strictly above it are flagged.
//!
//! # References
//!
//! Liu, F. T., Ting, K. M., & Zhou, Z. H. (2008). Isolation forest.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{Detection, DetectionResult, DetectorError};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful BST search over `n` points
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Internal {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree, nodes stored in an arena (root at index 0)
#[derive(Debug, Clone)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(data: &Array2<f64>, sample: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = IsolationTree { nodes: Vec::new() };
        tree.grow(data, sample, 0, max_depth, rng);
        tree
    }

    /// Grow a subtree, returning its node index
    fn grow(
        &mut self,
        data: &Array2<f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if depth >= max_depth || rows.len() <= 1 {
            return id;
        }

        let Some((feature, min, max)) = pick_split_feature(data, &rows, rng) else {
            // Every feature constant on this node
            return id;
        };

        // Left takes x <= threshold, so both sides are non-empty
        let threshold = min + rng.gen::<f64>() * (max - min);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| data[[r, feature]] <= threshold);

        if left_rows.is_empty() || right_rows.is_empty() {
            return id;
        }

        let left = self.grow(data, left_rows, depth + 1, max_depth, rng);
        let right = self.grow(data, right_rows, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Internal { feature, threshold, left, right };
        id
    }

    /// Path length of `x`, plus c(size) for the leaf it lands in
    pub fn path_length(&self, x: &ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[idx] {
                Node::Internal { feature, threshold, left, right } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(*size),
            }
        }
    }
}

/// Random non-constant feature for a node as (feature, min, max)
///
/// Features are tried in a random order without repetition.
fn pick_split_feature(
    data: &Array2<f64>,
    rows: &[usize],
    rng: &mut StdRng,
) -> Option<(usize, f64, f64)> {
    let mut candidates: Vec<usize> = (0..data.ncols()).collect();
    while !candidates.is_empty() {
        let pick = rng.gen_range(0..candidates.len());
        let feature = candidates.swap_remove(pick);

        let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            let v = data[[r, feature]];
            (lo.min(v), hi.max(v))
        });
        if max > min {
            return Some((feature, min, max));
        }
    }
    None
}

// ============================================================================
// FOREST
// ============================================================================

/// Seeded isolation forest over a standardized chunk
#[derive(Debug, Clone, Copy)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
}

impl IsolationForest {
    pub fn new(n_estimators: usize, max_samples: usize, contamination: f64, seed: u64) -> Self {
        Self { n_estimators, max_samples, contamination, seed }
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// Grow the forest and score every row of `data`
    pub fn fit_score(&self, data: &Array2<f64>) -> Result<Vec<f64>, DetectorError> {
        let n = data.nrows();
        if n < 2 {
            return Err(DetectorError::insufficient(format!(
                "{} rows, isolation needs at least 2",
                n
            )));
        }

        let psi = self.max_samples.min(n);
        let max_depth = (psi as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<IsolationTree> = (0..self.n_estimators)
            .map(|_| {
                let sample = rand::seq::index::sample(&mut rng, n, psi).into_vec();
                IsolationTree::build(data, sample, max_depth, &mut rng)
            })
            .collect();

        let norm = average_path_length(psi);
        let scores = data
            .rows()
            .into_iter()
            .map(|row| {
                let mean_path =
                    trees.iter().map(|t| t.path_length(&row)).sum::<f64>() / trees.len() as f64;
                2f64.powf(-mean_path / norm)
            })
            .collect();

        Ok(scores)
    }

    pub fn detect(&self, data: &Array2<f64>) -> DetectionResult {
        let scores = self.fit_score(data)?;
        let threshold = quantile(&scores, 1.0 - self.contamination);
        let flags = scores.iter().map(|&s| s > threshold).collect();
        Ok(Detection { flags, scores: Some(scores) })
    }
}

/// Linear-interpolated quantile, `q` in [0, 1]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
