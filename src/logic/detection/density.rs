//! Density Detector - DBSCAN
//!
//! Euclidean DBSCAN. A neighborhood includes the point itself, and a point
//! is core when its neighborhood has at least `min_neighbors` points.
//! Noise points (in no cluster) are the anomalies.
//!
//! Region queries are computed on demand, once per visited point, and a
//! point enters the expansion queue at most once, so memory stays O(n) even
//! for chunks full of identical requests.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView1};

use super::types::{Detection, DetectionResult, DetectorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointLabel {
    Unvisited,
    Noise,
    Cluster(usize),
}

/// DBSCAN cluster assignment; `None` = noise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    pub labels: Vec<Option<usize>>,
    pub n_clusters: usize,
    /// Largest expansion queue seen, never above the row count
    pub peak_queue: usize,
}

impl Clustering {
    pub fn noise_flags(&self) -> Vec<bool> {
        self.labels.iter().map(Option::is_none).collect()
    }
}

/// Density-based detector
#[derive(Debug, Clone, Copy)]
pub struct DensityDetector {
    radius: f64,
    min_neighbors: usize,
}

impl DensityDetector {
    pub fn new(radius: f64, min_neighbors: usize) -> Self {
        Self { radius, min_neighbors }
    }

    /// Cluster rows of a standardized matrix
    pub fn cluster(&self, data: &Array2<f64>) -> Result<Clustering, DetectorError> {
        let n = data.nrows();
        if n == 0 {
            return Err(DetectorError::insufficient("empty chunk"));
        }
        if n < self.min_neighbors {
            return Err(DetectorError::insufficient(format!(
                "{} rows, density needs at least {}",
                n, self.min_neighbors
            )));
        }

        let eps_sq = self.radius * self.radius;
        let mut labels = vec![PointLabel::Unvisited; n];
        let mut queued = vec![false; n];
        let mut n_clusters = 0;
        let mut peak_queue = 0;

        for i in 0..n {
            if labels[i] != PointLabel::Unvisited {
                continue;
            }

            let neighbors = region_query(data, i, eps_sq);
            if neighbors.len() < self.min_neighbors {
                labels[i] = PointLabel::Noise;
                continue;
            }

            let cluster = n_clusters;
            n_clusters += 1;
            labels[i] = PointLabel::Cluster(cluster);

            queued[i] = true;
            let mut queue: VecDeque<usize> = VecDeque::new();
            enqueue(&mut queue, &mut queued, neighbors);
            peak_queue = peak_queue.max(queue.len());

            while let Some(j) = queue.pop_front() {
                match labels[j] {
                    PointLabel::Cluster(_) => {}
                    PointLabel::Noise => {
                        // Border point: reachable, not core
                        labels[j] = PointLabel::Cluster(cluster);
                    }
                    PointLabel::Unvisited => {
                        labels[j] = PointLabel::Cluster(cluster);
                        let expansion = region_query(data, j, eps_sq);
                        if expansion.len() >= self.min_neighbors {
                            let fresh = expansion.into_iter().filter(|&k| {
                                matches!(labels[k], PointLabel::Unvisited | PointLabel::Noise)
                            });
                            enqueue(&mut queue, &mut queued, fresh);
                            peak_queue = peak_queue.max(queue.len());
                        }
                    }
                }
            }
        }

        let labels = labels
            .into_iter()
            .map(|l| match l {
                PointLabel::Cluster(c) => Some(c),
                _ => None,
            })
            .collect();

        Ok(Clustering { labels, n_clusters, peak_queue })
    }

    pub fn detect(&self, data: &Array2<f64>) -> DetectionResult {
        let clustering = self.cluster(data)?;
        log::debug!(
            "DBSCAN: {} clusters over {} rows",
            clustering.n_clusters,
            clustering.labels.len()
        );
        Ok(Detection::from_flags(clustering.noise_flags()))
    }
}

/// Push points not already queued; a point is queued at most once per run
fn enqueue(
    queue: &mut VecDeque<usize>,
    queued: &mut [bool],
    points: impl IntoIterator<Item = usize>,
) {
    for k in points {
        if !queued[k] {
            queued[k] = true;
            queue.push_back(k);
        }
    }
}

/// Indices within `eps` (inclusive) of row `i`, in index order, `i` included
fn region_query(data: &Array2<f64>, i: usize, eps_sq: f64) -> Vec<usize> {
    let point = data.row(i);
    (0..data.nrows())
        .filter(|&j| j == i || within(&point, &data.row(j), eps_sq))
        .collect()
}

/// Squared distance <= eps_sq, bailing out as soon as it is exceeded
fn within(a: &ArrayView1<f64>, b: &ArrayView1<f64>, eps_sq: f64) -> bool {
    let mut acc = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = x - y;
        acc += d * d;
        if acc > eps_sq {
            return false;
        }
    }
    true
}
