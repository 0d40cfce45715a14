//! Seeded k-means (Lloyd iterations, greedy k-means++ seeding, best of `n_init`).
//!
//! Everything random flows from one `StdRng` seeded with `ClusteringConfig::seed`,
//! so identical inputs and config always give identical labels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Upper bound on k; the actual k is clamped to `1..=n_points`.
    pub max_clusters: usize,
    /// Independent initializations; the run with the lowest inertia wins.
    pub n_init: usize,
    pub seed: u64,
    pub max_iter: usize,
    /// Relative to the mean per-feature variance of the data.
    pub tol: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        ClusteringConfig {
            max_clusters: 5,
            n_init: 10,
            seed: 42,
            max_iter: 300,
            tol: 1e-4,
        }
    }
}

impl ClusteringConfig {
    pub fn cluster_count(&self, n_points: usize) -> usize {
        self.max_clusters.min(n_points).max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub centroids: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    pub inertia: f64,
}

impl KMeansFit {
    /// Index of the nearest centroid; ties go to the lower index.
    pub fn predict(&self, point: &[f64]) -> usize {
        nearest(point, &self.centroids).0
    }
}

/// Clusters `points` (all of equal dimension). Returns `None` for an empty input.
pub fn fit(points: &[Vec<f64>], config: &ClusteringConfig) -> Option<KMeansFit> {
    if points.is_empty() {
        return None;
    }

    let k = config.cluster_count(points.len());
    let tol = scaled_tolerance(points, config.tol);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut best: Option<KMeansFit> = None;
    for run in 0..config.n_init.max(1) {
        let centroids = kmeans_plus_plus(points, k, &mut rng);
        let candidate = lloyd(points, centroids, config.max_iter, tol);
        debug!(run, inertia = candidate.inertia, "k-means run finished");

        if best
            .as_ref()
            .map_or(true, |b| candidate.inertia < b.inertia)
        {
            best = Some(candidate);
        }
    }
    best
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn scaled_tolerance(points: &[Vec<f64>], tol: f64) -> f64 {
    let dims = points[0].len();
    if dims == 0 {
        return 0.0;
    }
    let n = points.len() as f64;
    let mut total_variance = 0.0;
    for d in 0..dims {
        let mean = points.iter().map(|p| p[d]).sum::<f64>() / n;
        total_variance += points.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n;
    }
    total_variance / dims as f64 * tol
}

/// Index `i` such that the cumulative weight first exceeds `target`.
fn sample_by_weight(weights: &[f64], target: f64) -> usize {
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if acc > target {
            return i;
        }
    }
    weights.len() - 1
}

/// Greedy k-means++: each step draws `2 + ln(k)` candidates and keeps the one that
/// lowers the potential the most.
fn kmeans_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let trials = 2 + (k as f64).ln().floor() as usize;

    let first = rng.gen_range(0..n);
    let mut centroids = vec![points[first].clone()];
    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &points[first]))
        .collect();
    let mut potential: f64 = closest.iter().sum();

    while centroids.len() < k {
        // All remaining points coincide with a centroid.
        if potential <= 0.0 {
            let pick = rng.gen_range(0..n);
            centroids.push(points[pick].clone());
            continue;
        }

        let mut best: Option<(usize, Vec<f64>, f64)> = None;
        for _ in 0..trials {
            let candidate = sample_by_weight(&closest, rng.gen::<f64>() * potential);
            let updated: Vec<f64> = points
                .iter()
                .zip(&closest)
                .map(|(p, &c)| c.min(squared_distance(p, &points[candidate])))
                .collect();
            let candidate_potential: f64 = updated.iter().sum();
            if best
                .as_ref()
                .map_or(true, |(_, _, pot)| candidate_potential < *pot)
            {
                best = Some((candidate, updated, candidate_potential));
            }
        }

        if let Some((index, updated, pot)) = best {
            centroids.push(points[index].clone());
            closest = updated;
            potential = pot;
        }
    }

    centroids
}

fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points.iter().map(|p| nearest(p, centroids).0).collect()
}

fn lloyd(points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KMeansFit {
    let mut labels = assign(points, &centroids);

    for _ in 0..max_iter {
        let updated = recompute_centroids(points, &labels, &centroids);
        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| squared_distance(old, new))
            .sum();
        centroids = updated;

        let relabeled = assign(points, &centroids);
        let unchanged = relabeled == labels;
        labels = relabeled;
        if unchanged || shift <= tol {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum();

    KMeansFit {
        centroids,
        labels,
        inertia,
    }
}

/// Means of each cluster. Empty clusters are moved onto the points farthest
/// from their current centroid.
fn recompute_centroids(
    points: &[Vec<f64>],
    labels: &[usize],
    previous: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let k = previous.len();
    let dims = points[0].len();
    let mut sums = vec![vec![0.0; dims]; k];
    let mut sizes = vec![0usize; k];

    for (p, &l) in points.iter().zip(labels) {
        sizes[l] += 1;
        for (s, v) in sums[l].iter_mut().zip(p) {
            *s += v;
        }
    }

    let mut far: Vec<(usize, f64)> = points
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (p, &l))| (i, squared_distance(p, &previous[l])))
        .collect();
    far.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let mut far = far.into_iter();

    sums.into_iter()
        .zip(sizes)
        .map(|(sum, size)| {
            if size > 0 {
                sum.into_iter().map(|s| s / size as f64).collect()
            } else {
                match far.next() {
                    Some((i, _)) => points[i].clone(),
                    None => vec![0.0; dims],
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 0.0],
            vec![0.95, 0.05],
            vec![0.0, 1.0],
            vec![0.9, 0.1],
            vec![0.05, 0.95],
            vec![0.1, 0.9],
        ]
    }

    fn config(max_clusters: usize) -> ClusteringConfig {
        ClusteringConfig {
            max_clusters,
            ..ClusteringConfig::default()
        }
    }

    #[test]
    fn test_cluster_count_is_clamped() {
        let c = ClusteringConfig::default();
        assert_eq!(c.cluster_count(0), 1);
        assert_eq!(c.cluster_count(1), 1);
        assert_eq!(c.cluster_count(3), 3);
        assert_eq!(c.cluster_count(500), 5);
    }

    #[test]
    fn test_empty_input_returns_none() {
        assert!(fit(&[], &ClusteringConfig::default()).is_none());
    }

    #[test]
    fn test_separates_well_separated_groups() {
        let result = fit(&two_groups(), &config(2)).unwrap();
        let l = &result.labels;
        assert_eq!(l[0], l[1]);
        assert_eq!(l[0], l[3]);
        assert_eq!(l[2], l[4]);
        assert_eq!(l[2], l[5]);
        assert_ne!(l[0], l[2]);
        assert_eq!(result.predict(&[0.8, 0.2]), l[0]);
        assert_eq!(result.predict(&[0.0, 0.7]), l[2]);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let points = two_groups();
        let a = fit(&points, &ClusteringConfig::default()).unwrap();
        let b = fit(&points, &ClusteringConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_seed_is_reproducible() {
        let points = two_groups();
        let config = ClusteringConfig {
            seed: 7,
            max_clusters: 3,
            ..ClusteringConfig::default()
        };
        let a = fit(&points, &config).unwrap();
        let b = fit(&points, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.centroids.len(), 3);
    }

    #[test]
    fn test_single_init_still_separates_groups() {
        let config = ClusteringConfig {
            n_init: 1,
            ..config(2)
        };
        let result = fit(&two_groups(), &config).unwrap();
        let l = &result.labels;
        assert_eq!(result.centroids.len(), 2);
        assert_eq!(l.len(), 6);
        assert!(l.iter().all(|&label| label < 2));
        assert_eq!(l[0], l[1]);
        assert_eq!(l[2], l[4]);
        assert_ne!(l[0], l[2]);
        assert!(result.inertia.is_finite() && result.inertia >= 0.0);
    }

    #[test]
    fn test_single_point_single_cluster() {
        let result = fit(&[vec![0.3, 0.4]], &ClusteringConfig::default()).unwrap();
        assert_eq!(result.labels, vec![0]);
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn test_duplicate_points_do_not_panic() {
        let points = vec![vec![1.0, 0.0]; 4];
        let result = fit(&points, &ClusteringConfig::default()).unwrap();
        assert_eq!(result.labels.len(), 4);
        assert_eq!(result.centroids.len(), 4);
    }

    #[test]
    fn test_labels_are_within_k() {
        let result = fit(&two_groups(), &ClusteringConfig::default()).unwrap();
        assert!(result.labels.iter().all(|&l| l < result.centroids.len()));
    }
}
