//! Clustering of candidate periods into typical periods.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabula_types::ClusterMethod;

const MAX_ITERATIONS: usize = 100;

fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Element-wise mean of the selected feature vectors.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(features: &[Vec<f64>], members: &[usize]) -> Vec<f64> {
    let dim = features.first().map_or(0, Vec::len);
    let mut out = vec![0.0; dim];
    if members.is_empty() {
        return out;
    }
    for &m in members {
        for (o, x) in out.iter_mut().zip(&features[m]) {
            *o += x;
        }
    }
    let n = members.len() as f64;
    for o in &mut out {
        *o /= n;
    }
    out
}

/// Member closest to the members' centroid; ties keep the earliest.
#[must_use]
pub fn medoid(features: &[Vec<f64>], members: &[usize]) -> Option<usize> {
    let c = centroid(features, members);
    let mut best: Option<(usize, f64)> = None;
    for &m in members {
        let d = sq_dist(&features[m], &c);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((m, d));
        }
    }
    best.map(|(m, _)| m)
}

/// Assign each feature vector to one of at most `k` clusters.
///
/// Labels are renumbered in order of first occurrence, so the first vector
/// is always in cluster 0.
#[must_use]
pub fn cluster(features: &[Vec<f64>], k: usize, method: ClusterMethod, seed: u64) -> Vec<usize> {
    let n = features.len();
    if n == 0 {
        return Vec::new();
    }
    let k = k.clamp(1, n);
    let labels = match method {
        ClusterMethod::KMeans => kmeans(features, k, seed),
        ClusterMethod::KMedoids => kmedoids(features, k),
        _ => ward(features, k),
    };
    relabel(&labels)
}

fn relabel(labels: &[usize]) -> Vec<usize> {
    let mut seen: Vec<usize> = Vec::new();
    labels
        .iter()
        .map(|l| {
            seen.iter().position(|s| s == l).unwrap_or_else(|| {
                seen.push(*l);
                seen.len() - 1
            })
        })
        .collect()
}

/// Agglomerative clustering with Ward linkage.
#[allow(clippy::cast_precision_loss)]
fn ward(features: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = features.len();
    let mut centroids: Vec<Vec<f64>> = features.to_vec();
    let mut sizes: Vec<usize> = vec![1; n];
    let mut alive: Vec<bool> = vec![true; n];
    let mut assignment: Vec<usize> = (0..n).collect();
    let mut clusters = n;

    while clusters > k {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !alive[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !alive[j] {
                    continue;
                }
                let (ni, nj) = (sizes[i] as f64, sizes[j] as f64);
                let cost = ni * nj / (ni + nj) * sq_dist(&centroids[i], &centroids[j]);
                if best.is_none_or(|(_, _, c)| cost < c) {
                    best = Some((i, j, cost));
                }
            }
        }
        let Some((i, j, _)) = best else { break };
        let (ni, nj) = (sizes[i] as f64, sizes[j] as f64);
        let merged: Vec<f64> = centroids[i]
            .iter()
            .zip(&centroids[j])
            .map(|(a, b)| (a * ni + b * nj) / (ni + nj))
            .collect();
        centroids[i] = merged;
        sizes[i] += sizes[j];
        alive[j] = false;
        for a in &mut assignment {
            if *a == j {
                *a = i;
            }
        }
        clusters -= 1;
    }
    assignment
}

fn nearest(point: &[f64], centers: &[Vec<f64>]) -> usize {
    let mut best = (0, f64::INFINITY);
    for (c, center) in centers.iter().enumerate() {
        let d = sq_dist(point, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best.0
}

/// Seeded k-means with k-means++ initialisation.
fn kmeans(features: &[Vec<f64>], k: usize, seed: u64) -> Vec<usize> {
    let n = features.len();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centers: Vec<Vec<f64>> = vec![features[rng.random_range(0..n)].clone()];
    while centers.len() < k {
        let weights: Vec<f64> = features
            .iter()
            .map(|f| centers.iter().map(|c| sq_dist(f, c)).fold(f64::INFINITY, f64::min))
            .collect();
        let total: f64 = weights.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.random_range(0.0..total);
            let mut chosen = n - 1;
            for (i, w) in weights.iter().enumerate() {
                if target < *w {
                    chosen = i;
                    break;
                }
                target -= w;
            }
            chosen
        } else {
            // Fewer distinct points than clusters.
            centers.len() % n
        };
        centers.push(features[pick].clone());
    }

    let mut labels: Vec<usize> = features.iter().map(|f| nearest(f, &centers)).collect();
    for _ in 0..MAX_ITERATIONS {
        for (c, center) in centers.iter_mut().enumerate() {
            let members: Vec<usize> = (0..n).filter(|&i| labels[i] == c).collect();
            if !members.is_empty() {
                *center = centroid(features, &members);
            }
        }
        let next: Vec<usize> = features.iter().map(|f| nearest(f, &centers)).collect();
        if next == labels {
            break;
        }
        labels = next;
    }
    labels
}

fn total_cost(features: &[Vec<f64>], medoids: &[usize]) -> f64 {
    features
        .iter()
        .map(|f| {
            medoids
                .iter()
                .map(|&m| sq_dist(f, &features[m]))
                .fold(f64::INFINITY, f64::min)
        })
        .sum()
}

/// Partitioning around medoids: greedy build, then best-improvement swaps.
fn kmedoids(features: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = features.len();
    let mut medoids: Vec<usize> = Vec::with_capacity(k);
    while medoids.len() < k {
        let mut best: Option<(usize, f64)> = None;
        for cand in (0..n).filter(|c| !medoids.contains(c)) {
            let mut trial = medoids.clone();
            trial.push(cand);
            let cost = total_cost(features, &trial);
            if best.is_none_or(|(_, c)| cost < c) {
                best = Some((cand, cost));
            }
        }
        let Some((cand, _)) = best else { break };
        medoids.push(cand);
    }

    let mut cost = total_cost(features, &medoids);
    for _ in 0..MAX_ITERATIONS {
        let mut improved: Option<(usize, usize, f64)> = None;
        for slot in 0..medoids.len() {
            for cand in (0..n).filter(|c| !medoids.contains(c)) {
                let mut trial = medoids.clone();
                trial[slot] = cand;
                let c = total_cost(features, &trial);
                if c < improved.map_or(cost, |(_, _, b)| b) {
                    improved = Some((slot, cand, c));
                }
            }
        }
        let Some((slot, cand, c)) = improved else { break };
        medoids[slot] = cand;
        cost = c;
    }

    let centers: Vec<Vec<f64>> = medoids.iter().map(|&m| features[m].clone()).collect();
    features.iter().map(|f| nearest(f, &centers)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.1],
            vec![0.9, 1.0],
            vec![0.1, 0.0],
            vec![1.0, 0.9],
            vec![0.05, 0.05],
        ]
    }

    #[test]
    fn every_method_separates_two_blobs() {
        for method in [ClusterMethod::Hierarchical, ClusterMethod::KMeans, ClusterMethod::KMedoids] {
            let labels = cluster(&two_blobs(), 2, method, 42);
            assert_eq!(labels, vec![0, 1, 0, 1, 0], "{method:?}");
        }
    }

    #[test]
    fn k_is_capped_by_point_count() {
        let labels = cluster(&two_blobs(), 10, ClusterMethod::Hierarchical, 0);
        assert_eq!(labels, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn medoid_is_a_member() {
        let f = two_blobs();
        assert_eq!(medoid(&f, &[0, 2, 4]), Some(4));
    }
}
