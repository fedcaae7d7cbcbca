//! Labelled point cloud samples.

use rand::Rng;

/// A point cloud with one class label per point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    /// Point positions.
    pub points: Vec<[f32; 3]>,
    /// Class id of each point.
    pub labels: Vec<i64>,
}

impl PointCloud {
    /// Create a new labelled point cloud.
    ///
    /// # Panics
    /// If `points` and `labels` differ in length.
    pub fn new(points: Vec<[f32; 3]>, labels: Vec<i64>) -> Self {
        assert_eq!(
            points.len(),
            labels.len(),
            "every point needs exactly one label"
        );
        Self { points, labels }
    }

    /// Create a point cloud whose points all share `label`.
    pub fn uniform(points: Vec<[f32; 3]>, label: i64) -> Self {
        let labels = vec![label; points.len()];
        Self { points, labels }
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest label plus one, or 0 for an empty cloud.
    pub fn num_classes(&self) -> usize {
        self.labels
            .iter()
            .max()
            .map_or(0, |&max| (max.max(-1) + 1) as usize)
    }

    /// Compute the centroid.
    pub fn centroid(&self) -> Option<[f32; 3]> {
        if self.points.is_empty() {
            return None;
        }

        let mut sum = [0.0f32; 3];
        for p in &self.points {
            for axis in 0..3 {
                sum[axis] += p[axis];
            }
        }

        let n = self.points.len() as f32;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }

    /// Center at the origin and scale so the farthest point lies on the unit sphere.
    pub fn normalize(&mut self) {
        let Some(centroid) = self.centroid() else {
            return;
        };

        let mut max_norm = 0.0f32;
        for p in &mut self.points {
            for axis in 0..3 {
                p[axis] -= centroid[axis];
            }
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            max_norm = max_norm.max(norm);
        }

        if max_norm > 0.0 {
            for p in &mut self.points {
                for v in p.iter_mut() {
                    *v /= max_norm;
                }
            }
        }
    }

    /// Draw `n` points uniformly with replacement.
    ///
    /// Sampling with replacement lets clouds with fewer than `n` points
    /// produce fixed-size samples.
    pub fn resample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Self {
        if self.points.is_empty() {
            return self.clone();
        }

        let mut points = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = rng.gen_range(0..self.points.len());
            points.push(self.points[idx]);
            labels.push(self.labels[idx]);
        }

        Self { points, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_point_cloud_creation() {
        let cloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 2, 1],
        );

        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.num_classes(), 3);
    }

    #[test]
    #[should_panic]
    fn test_label_count_mismatch() {
        let _ = PointCloud::new(vec![[0.0; 3]], vec![0, 1]);
    }

    #[test]
    fn test_normalize() {
        let mut cloud = PointCloud::uniform(vec![[1.0, 1.0, 1.0], [3.0, 1.0, 1.0]], 0);
        cloud.normalize();

        let centroid = cloud.centroid().unwrap();
        assert!(centroid.iter().all(|c| c.abs() < 1e-6));
        assert!((cloud.points[0][0] + 1.0).abs() < 1e-6);
        assert!((cloud.points[1][0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_keeps_labels_aligned() {
        let points: Vec<[f32; 3]> = (0..10).map(|i| [i as f32, 0.0, 0.0]).collect();
        let labels: Vec<i64> = (0..10).collect();
        let cloud = PointCloud::new(points, labels);

        let mut rng = StdRng::seed_from_u64(7);
        let sampled = cloud.resample(25, &mut rng);

        assert_eq!(sampled.len(), 25);
        for (p, l) in sampled.points.iter().zip(&sampled.labels) {
            assert_eq!(p[0] as i64, *l);
        }
    }

    #[test]
    fn test_resample_is_seeded() {
        let cloud = PointCloud::uniform((0..50).map(|i| [i as f32, 0.0, 0.0]).collect(), 0);

        let a = cloud.resample(8, &mut StdRng::seed_from_u64(1));
        let b = cloud.resample(8, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
