//! Dataset abstraction and in-memory implementation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::PointCloud;

/// A finite, indexable collection of labelled point clouds.
pub trait PointCloudDataset {
    /// Number of samples.
    fn len(&self) -> usize;

    /// Get a sample by index.
    fn get(&self, index: usize) -> Option<PointCloud>;

    /// Number of distinct point classes the labels range over.
    fn num_classes(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dataset holding every sample in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    /// Point clouds in the dataset.
    pub clouds: Vec<PointCloud>,
}

impl InMemoryDataset {
    /// Create a dataset from samples.
    pub fn new(clouds: Vec<PointCloud>) -> Self {
        Self { clouds }
    }

    /// Add a point cloud to the dataset.
    pub fn add(&mut self, cloud: PointCloud) {
        self.clouds.push(cloud);
    }
}

impl PointCloudDataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.clouds.len()
    }

    fn get(&self, index: usize) -> Option<PointCloud> {
        self.clouds.get(index).cloned()
    }

    fn num_classes(&self) -> usize {
        self.clouds.iter().map(PointCloud::num_classes).max().unwrap_or(0)
    }
}

/// Number of classes produced by [`toy_dataset`].
pub const TOY_NUM_CLASSES: usize = 3;

/// Generate a small synthetic dataset for smoke tests.
///
/// Each cloud is a needle of points stretched along one axis; every point in
/// the cloud carries that axis (0, 1 or 2) as its label. The class is a
/// property of the whole shape, which a global-feature classifier can learn.
pub fn toy_dataset(num_samples: usize, num_points: usize, seed: u64) -> InMemoryDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut dataset = InMemoryDataset::default();

    for i in 0..num_samples {
        let axis = i % TOY_NUM_CLASSES;
        let points = (0..num_points)
            .map(|_| {
                let mut p = [
                    rng.gen_range(-0.1f32..0.1),
                    rng.gen_range(-0.1f32..0.1),
                    rng.gen_range(-0.1f32..0.1),
                ];
                p[axis] = rng.gen_range(-1.0f32..1.0);
                p
            })
            .collect();
        dataset.add(PointCloud::uniform(points, axis as i64));
    }

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_dataset() {
        let mut dataset = InMemoryDataset::default();
        assert!(dataset.is_empty());

        dataset.add(PointCloud::new(vec![[0.0; 3]; 2], vec![0, 3]));
        dataset.add(PointCloud::uniform(vec![[1.0; 3]; 2], 1));

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.num_classes(), 4);
        assert_eq!(dataset.get(1).map(|c| c.labels), Some(vec![1, 1]));
        assert!(dataset.get(2).is_none());
    }

    #[test]
    fn test_toy_dataset() {
        let dataset = toy_dataset(7, 16, 3);

        assert_eq!(dataset.len(), 7);
        assert_eq!(dataset.num_classes(), TOY_NUM_CLASSES);

        let cloud = dataset.get(4).unwrap();
        assert_eq!(cloud.len(), 16);
        assert!(cloud.labels.iter().all(|&l| l == 1));
        // Points spread along the labelled axis only.
        assert!(cloud.points.iter().all(|p| p[0].abs() <= 0.1 && p[2].abs() <= 0.1));
    }

    #[test]
    fn test_toy_dataset_is_seeded() {
        assert_eq!(toy_dataset(3, 8, 11).clouds, toy_dataset(3, 8, 11).clouds);
    }
}
