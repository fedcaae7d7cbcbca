//! Mini-batch assembly.

use burn::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PointNetError, Result};

use super::PointCloud;

/// A batch of labelled point clouds in network layout.
#[derive(Debug, Clone)]
pub struct PointCloudBatch<B: Backend> {
    /// Point coordinates: [batch, 3, num_points, 1]
    pub points: Tensor<B, 4>,
    /// Per-point class ids: [batch, num_points]
    pub labels: Tensor<B, 2, Int>,
}

impl<B: Backend> PointCloudBatch<B> {
    /// Stack equally sized clouds into a batch.
    ///
    /// Coordinates are laid out channel-major, so each of x, y and z forms
    /// one `[num_points, 1]` plane of the input tensor.
    pub fn from_clouds(clouds: &[PointCloud], device: &B::Device) -> Result<Self> {
        let Some(first) = clouds.first() else {
            return Err(PointNetError::InvalidData(
                "cannot build a batch from zero clouds".to_string(),
            ));
        };
        let num_points = first.len();
        if num_points == 0 {
            return Err(PointNetError::InvalidData(
                "cannot build a batch from empty clouds".to_string(),
            ));
        }

        let batch = clouds.len();
        let mut coords = Vec::with_capacity(batch * 3 * num_points);
        let mut labels = Vec::with_capacity(batch * num_points);

        for (i, cloud) in clouds.iter().enumerate() {
            if cloud.len() != num_points {
                return Err(PointNetError::InvalidData(format!(
                    "cloud {} has {} points, expected {}",
                    i,
                    cloud.len(),
                    num_points
                )));
            }
            for axis in 0..3 {
                coords.extend(cloud.points.iter().map(|p| p[axis]));
            }
            labels.extend_from_slice(&cloud.labels);
        }

        let points = Tensor::from_data(TensorData::new(coords, [batch, 3, num_points, 1]), device);
        let labels = Tensor::from_data(TensorData::new(labels, [batch, num_points]), device);

        Ok(Self { points, labels })
    }

    /// Number of clouds in the batch.
    pub fn batch_size(&self) -> usize {
        self.points.dims()[0]
    }
}

/// Splits dataset indices into mini-batches, one pass per epoch.
///
/// The last batch of an epoch is kept even when it is smaller than
/// `batch_size`.
#[derive(Debug, Clone)]
pub struct BatchIterator {
    len: usize,
    batch_size: usize,
    shuffle: bool,
    rng: StdRng,
}

impl BatchIterator {
    /// Create a new batch iterator over `len` samples.
    ///
    /// # Panics
    /// If `batch_size` is zero.
    pub fn new(len: usize, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            len,
            batch_size,
            shuffle: false,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Shuffle the sample order every epoch.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set the random seed used for shuffling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        self.len.div_ceil(self.batch_size)
    }

    /// Index batches for the next epoch.
    pub fn epoch(&mut self) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..self.len).collect();
        if self.shuffle {
            indices.shuffle(&mut self.rng);
        }
        indices
            .chunks(self.batch_size)
            .map(<[usize]>::to_vec)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_layout() {
        let device = Default::default();
        let clouds = vec![
            PointCloud::new(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], vec![0, 1]),
            PointCloud::new(vec![[7.0, 8.0, 9.0], [10.0, 11.0, 12.0]], vec![2, 3]),
        ];

        let batch = PointCloudBatch::<TestBackend>::from_clouds(&clouds, &device).unwrap();

        assert_eq!(batch.points.dims(), [2, 3, 2, 1]);
        assert_eq!(batch.labels.dims(), [2, 2]);
        assert_eq!(batch.batch_size(), 2);

        let coords: Vec<f32> = batch.points.into_data().to_vec().unwrap();
        assert_eq!(
            coords,
            vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0, 7.0, 10.0, 8.0, 11.0, 9.0, 12.0]
        );

        let labels: Vec<i64> = batch
            .labels
            .into_data()
            .convert::<i64>()
            .to_vec()
            .unwrap();
        assert_eq!(labels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_batch_rejects_ragged_clouds() {
        let device = Default::default();
        let clouds = vec![
            PointCloud::uniform(vec![[0.0; 3]; 4], 0),
            PointCloud::uniform(vec![[0.0; 3]; 3], 0),
        ];

        let result = PointCloudBatch::<TestBackend>::from_clouds(&clouds, &device);
        assert!(matches!(result, Err(PointNetError::InvalidData(_))));
    }

    #[test]
    fn test_batch_rejects_empty() {
        let device = Default::default();
        assert!(PointCloudBatch::<TestBackend>::from_clouds(&[], &device).is_err());
    }

    #[test]
    fn test_batch_iterator_keeps_partial_batch() {
        let mut batches = BatchIterator::new(10, 4);
        assert_eq!(batches.num_batches(), 3);

        let epoch = batches.epoch();
        assert_eq!(epoch, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }

    #[test]
    fn test_batch_iterator_shuffle_covers_all() {
        let mut batches = BatchIterator::new(9, 2).with_shuffle(true).with_seed(5);

        let mut seen: Vec<usize> = batches.epoch().into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_batch_iterator_is_seeded() {
        let mut a = BatchIterator::new(20, 3).with_shuffle(true).with_seed(9);
        let mut b = BatchIterator::new(20, 3).with_shuffle(true).with_seed(9);
        assert_eq!(a.epoch(), b.epoch());
        assert_eq!(a.epoch(), b.epoch());
    }
}
