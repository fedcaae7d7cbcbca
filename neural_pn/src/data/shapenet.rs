//! Loader for the ShapeNet part-segmentation benchmark layout.
//!
//! Expected directory structure:
//!
//! ```text
//! <root>/
//!   synsetoffset2category.txt          "<Name>\t<synset>" per line
//!   <synset>/points/<token>.pts        "x y z" per line
//!   <synset>/points_label/<token>.seg  1-based part id per line
//!   train_test_split/shuffled_<split>_file_list.json
//!                                      ["shape_data/<synset>/<token>", ...]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{PointNetError, Result};

use super::{PointCloud, PointCloudDataset};

/// Dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// Training split.
    Train,
    /// Validation split.
    Val,
    /// Test split.
    Test,
}

impl Split {
    /// Name used in the split file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

/// Point clouds of the chosen categories for one split, resampled to a fixed size.
#[derive(Debug, Clone)]
pub struct ShapeNetPartDataset {
    clouds: Vec<PointCloud>,
    num_classes: usize,
}

impl ShapeNetPartDataset {
    /// Load a split.
    ///
    /// Every shape is normalized to the unit sphere and resampled (with
    /// replacement) to `num_points` points using a generator seeded with `seed`.
    /// Part labels are shifted to start at 0.
    pub fn load(
        root: &Path,
        split: Split,
        class_choice: &[String],
        num_points: usize,
        seed: u64,
    ) -> Result<Self> {
        let categories = read_categories(root)?;

        let mut synsets = Vec::with_capacity(class_choice.len());
        for name in class_choice {
            match categories.get(name) {
                Some(synset) => synsets.push(synset.clone()),
                None => {
                    let mut available: Vec<String> = categories.keys().cloned().collect();
                    available.sort();
                    return Err(PointNetError::UnknownClass {
                        name: name.clone(),
                        available,
                    });
                }
            }
        }

        let split_file = root
            .join("train_test_split")
            .join(format!("shuffled_{}_file_list.json", split.as_str()));
        let entries: Vec<String> = serde_json::from_str(&read_to_string(&split_file)?)?;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut clouds = Vec::new();

        for entry in entries {
            let Some((synset, token)) = parse_entry(&entry) else {
                log::warn!("Skipping malformed split entry '{}'", entry);
                continue;
            };
            if !synsets.iter().any(|s| s == synset) {
                continue;
            }

            let dir = root.join(synset);
            let points = read_points(&dir.join("points").join(format!("{}.pts", token)))?;
            let labels = read_labels(&dir.join("points_label").join(format!("{}.seg", token)))?;

            if points.len() != labels.len() {
                return Err(PointNetError::InvalidData(format!(
                    "{}: {} points but {} labels",
                    entry,
                    points.len(),
                    labels.len()
                )));
            }
            if points.is_empty() {
                log::warn!("Skipping empty shape '{}'", entry);
                continue;
            }

            let mut cloud = PointCloud::new(points, labels);
            cloud.normalize();
            clouds.push(cloud.resample(num_points, &mut rng));
        }

        if clouds.is_empty() {
            return Err(PointNetError::EmptyDataset {
                split: split.as_str().to_string(),
            });
        }

        let num_classes = clouds.iter().map(PointCloud::num_classes).max().unwrap_or(0);

        log::info!(
            "Loaded {} {} shapes for {:?} ({} part classes)",
            clouds.len(),
            split.as_str(),
            class_choice,
            num_classes
        );

        Ok(Self {
            clouds,
            num_classes,
        })
    }
}

impl PointCloudDataset for ShapeNetPartDataset {
    fn len(&self) -> usize {
        self.clouds.len()
    }

    fn get(&self, index: usize) -> Option<PointCloud> {
        self.clouds.get(index).cloned()
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PointNetError::DatasetNotFound {
            path: PathBuf::from(path),
        });
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse the category file into name -> synset id.
fn read_categories(root: &Path) -> Result<HashMap<String, String>> {
    let text = read_to_string(&root.join("synsetoffset2category.txt"))?;

    let mut categories = HashMap::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        if let (Some(name), Some(synset)) = (fields.next(), fields.next()) {
            categories.insert(name.to_string(), synset.to_string());
        }
    }
    Ok(categories)
}

/// Split "shape_data/<synset>/<token>" into its last two components.
fn parse_entry(entry: &str) -> Option<(&str, &str)> {
    let mut parts = entry.rsplit('/');
    let token = parts.next().filter(|t| !t.is_empty())?;
    let synset = parts.next().filter(|s| !s.is_empty())?;
    Some((synset, token))
}

fn read_points(path: &Path) -> Result<Vec<[f32; 3]>> {
    let text = read_to_string(path)?;

    let mut points = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<f32> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| {
                PointNetError::InvalidData(format!("{:?}:{}: {}", path, lineno + 1, e))
            })?;
        if values.len() < 3 {
            return Err(PointNetError::InvalidData(format!(
                "{:?}:{}: expected 3 coordinates",
                path,
                lineno + 1
            )));
        }
        points.push([values[0], values[1], values[2]]);
    }
    Ok(points)
}

fn read_labels(path: &Path) -> Result<Vec<i64>> {
    let text = read_to_string(path)?;

    let mut labels = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label: i64 = line.parse().map_err(|e| {
            PointNetError::InvalidData(format!("{:?}:{}: {}", path, lineno + 1, e))
        })?;
        if label < 1 {
            return Err(PointNetError::InvalidData(format!(
                "{:?}:{}: part ids start at 1, got {}",
                path,
                lineno + 1,
                label
            )));
        }
        labels.push(label - 1);
    }
    Ok(labels)
}
