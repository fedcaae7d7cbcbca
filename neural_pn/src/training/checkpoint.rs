//! Trainer snapshots for resuming interrupted runs.
//!
//! A snapshot directory holds:
//! - `model.mpk`: model record
//! - `optimizer.mpk`: optimizer record
//! - `state.json`: trainer progress

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::optim::Optimizer;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::nn::OneClassPn;

const MODEL_FILE: &str = "model";
const OPTIMIZER_FILE: &str = "optimizer";
const STATE_FILE: &str = "state.json";
const SNAPSHOT_PREFIX: &str = "snapshot_epoch_";

/// Trainer progress stored alongside the records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotState {
    /// Completed epochs.
    pub epoch: usize,
    /// Completed iterations.
    pub iteration: usize,
    /// Training time in seconds up to the snapshot.
    pub elapsed_time: f64,
}

/// Directory name of the snapshot taken after `epoch`.
pub fn snapshot_dir(out_dir: &Path, epoch: usize) -> PathBuf {
    out_dir.join(format!("{}{}", SNAPSHOT_PREFIX, epoch))
}

/// Save model, optimizer and trainer state to `dir`.
pub fn save_snapshot<B, O>(
    dir: &Path,
    model: &OneClassPn<B>,
    optimizer: &O,
    state: &SnapshotState,
) -> Result<()>
where
    B: AutodiffBackend,
    O: Optimizer<OneClassPn<B>, B>,
{
    fs::create_dir_all(dir)?;

    let recorder = CompactRecorder::new();
    model
        .clone()
        .save_file(dir.join(MODEL_FILE), &recorder)?;
    Recorder::<B>::record(&recorder, optimizer.to_record(), dir.join(OPTIMIZER_FILE))?;
    fs::write(dir.join(STATE_FILE), serde_json::to_string_pretty(state)?)?;

    log::info!(
        "Saved snapshot to {:?} (epoch {}, iteration {})",
        dir,
        state.epoch,
        state.iteration
    );

    Ok(())
}

/// Restore a snapshot written by [`save_snapshot`].
///
/// `model` and `optimizer` must have the architecture and type of the ones
/// that were saved; their state is replaced by the stored records.
pub fn load_snapshot<B, O>(
    dir: &Path,
    model: OneClassPn<B>,
    optimizer: O,
    device: &B::Device,
) -> Result<(OneClassPn<B>, O, SnapshotState)>
where
    B: AutodiffBackend,
    O: Optimizer<OneClassPn<B>, B>,
{
    let recorder = CompactRecorder::new();

    let state: SnapshotState = serde_json::from_str(&fs::read_to_string(dir.join(STATE_FILE))?)?;
    let model = model.load_file(dir.join(MODEL_FILE), &recorder, device)?;
    let record = Recorder::<B>::load(&recorder, dir.join(OPTIMIZER_FILE), device)?;
    let optimizer = optimizer.load_record(record);

    log::info!(
        "Resumed from snapshot {:?} (epoch {}, iteration {})",
        dir,
        state.epoch,
        state.iteration
    );

    Ok((model, optimizer, state))
}

/// Check if a complete snapshot exists at `dir`.
pub fn snapshot_exists(dir: &Path) -> bool {
    dir.join(STATE_FILE).exists()
        && dir.join(MODEL_FILE).with_extension("mpk").exists()
        && dir.join(OPTIMIZER_FILE).with_extension("mpk").exists()
}

/// Find the snapshot with the highest epoch under `out_dir`.
pub fn find_latest_snapshot(out_dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(out_dir).ok()?;

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && snapshot_exists(path))
        .filter_map(|path| {
            let epoch = path
                .file_name()?
                .to_str()?
                .strip_prefix(SNAPSHOT_PREFIX)?
                .parse::<usize>()
                .ok()?;
            Some((epoch, path))
        })
        .max_by_key(|(epoch, _)| *epoch)
        .map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch_snapshot(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(STATE_FILE), "{}").unwrap();
        fs::write(dir.join("model.mpk"), "").unwrap();
        fs::write(dir.join("optimizer.mpk"), "").unwrap();
    }

    #[test]
    fn test_snapshot_dir_name() {
        let dir = snapshot_dir(Path::new("result"), 250);
        assert!(dir.ends_with("snapshot_epoch_250"));
    }

    #[test]
    fn test_find_latest_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        for epoch in [5, 10, 3] {
            touch_snapshot(&snapshot_dir(base, epoch));
        }
        // Incomplete snapshots are ignored.
        fs::create_dir_all(snapshot_dir(base, 20)).unwrap();

        let latest = find_latest_snapshot(base).unwrap();
        assert!(latest.ends_with("snapshot_epoch_10"));
    }

    #[test]
    fn test_find_latest_snapshot_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_latest_snapshot(&temp_dir.path().join("nope")).is_none());
    }

    #[test]
    fn test_state_json() {
        let state = SnapshotState {
            epoch: 4,
            iteration: 40,
            elapsed_time: 1.5,
        };
        let json = serde_json::to_string(&state).unwrap();
        let parsed: SnapshotState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
