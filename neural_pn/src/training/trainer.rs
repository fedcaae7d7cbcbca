//! OneClassPN trainer.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use burn::module::{AutodiffModule, Module};
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::CompactRecorder;
use burn::tensor::backend::AutodiffBackend;

use crate::config::TrainingConfig;
use crate::data::{BatchIterator, PointCloudBatch, PointCloudDataset};
use crate::error::{PointNetError, Result};
use crate::nn::OneClassPn;

use super::checkpoint::{load_snapshot, save_snapshot, snapshot_dir, SnapshotState};
use super::metrics::{EpochSummary, LogReport, Reporter};
use super::schedule::LrSchedule;

/// Result of a completed training run.
#[derive(Debug)]
pub struct TrainedModel<B: AutodiffBackend> {
    /// The trained network.
    pub model: OneClassPn<B>,
    /// One summary per epoch trained in this run.
    pub history: Vec<EpochSummary>,
}

/// Trains a [`OneClassPn`] with Adam and a milestone learning-rate schedule.
///
/// Every run writes into the output directory:
/// - `config.json`: the training configuration
/// - `log`: JSON array of epoch summaries
/// - `snapshot_epoch_<E>/`: trainer snapshots
/// - `<model_filename>.mpk`: the final model record
#[derive(Debug, Clone)]
pub struct Trainer<B: AutodiffBackend> {
    config: TrainingConfig,
    out_dir: PathBuf,
    resume: Option<PathBuf>,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create a new trainer writing to `out_dir`.
    pub fn new(config: TrainingConfig, out_dir: impl Into<PathBuf>, device: B::Device) -> Self {
        Self {
            config,
            out_dir: out_dir.into(),
            resume: None,
            device,
        }
    }

    /// Resume from the snapshot directory `dir` instead of starting fresh.
    pub fn with_resume(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resume = Some(dir.into());
        self
    }

    /// Run the training loop.
    ///
    /// `valid` is evaluated after every epoch when the configuration enables
    /// validation.
    pub fn fit<D, V>(&self, train: &D, valid: Option<&V>) -> Result<TrainedModel<B>>
    where
        D: PointCloudDataset,
        V: PointCloudDataset,
    {
        let config = &self.config;
        config.validate().map_err(PointNetError::invalid_config)?;
        if train.is_empty() {
            return Err(PointNetError::EmptyDataset {
                split: "train".to_string(),
            });
        }

        fs::create_dir_all(&self.out_dir)?;
        config.save(self.out_dir.join("config.json"))?;

        B::seed(config.seed);
        let mut model = config.model.init::<B>(&self.device);
        let mut optimizer = config.optimizer.to_adam().init::<B, OneClassPn<B>>();
        let mut state = SnapshotState::default();
        let mut log_report = LogReport::new(self.out_dir.join("log"));

        if let Some(ref dir) = self.resume {
            let restored = load_snapshot(dir, model, optimizer, &self.device)?;
            model = restored.0;
            optimizer = restored.1;
            state = restored.2;

            log_report = LogReport::load(self.out_dir.join("log"))?;
            log_report.truncate(state.epoch);
        }

        let valid = if config.use_val { valid } else { None };
        let schedule = LrSchedule::new(&config.schedule);
        let mut batches = BatchIterator::new(train.len(), config.batch_size)
            .with_shuffle(true)
            .with_seed(config.seed);
        // Replay the shuffles of completed epochs so a resumed run sees the same order.
        for _ in 0..state.epoch {
            batches.epoch();
        }

        log::info!(
            "Training for {} epochs ({} samples, {} iterations per epoch)",
            config.epochs,
            train.len(),
            batches.num_batches()
        );

        let start = Instant::now();
        let elapsed_before = state.elapsed_time;
        let mut history = Vec::new();

        for epoch in state.epoch..config.epochs {
            let lr = schedule.lr_at(epoch);
            let mut reporter = Reporter::new();
            let epoch_start = Instant::now();

            for (step, indices) in batches.epoch().into_iter().enumerate() {
                let batch = collect_batch::<B, D>(train, &indices, &self.device)?;

                let output = model.forward_loss(batch.points, batch.labels);
                let observation = output.observation();

                let grads = output.loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optimizer.step(lr, model, grads);

                state.iteration += 1;
                reporter.add(&observation);

                if state.iteration % config.log_interval == 0 {
                    let rate = (step + 1) as f64 / epoch_start.elapsed().as_secs_f64().max(1e-9);
                    log::info!(
                        "epoch {} iteration {}: loss = {:.6}, lr = {:.2e} ({:.2} iters/sec)",
                        epoch + 1,
                        state.iteration,
                        observation.get("loss").unwrap_or(f32::NAN),
                        lr,
                        rate
                    );
                }
            }

            state.epoch = epoch + 1;
            state.elapsed_time = elapsed_before + start.elapsed().as_secs_f64();

            let mut summary = EpochSummary::new(state.epoch, state.iteration, lr, state.elapsed_time);
            summary.extend("main/", reporter.means());

            if let Some(valid) = valid {
                let reporter = evaluate(&model.valid(), valid, config.batch_size, &self.device)?;
                summary.extend("validation/main/", reporter.means());
            }

            summary.log();
            log_report.append(summary.clone())?;
            history.push(summary);

            if config.snapshot_due(state.epoch) {
                save_snapshot(
                    &snapshot_dir(&self.out_dir, state.epoch),
                    &model,
                    &optimizer,
                    &state,
                )?;
            }
        }

        let model_path = self.out_dir.join(&config.model_filename);
        model.clone().save_file(&model_path, &CompactRecorder::new())?;
        log::info!("Saved model to {:?}", model_path);

        Ok(TrainedModel { model, history })
    }
}

/// Evaluate `model` on every sample of `dataset` in serial batches.
///
/// Returns the accumulated observations; their means are the validation metrics.
pub fn evaluate<B, D>(
    model: &OneClassPn<B>,
    dataset: &D,
    batch_size: usize,
    device: &B::Device,
) -> Result<Reporter>
where
    B: Backend,
    D: PointCloudDataset,
{
    let mut reporter = Reporter::new();
    let mut batches = BatchIterator::new(dataset.len(), batch_size);

    for indices in batches.epoch() {
        let batch = collect_batch::<B, D>(dataset, &indices, device)?;
        let output = model.forward_loss(batch.points, batch.labels);
        reporter.add(&output.observation());
    }

    Ok(reporter)
}

fn collect_batch<B: Backend, D: PointCloudDataset>(
    dataset: &D,
    indices: &[usize],
    device: &B::Device,
) -> Result<PointCloudBatch<B>> {
    let clouds = indices
        .iter()
        .map(|&i| {
            dataset.get(i).ok_or_else(|| {
                PointNetError::InvalidData(format!(
                    "index {} out of range for dataset of {} samples",
                    i,
                    dataset.len()
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    PointCloudBatch::from_clouds(&clouds, device)
}
