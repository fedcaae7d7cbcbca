//! Train OneClassPN on the ShapeNet part-segmentation benchmark.
//!
//! Run with:
//! ```sh
//! cargo run --release -p pn_train -- --data-dir data/shapenetcore_partanno_segmentation_benchmark_v0
//! ```
//!
//! `--toy` trains on a small synthetic dataset instead.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::tensor::backend::AutodiffBackend;
use clap::{ArgAction, Parser};
use serde::Serialize;

use neural_pn::data::{toy_dataset, PointCloudDataset, ShapeNetPartDataset, Split};
use neural_pn::training::find_latest_snapshot;
use neural_pn::{OneClassPnConfig, Trainer, TrainingConfig};

#[derive(Parser, Debug, Serialize)]
#[command(name = "pn_train")]
#[command(about = "Train the OneClassPN per-point classifier")]
struct Args {
    /// Number of point clouds in each mini-batch.
    #[arg(short = 'b', long = "batchsize", default_value_t = 32)]
    batchsize: usize,

    /// Dropout ratio in the segmentation head.
    #[arg(long, default_value_t = 0.0)]
    dropout_ratio: f64,

    /// Number of points sampled from each shape.
    #[arg(short = 'n', long, default_value_t = 1024)]
    num_point: usize,

    /// GPU id (negative value indicates CPU).
    #[arg(short = 'g', long, default_value_t = -1, allow_negative_numbers = true)]
    gpu: i32,

    /// Directory to output the result.
    #[arg(short = 'o', long, default_value = "result")]
    out: PathBuf,

    /// Number of epochs to train.
    #[arg(short = 'e', long, default_value_t = 250)]
    epoch: usize,

    /// File name of the final model record.
    #[arg(short = 'm', long, default_value = "model")]
    model_filename: String,

    /// Snapshot directory to resume from, or `auto` for the latest one in the output directory.
    #[arg(short = 'r', long, default_value = "")]
    resume: String,

    /// Learn input and feature transforms.
    #[arg(short = 't', long, default_value_t = true, action = ArgAction::Set)]
    trans: bool,

    /// Use batch normalization.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    use_bn: bool,

    /// Add identity shortcuts where block widths match.
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    residual: bool,

    /// Evaluate on the validation split after every epoch.
    #[arg(short = 'v', long, default_value_t = true, action = ArgAction::Set)]
    use_val: bool,

    /// Comma-separated shape categories to train on.
    #[arg(short = 'c', long, default_value = "Chair")]
    class_choice: String,

    /// Root of the ShapeNet part-segmentation benchmark.
    #[arg(long, default_value = "data/shapenetcore_partanno_segmentation_benchmark_v0")]
    data_dir: PathBuf,

    /// Random seed for initialization, sampling and shuffling.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Iterations between progress log lines.
    #[arg(long, default_value_t = 10)]
    log_interval: usize,

    /// Train on a synthetic dataset instead of ShapeNet.
    #[arg(long)]
    toy: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("{:?}", args);

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create output directory {:?}", args.out))?;
    save_args(&args);

    if args.gpu < 0 {
        run::<Autodiff<NdArray>>(&args, NdArrayDevice::Cpu)
    } else {
        run_gpu(&args)
    }
}

/// Dump the arguments to `<out>/args.json`. Failures are only logged.
fn save_args(args: &Args) {
    let path = args.out.join("args.json");
    let result = serde_json::to_string_pretty(args)
        .map_err(anyhow::Error::from)
        .and_then(|json| fs::write(&path, json).map_err(anyhow::Error::from));

    if let Err(e) = result {
        log::warn!("Could not write {:?}: {}", path, e);
    }
}

#[cfg(feature = "wgpu")]
fn run_gpu(args: &Args) -> anyhow::Result<()> {
    use burn::backend::wgpu::{Wgpu, WgpuDevice};

    let device = WgpuDevice::DiscreteGpu(args.gpu as usize);
    run::<Autodiff<Wgpu>>(args, device)
}

#[cfg(not(feature = "wgpu"))]
fn run_gpu(args: &Args) -> anyhow::Result<()> {
    use neural_pn::PointNetError;

    Err(PointNetError::DeviceUnavailable {
        message: format!(
            "GPU {} requested but pn_train was built without the `wgpu` feature",
            args.gpu
        ),
    }
    .into())
}

fn run<B: AutodiffBackend>(args: &Args, device: B::Device) -> anyhow::Result<()> {
    if args.toy {
        let train = toy_dataset(256, args.num_point, args.seed);
        let valid = toy_dataset(64, args.num_point, args.seed.wrapping_add(1));
        return train_on::<B, _>(args, device, &train, args.use_val.then_some(&valid));
    }

    let classes: Vec<String> = args
        .class_choice
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let train = ShapeNetPartDataset::load(
        &args.data_dir,
        Split::Train,
        &classes,
        args.num_point,
        args.seed,
    )
    .context("failed to load training split")?;

    let valid = if args.use_val {
        let valid = ShapeNetPartDataset::load(
            &args.data_dir,
            Split::Val,
            &classes,
            args.num_point,
            args.seed.wrapping_add(1),
        )
        .context("failed to load validation split")?;
        Some(valid)
    } else {
        None
    };

    train_on::<B, _>(args, device, &train, valid.as_ref())
}

fn train_on<B, D>(
    args: &Args,
    device: B::Device,
    train: &D,
    valid: Option<&D>,
) -> anyhow::Result<()>
where
    B: AutodiffBackend,
    D: PointCloudDataset,
{
    let num_classes = train
        .num_classes()
        .max(valid.map_or(0, PointCloudDataset::num_classes));
    log::info!(
        "Training on {} samples, validating on {}, {} classes",
        train.len(),
        valid.map_or(0, PointCloudDataset::len),
        num_classes
    );

    let model = OneClassPnConfig::new(num_classes)
        .with_dropout(args.dropout_ratio)
        .with_use_bn(args.use_bn)
        .with_trans(args.trans)
        .with_residual(args.residual);

    let config = TrainingConfig::new(model)
        .with_batch_size(args.batchsize)
        .with_num_points(args.num_point)
        .with_epochs(args.epoch)
        .with_use_val(args.use_val)
        .with_seed(args.seed)
        .with_log_interval(args.log_interval)
        .with_model_filename(args.model_filename.clone());

    let mut trainer = Trainer::<B>::new(config, &args.out, device);
    if let Some(dir) = resume_dir(&args.resume, &args.out) {
        log::info!("Resuming from {:?}", dir);
        trainer = trainer.with_resume(dir);
    }

    let trained = trainer.fit(train, valid)?;

    if let Some(last) = trained.history.last() {
        log::info!(
            "Finished after epoch {}: loss = {:.6}",
            last.epoch,
            last.get("main/loss").unwrap_or(f64::NAN)
        );
    }

    Ok(())
}

/// Snapshot to resume from. `auto` picks the latest snapshot under `out`.
fn resume_dir(resume: &str, out: &Path) -> Option<PathBuf> {
    match resume {
        "" => None,
        "auto" => {
            let latest = find_latest_snapshot(out);
            if latest.is_none() {
                log::info!("No snapshot found in {:?}, starting from scratch", out);
            }
            latest
        }
        dir => Some(PathBuf::from(dir)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_snapshot(out: &Path, epoch: usize) -> PathBuf {
        let dir = out.join(format!("snapshot_epoch_{}", epoch));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("state.json"), "{}").unwrap();
        fs::write(dir.join("model.mpk"), "").unwrap();
        fs::write(dir.join("optimizer.mpk"), "").unwrap();
        dir
    }

    #[test]
    fn test_resume_dir() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path();

        assert_eq!(resume_dir("", out), None);
        assert_eq!(resume_dir("auto", out), None);
        assert_eq!(
            resume_dir("runs/snapshot_epoch_3", out),
            Some(PathBuf::from("runs/snapshot_epoch_3"))
        );

        write_snapshot(out, 2);
        let latest = write_snapshot(out, 10);
        assert_eq!(resume_dir("auto", out), Some(latest));
    }
}
