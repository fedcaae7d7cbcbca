//! Training configuration types.

use burn::config::Config;
use burn::optim::AdamConfig;

use super::OneClassPnConfig;

/// Step learning-rate schedule keyed on epoch milestones.
///
/// When the epoch counter reaches `milestones[i]` the learning rate becomes
/// `values[i]`. Before the first milestone `initial` is used.
#[derive(Config, Debug)]
pub struct LrScheduleConfig {
    /// Learning rate before the first milestone.
    #[config(default = 0.001)]
    pub initial: f64,

    /// Epochs at which the rate changes, strictly increasing.
    #[config(default = "vec![10, 20, 100, 150, 200, 230]")]
    pub milestones: Vec<usize>,

    /// Rate that takes effect at the matching milestone.
    #[config(default = "vec![0.003, 0.001, 0.0003, 0.0001, 0.00003, 0.00001]")]
    pub values: Vec<f64>,
}

/// Adam hyperparameters. The learning rate comes from the schedule.
#[derive(Config, Debug)]
pub struct AdamSettings {
    /// Exponential decay of the first moment estimate.
    #[config(default = 0.9)]
    pub beta_1: f32,

    /// Exponential decay of the second moment estimate.
    #[config(default = 0.999)]
    pub beta_2: f32,

    /// Added to the denominator of the update.
    #[config(default = 1e-8)]
    pub epsilon: f32,
}

impl AdamSettings {
    /// Burn optimizer configuration with these hyperparameters.
    pub fn to_adam(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta_1)
            .with_beta_2(self.beta_2)
            .with_epsilon(self.epsilon)
    }
}

impl Default for LrScheduleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LrScheduleConfig {
    /// A schedule that keeps `lr` for the whole run.
    pub fn constant(lr: f64) -> Self {
        Self::new()
            .with_initial(lr)
            .with_milestones(Vec::new())
            .with_values(Vec::new())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.milestones.len() != self.values.len() {
            return Err(format!(
                "schedule has {} milestones but {} values",
                self.milestones.len(),
                self.values.len()
            ));
        }
        if self.milestones.windows(2).any(|w| w[0] >= w[1]) {
            return Err("schedule milestones must be strictly increasing".to_string());
        }
        if self.initial <= 0.0 || self.values.iter().any(|v| *v <= 0.0) {
            return Err("learning rates must be positive".to_string());
        }
        Ok(())
    }
}

/// Configuration for the OneClassPN trainer.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Network configuration.
    pub model: OneClassPnConfig,

    /// Learning-rate schedule.
    #[config(default = "LrScheduleConfig::new()")]
    pub schedule: LrScheduleConfig,

    /// Adam hyperparameters.
    #[config(default = "AdamSettings::new()")]
    pub optimizer: AdamSettings,

    /// Number of point clouds per batch.
    #[config(default = 32)]
    pub batch_size: usize,

    /// Number of points sampled from each cloud.
    #[config(default = 1024)]
    pub num_points: usize,

    /// Number of epochs to train for.
    #[config(default = 250)]
    pub epochs: usize,

    /// Whether to evaluate on the validation split after every epoch.
    #[config(default = true)]
    pub use_val: bool,

    /// Seed for parameter initialization and data shuffling.
    #[config(default = 42)]
    pub seed: u64,

    /// Iterations between progress log lines.
    #[config(default = 10)]
    pub log_interval: usize,

    /// Epochs between trainer snapshots. `None` snapshots at the final epoch only.
    #[config(default = "None")]
    pub snapshot_interval: Option<usize>,

    /// File name (inside the output directory) for the final model record.
    #[config(default = "String::from(\"model\")")]
    pub model_filename: String,
}

impl TrainingConfig {
    /// Whether a snapshot should be written after `epoch` (1-based) completes.
    pub fn snapshot_due(&self, epoch: usize) -> bool {
        match self.snapshot_interval {
            Some(interval) if interval > 0 => epoch % interval == 0 || epoch == self.epochs,
            _ => epoch == self.epochs,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.model.validate()?;
        self.schedule.validate()?;

        if self.batch_size == 0 {
            return Err("batch_size must be positive".to_string());
        }
        if self.num_points == 0 {
            return Err("num_points must be positive".to_string());
        }
        if self.epochs == 0 {
            return Err("epochs must be positive".to_string());
        }
        if self.log_interval == 0 {
            return Err("log_interval must be positive".to_string());
        }
        if self.optimizer.epsilon <= 0.0 {
            return Err("adam epsilon must be positive".to_string());
        }
        if self.model_filename.is_empty() {
            return Err("model_filename must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_training_config() {
        let config = TrainingConfig::new(OneClassPnConfig::new(4));
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.num_points, 1024);
        assert_eq!(config.epochs, 250);
        assert_eq!(config.model_filename, "model");
    }

    #[test]
    fn test_default_adam_hyperparameters() {
        let config = TrainingConfig::new(OneClassPnConfig::new(4));
        assert_eq!(config.optimizer.epsilon, 1e-8);

        let adam = serde_json::to_value(config.optimizer.to_adam()).unwrap();

        assert!((adam["beta_1"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert!((adam["beta_2"].as_f64().unwrap() - 0.999).abs() < 1e-6);
        assert!((adam["epsilon"].as_f64().unwrap() - 1e-8).abs() < 1e-12);
    }

    #[test]
    fn test_default_schedule_matches_milestones() {
        let schedule = LrScheduleConfig::default();
        assert_eq!(schedule.milestones, vec![10, 20, 100, 150, 200, 230]);
        assert_eq!(schedule.values.len(), 6);
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn test_schedule_validation() {
        let mismatched = LrScheduleConfig::new().with_values(vec![0.1]);
        assert!(mismatched.validate().is_err());

        let unordered = LrScheduleConfig::new()
            .with_milestones(vec![5, 5])
            .with_values(vec![0.1, 0.01]);
        assert!(unordered.validate().is_err());

        assert!(LrScheduleConfig::constant(0.01).validate().is_ok());
        assert!(LrScheduleConfig::constant(0.0).validate().is_err());
    }

    #[test]
    fn test_snapshot_due() {
        let config = TrainingConfig::new(OneClassPnConfig::new(2)).with_epochs(10);
        assert!(!config.snapshot_due(5));
        assert!(config.snapshot_due(10));

        let every_three = config.with_snapshot_interval(Some(3));
        assert!(every_three.snapshot_due(3));
        assert!(!every_three.snapshot_due(4));
        assert!(every_three.snapshot_due(10));
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrainingConfig::new(OneClassPnConfig::new(2))
            .with_batch_size(4)
            .with_num_points(128);

        assert_eq!(config.batch_size, 4);
        assert_eq!(config.num_points, 128);
        assert!(config.clone().with_batch_size(0).validate().is_err());
        assert!(config
            .with_optimizer(AdamSettings::new().with_epsilon(0.0))
            .validate()
            .is_err());
    }
}
