//! Epoch-based learning-rate schedule.

use crate::config::LrScheduleConfig;

/// Piecewise-constant learning rate that changes at epoch milestones.
#[derive(Debug, Clone)]
pub struct LrSchedule {
    initial: f64,
    steps: Vec<(usize, f64)>,
}

impl LrSchedule {
    /// Build a schedule from a validated configuration.
    pub fn new(config: &LrScheduleConfig) -> Self {
        Self {
            initial: config.initial,
            steps: config
                .milestones
                .iter()
                .copied()
                .zip(config.values.iter().copied())
                .collect(),
        }
    }

    /// Learning rate for training after `completed_epochs` epochs.
    pub fn lr_at(&self, completed_epochs: usize) -> f64 {
        self.steps
            .iter()
            .rev()
            .find(|(milestone, _)| completed_epochs >= *milestone)
            .map_or(self.initial, |(_, lr)| *lr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_boundaries() {
        let schedule = LrSchedule::new(&LrScheduleConfig::default());

        assert_eq!(schedule.lr_at(0), 0.001);
        assert_eq!(schedule.lr_at(9), 0.001);
        assert_eq!(schedule.lr_at(10), 0.003);
        assert_eq!(schedule.lr_at(19), 0.003);
        assert_eq!(schedule.lr_at(20), 0.001);
        assert_eq!(schedule.lr_at(100), 0.0003);
        assert_eq!(schedule.lr_at(150), 0.0001);
        assert_eq!(schedule.lr_at(200), 0.00003);
        assert_eq!(schedule.lr_at(229), 0.00003);
        assert_eq!(schedule.lr_at(230), 0.00001);
        assert_eq!(schedule.lr_at(1000), 0.00001);
    }

    #[test]
    fn test_constant_schedule() {
        let schedule = LrSchedule::new(&LrScheduleConfig::constant(0.05));
        assert_eq!(schedule.lr_at(0), 0.05);
        assert_eq!(schedule.lr_at(500), 0.05);
    }
}
