//! Observations, epoch summaries and the JSON training log.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Named scalar values reported by a single forward pass.
///
/// Keys keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    values: Vec<(String, f32)>,
}

impl Observation {
    /// Create an empty observation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `key`, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: f32) {
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key.to_string(), value)),
        }
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Iterate over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of recorded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Accumulates observations and reports their per-key mean.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    sums: BTreeMap<String, (f64, usize)>,
}

impl Reporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every value of an observation.
    pub fn add(&mut self, observation: &Observation) {
        for (key, value) in observation.iter() {
            let entry = self.sums.entry(key.to_string()).or_insert((0.0, 0));
            entry.0 += value as f64;
            entry.1 += 1;
        }
    }

    /// Mean of each key over everything added so far.
    pub fn means(&self) -> BTreeMap<String, f64> {
        self.sums
            .iter()
            .map(|(key, (sum, count))| (key.clone(), sum / *count as f64))
            .collect()
    }

    /// Check if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }
}

/// One entry of the training log, written after every epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// Completed epochs.
    pub epoch: usize,
    /// Completed iterations.
    pub iteration: usize,
    /// Learning rate used during the epoch.
    pub lr: f64,
    /// Seconds since training started.
    pub elapsed_time: f64,
    /// Mean metrics, keyed `main/<name>` and `validation/main/<name>`.
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl EpochSummary {
    /// Create a summary without metric values.
    pub fn new(epoch: usize, iteration: usize, lr: f64, elapsed_time: f64) -> Self {
        Self {
            epoch,
            iteration,
            lr,
            elapsed_time,
            values: BTreeMap::new(),
        }
    }

    /// Add `means` with every key prefixed by `prefix`.
    ///
    /// Non-finite means are skipped, since JSON cannot represent them.
    pub fn extend(&mut self, prefix: &str, means: BTreeMap<String, f64>) {
        for (key, value) in means {
            let key = format!("{}{}", prefix, key);
            if !value.is_finite() {
                log::warn!("Dropping non-finite {} ({}) from the log", key, value);
                continue;
            }
            self.values.insert(key, value);
        }
    }

    /// Look up a metric by its full key.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Print the summary as a single log line.
    pub fn log(&self) {
        let metrics: Vec<String> = self
            .values
            .iter()
            .map(|(key, value)| format!("{}={:.6}", key, value))
            .collect();
        log::info!(
            "epoch={} iteration={} lr={:.2e} elapsed={:.1}s {}",
            self.epoch,
            self.iteration,
            self.lr,
            self.elapsed_time,
            metrics.join(" ")
        );
    }
}

/// Training log stored as a JSON array of [`EpochSummary`] entries.
///
/// The whole file is rewritten on every append so it is always valid JSON.
#[derive(Debug, Clone)]
pub struct LogReport {
    path: PathBuf,
    entries: Vec<EpochSummary>,
}

impl LogReport {
    /// Start a new, empty log at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Open the log at `path`, keeping existing entries if the file exists.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            Vec::new()
        };
        Ok(Self { path, entries })
    }

    /// Drop entries recorded after `epoch`.
    pub fn truncate(&mut self, epoch: usize) {
        self.entries.retain(|e| e.epoch <= epoch);
    }

    /// Append an entry and rewrite the file.
    pub fn append(&mut self, summary: EpochSummary) -> Result<()> {
        self.entries.push(summary);
        self.write()
    }

    /// Recorded entries.
    pub fn entries(&self) -> &[EpochSummary] {
        &self.entries
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_observation_insert_replaces() {
        let mut observation = Observation::new();
        observation.insert("loss", 1.0);
        observation.insert("accuracy", 0.5);
        observation.insert("loss", 2.0);

        assert_eq!(observation.len(), 2);
        assert_eq!(observation.get("loss"), Some(2.0));
        let keys: Vec<&str> = observation.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["loss", "accuracy"]);
    }

    #[test]
    fn test_reporter_means() {
        let mut reporter = Reporter::new();
        assert!(reporter.is_empty());

        for (loss, acc) in [(1.0, 0.2), (3.0, 0.4)] {
            let mut observation = Observation::new();
            observation.insert("loss", loss);
            observation.insert("accuracy", acc);
            reporter.add(&observation);
        }
        let mut partial = Observation::new();
        partial.insert("trans_loss1", 0.5);
        reporter.add(&partial);

        let means = reporter.means();
        assert!((means["loss"] - 2.0).abs() < 1e-9);
        assert!((means["accuracy"] - 0.3).abs() < 1e-6);
        assert!((means["trans_loss1"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_prefix_and_json() {
        let mut summary = EpochSummary::new(3, 30, 0.001, 12.5);
        summary.extend("main/", BTreeMap::from([("loss".to_string(), 0.7)]));
        summary.extend("validation/main/", BTreeMap::from([("loss".to_string(), 0.9)]));

        assert_eq!(summary.get("main/loss"), Some(0.7));
        assert_eq!(summary.get("validation/main/loss"), Some(0.9));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["epoch"], 3);
        assert_eq!(json["main/loss"], 0.7);

        let parsed: EpochSummary = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_diverged_means_keep_log_readable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log");

        let mut summary = EpochSummary::new(1, 10, 0.001, 1.0);
        summary.extend(
            "main/",
            BTreeMap::from([
                ("loss".to_string(), f64::NAN),
                ("trans_loss1".to_string(), f64::INFINITY),
                ("accuracy".to_string(), 0.25),
            ]),
        );
        assert_eq!(summary.get("main/loss"), None);
        assert_eq!(summary.get("main/trans_loss1"), None);
        assert_eq!(summary.get("main/accuracy"), Some(0.25));

        let mut log = LogReport::new(&path);
        log.append(summary).unwrap();
        log.append(EpochSummary::new(2, 20, 0.001, 2.0)).unwrap();

        let reloaded = LogReport::load(&path).unwrap();
        assert_eq!(reloaded.entries().len(), 2);
        assert_eq!(reloaded.entries()[0].get("main/accuracy"), Some(0.25));
    }

    #[test]
    fn test_log_report_append_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log");

        let mut report = LogReport::new(&path);
        for epoch in 1..=3 {
            report
                .append(EpochSummary::new(epoch, epoch * 10, 0.001, epoch as f64))
                .unwrap();
        }

        let mut reloaded = LogReport::load(&path).unwrap();
        assert_eq!(reloaded.entries().len(), 3);

        reloaded.truncate(2);
        assert_eq!(reloaded.entries().len(), 2);
        assert_eq!(reloaded.entries()[1].iteration, 20);
    }

    #[test]
    fn test_log_report_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let report = LogReport::load(temp_dir.path().join("log")).unwrap();
        assert!(report.entries().is_empty());
    }
}
