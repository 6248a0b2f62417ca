//! Single-slot "best model" checkpoint.
//!
//! The slot holds the parameters with the highest mean evaluation return seen
//! so far, plus a JSON sidecar describing when they were written. A candidate
//! replaces the slot only if its mean is strictly greater.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AgentError, DriveError, Result};

pub const BEST_MODEL_FILE: &str = "best_model.bin";
pub const BEST_METADATA_FILE: &str = "best_model.json";

/// Metadata stored next to the best snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCheckpoint {
    /// Environment step at which the snapshot was taken.
    pub step: u64,
    /// Mean evaluation return that earned the slot.
    pub mean_reward: f64,
    /// Snapshot file name, relative to the sidecar.
    pub model_file: String,
    pub saved_at_unix: u64,
}

impl TrainingCheckpoint {
    /// Read the sidecar from a checkpoint directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(BEST_METADATA_FILE);
        let text = fs::read_to_string(&path).map_err(|e| DriveError::io(&path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| DriveError::io(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

/// Best-so-far tracker with optional persistence.
#[derive(Debug, Clone)]
pub struct BestCheckpoint {
    dir: Option<PathBuf>,
    best_mean: Option<f64>,
    writes: usize,
}

impl BestCheckpoint {
    /// Persist improvements under `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| DriveError::io(&dir, e))?;
        Ok(Self {
            dir: Some(dir),
            best_mean: None,
            writes: 0,
        })
    }

    /// Track the best mean without writing anything.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            best_mean: None,
            writes: 0,
        }
    }

    pub fn best_mean(&self) -> Option<f64> {
        self.best_mean
    }

    /// Snapshots written so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn model_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(BEST_MODEL_FILE))
    }

    /// Whether `mean` would replace the current best.
    pub fn is_improvement(&self, mean: f64) -> bool {
        mean.is_finite() && self.best_mean.map_or(true, |best| mean > best)
    }

    /// Offer a new evaluation score.
    ///
    /// On a strict improvement, `save` is called with the snapshot path (when
    /// persisting), the sidecar is rewritten and `true` is returned. If saving
    /// fails the previous best is kept.
    pub fn offer<F>(&mut self, step: u64, mean: f64, save: F) -> Result<bool>
    where
        F: FnOnce(&Path) -> std::result::Result<(), AgentError>,
    {
        if !self.is_improvement(mean) {
            return Ok(false);
        }

        if let Some(dir) = &self.dir {
            let model_path = dir.join(BEST_MODEL_FILE);
            save(&model_path)?;

            let metadata = TrainingCheckpoint {
                step,
                mean_reward: mean,
                model_file: BEST_MODEL_FILE.to_string(),
                saved_at_unix: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            };
            let sidecar = dir.join(BEST_METADATA_FILE);
            let json = serde_json::to_string_pretty(&metadata)
                .map_err(|e| DriveError::io(&sidecar, e.into()))?;
            fs::write(&sidecar, json).map_err(|e| DriveError::io(&sidecar, e))?;
            self.writes += 1;
            info!(step, mean_reward = mean, path = %model_path.display(), "new best model");
        }

        self.best_mean = Some(mean);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) -> std::result::Result<(), AgentError> {
        fs::write(path, b"weights").map_err(|e| AgentError::Record(e.to_string()))
    }

    #[test]
    fn test_only_strict_improvements_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut best = BestCheckpoint::new(dir.path()).unwrap();

        assert!(best.offer(10, 3.0, touch).unwrap());
        assert!(best.offer(20, 5.0, touch).unwrap());
        assert!(!best.offer(30, 4.0, touch).unwrap());
        assert!(!best.offer(40, 5.0, touch).unwrap(), "ties do not replace");

        assert_eq!(best.writes(), 2);
        assert_eq!(best.best_mean(), Some(5.0));

        let meta = TrainingCheckpoint::load(dir.path()).unwrap();
        assert_eq!(meta.step, 20);
        assert_eq!(meta.mean_reward, 5.0);
        assert!(dir.path().join(BEST_MODEL_FILE).exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_best() {
        let dir = tempfile::tempdir().unwrap();
        let mut best = BestCheckpoint::new(dir.path()).unwrap();
        best.offer(1, 1.0, touch).unwrap();

        let err = best.offer(2, 9.0, |_| Err(AgentError::Record("disk full".into())));
        assert!(err.is_err());
        assert_eq!(best.best_mean(), Some(1.0));
        assert_eq!(best.writes(), 1);
    }

    #[test]
    fn test_in_memory_tracks_without_writing() {
        let mut best = BestCheckpoint::in_memory();
        let mut called = false;
        assert!(best
            .offer(1, -2.0, |_| {
                called = true;
                Ok(())
            })
            .unwrap());
        assert!(!called);
        assert_eq!(best.best_mean(), Some(-2.0));
        assert_eq!(best.writes(), 0);
        assert!(!best.is_improvement(f64::NAN));
    }
}
