//! Training loggers.
//!
//! Provides different logging backends for training metrics.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{DriveError, Result};
use crate::evaluation::EvalResult;

/// Training snapshot for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSnapshot {
    /// Environment steps taken so far.
    pub timesteps: u64,
    /// Host steps taken so far.
    pub host_steps: u64,
    /// Completed training episodes.
    pub episodes: u64,
    /// Mean return over the recent episode window.
    pub avg_reward: f64,
    /// Mean length over the recent episode window.
    pub avg_length: f64,
    /// Current exploration probability.
    pub exploration_rate: f64,
    /// Loss of the latest gradient update, if any happened.
    pub loss: Option<f32>,
    /// Gradient updates so far.
    pub n_updates: u64,
    pub learning_rate: f64,
    /// Environment steps per second since training started.
    pub fps: f64,
    pub elapsed_secs: f64,
}

impl TrainingSnapshot {
    pub fn new(timesteps: u64, host_steps: u64, episodes: u64) -> Self {
        Self {
            timesteps,
            host_steps,
            episodes,
            avg_reward: 0.0,
            avg_length: 0.0,
            exploration_rate: 0.0,
            loss: None,
            n_updates: 0,
            learning_rate: 0.0,
            fps: 0.0,
            elapsed_secs: 0.0,
        }
    }

    pub fn with_episode_stats(mut self, avg_reward: f64, avg_length: f64) -> Self {
        self.avg_reward = avg_reward;
        self.avg_length = avg_length;
        self
    }

    pub fn with_exploration_rate(mut self, rate: f64) -> Self {
        self.exploration_rate = rate;
        self
    }

    pub fn with_updates(mut self, n_updates: u64, loss: Option<f32>) -> Self {
        self.n_updates = n_updates;
        self.loss = loss;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set wall time and derive throughput.
    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = elapsed_secs;
        self.fps = if elapsed_secs > 0.0 {
            self.timesteps as f64 / elapsed_secs
        } else {
            0.0
        };
        self
    }
}

/// Logger trait for different logging backends.
pub trait MetricsLogger {
    /// Log a training snapshot.
    fn log(&mut self, snapshot: &TrainingSnapshot);

    /// Log a finished evaluation pass.
    fn log_eval(&mut self, _result: &EvalResult) {}

    /// Flush any buffered output.
    fn flush(&mut self);
}

/// Logs snapshots as structured `tracing` events.
#[derive(Debug, Default)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, s: &TrainingSnapshot) {
        info!(
            timesteps = s.timesteps,
            episodes = s.episodes,
            ep_rew_mean = format_args!("{:.2}", s.avg_reward),
            ep_len_mean = format_args!("{:.1}", s.avg_length),
            exploration_rate = format_args!("{:.3}", s.exploration_rate),
            loss = ?s.loss,
            n_updates = s.n_updates,
            fps = format_args!("{:.0}", s.fps),
            "training progress"
        );
    }

    fn log_eval(&mut self, r: &EvalResult) {
        info!(
            timesteps = r.step,
            mean_reward = format_args!("{:.2}", r.mean_reward),
            std_reward = format_args!("{:.2}", r.std_reward),
            mean_length = format_args!("{:.1}", r.mean_length),
            episodes = r.n_episodes,
            "evaluation"
        );
    }

    fn flush(&mut self) {}
}

/// CSV file logger (`progress.csv`) for analysis.
pub struct CsvLogger {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvLogger {
    pub const HEADER: &'static str = "timesteps,host_steps,episodes,ep_rew_mean,ep_len_mean,\
exploration_rate,loss,n_updates,learning_rate,fps,elapsed_secs";

    /// Create the file (truncating) and write the header.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| DriveError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", Self::HEADER).map_err(|e| DriveError::io(&path, e))?;
        Ok(Self { path, writer })
    }
}

impl MetricsLogger for CsvLogger {
    fn log(&mut self, s: &TrainingSnapshot) {
        let loss = s.loss.map(|l| format!("{l:.6}")).unwrap_or_default();
        let written = writeln!(
            self.writer,
            "{},{},{},{:.4},{:.2},{:.4},{},{},{:.8},{:.2},{:.2}",
            s.timesteps,
            s.host_steps,
            s.episodes,
            s.avg_reward,
            s.avg_length,
            s.exploration_rate,
            loss,
            s.n_updates,
            s.learning_rate,
            s.fps,
            s.elapsed_secs,
        );
        if let Err(error) = written {
            warn!(path = %self.path.display(), %error, "failed to write progress row");
        }
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Appends one row per evaluation pass to `evaluations.csv`.
#[derive(Debug, Clone)]
pub struct EvaluationCsv {
    path: PathBuf,
}

impl EvaluationCsv {
    pub const HEADER: &'static str =
        "timesteps,mean_reward,std_reward,min_reward,max_reward,mean_length,n_episodes";

    /// Start a fresh file with only the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::write(&path, format!("{}\n", Self::HEADER)).map_err(|e| DriveError::io(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, r: &EvalResult) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| DriveError::io(&self.path, e))?;
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6},{:.2},{}",
            r.step, r.mean_reward, r.std_reward, r.min_reward, r.max_reward, r.mean_length, r.n_episodes
        )
        .map_err(|e| DriveError::io(&self.path, e))
    }
}

/// Multi-logger that writes to multiple backends.
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Box<dyn MetricsLogger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a logger.
    pub fn add<L: MetricsLogger + 'static>(mut self, logger: L) -> Self {
        self.loggers.push(Box::new(logger));
        self
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl MetricsLogger for MultiLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        for logger in &mut self.loggers {
            logger.log(snapshot);
        }
    }

    fn log_eval(&mut self, result: &EvalResult) {
        for logger in &mut self.loggers {
            logger.log_eval(result);
        }
    }

    fn flush(&mut self) {
        for logger in &mut self.loggers {
            logger.flush();
        }
    }
}
