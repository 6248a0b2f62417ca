//! Training metrics and logging.
//!
//! ## Metrics
//!
//! - [`TrainingMetrics`]: step counters and a rolling window of recent episodes
//!
//! ## Loggers
//!
//! - [`ConsoleLogger`]: structured `tracing` events
//! - [`CsvLogger`]: `progress.csv` for analysis
//! - [`EvaluationCsv`]: one row per evaluation pass
//! - [`MultiLogger`]: combine multiple loggers

pub mod logger;
pub mod training_metrics;

pub use logger::{ConsoleLogger, CsvLogger, EvaluationCsv, MetricsLogger, MultiLogger, TrainingSnapshot};
pub use training_metrics::{TrainingMetrics, EPISODE_WINDOW};
