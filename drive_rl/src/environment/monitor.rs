//! Per-episode statistics recorded around an environment.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{Environment, Info, Step};
use crate::error::{DriveError, Result};

/// Info key under which a finished episode's summary is reported.
pub const EPISODE_INFO_KEY: &str = "episode";

/// Finished episodes kept in memory by default.
pub const DEFAULT_HISTORY: usize = 1_000;

/// Summary of one finished episode. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeRecord {
    /// Undiscounted sum of rewards.
    pub reward: f64,
    /// Number of steps.
    pub length: usize,
    pub started_at: SystemTime,
    pub ended_at: SystemTime,
}

impl EpisodeRecord {
    /// Wall-clock duration of the episode.
    pub fn duration(&self) -> Duration {
        self.ended_at
            .duration_since(self.started_at)
            .unwrap_or_default()
    }
}

/// Transparent wrapper accumulating reward and length since the last reset.
///
/// When a step reports `terminated` or `truncated`, an [`EpisodeRecord`] is
/// finalized, appended to a bounded history of the most recent episodes
/// (oldest dropped first; the monitor file keeps them all), and summarized into that step's info
/// under [`EPISODE_INFO_KEY`] as `{"r": reward, "l": length, "t": seconds}`,
/// where `t` counts seconds since the monitor was created.
pub struct EpisodeMonitor<E> {
    inner: E,
    created: Instant,
    episode_start: SystemTime,
    reward: f64,
    length: usize,
    needs_reset: bool,
    total_steps: u64,
    records: VecDeque<EpisodeRecord>,
    history: usize,
    n_episodes: u64,
    log: Option<(PathBuf, BufWriter<File>)>,
}

impl<E> EpisodeMonitor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            created: Instant::now(),
            episode_start: SystemTime::now(),
            reward: 0.0,
            length: 0,
            needs_reset: true,
            total_steps: 0,
            records: VecDeque::new(),
            history: DEFAULT_HISTORY,
            n_episodes: 0,
            log: None,
        }
    }

    /// Also append every finished episode as one JSON line to `path`.
    pub fn with_log_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| DriveError::io(&path, e))?;
        self.log = Some((path, BufWriter::new(file)));
        Ok(self)
    }

    /// Keep at most `capacity` finished episodes in memory.
    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history = capacity.max(1);
        while self.records.len() > self.history {
            self.records.pop_front();
        }
        self
    }

    /// Most recent finished episodes, oldest first.
    pub fn records(&self) -> &VecDeque<EpisodeRecord> {
        &self.records
    }

    pub fn last_record(&self) -> Option<&EpisodeRecord> {
        self.records.back()
    }

    /// Episodes finished since creation, including those dropped from the
    /// history.
    pub fn n_episodes(&self) -> u64 {
        self.n_episodes
    }

    pub fn episode_rewards(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.reward).collect()
    }

    pub fn episode_lengths(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.length).collect()
    }

    pub fn episode_durations(&self) -> Vec<Duration> {
        self.records.iter().map(EpisodeRecord::duration).collect()
    }

    /// Steps taken across all episodes.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Reward accumulated in the running episode.
    pub fn current_reward(&self) -> f64 {
        self.reward
    }

    pub fn current_length(&self) -> usize {
        self.length
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }

    fn finish_episode(&mut self) -> (EpisodeRecord, Value) {
        let record = EpisodeRecord {
            reward: self.reward,
            length: self.length,
            started_at: self.episode_start,
            ended_at: SystemTime::now(),
        };
        let summary = json!({
            "r": record.reward,
            "l": record.length,
            "t": self.created.elapsed().as_secs_f64(),
        });

        if let Some((path, writer)) = self.log.as_mut() {
            let written = serde_json::to_writer(&mut *writer, &summary)
                .map_err(std::io::Error::from)
                .and_then(|_| writer.write_all(b"\n"))
                .and_then(|_| writer.flush());
            if let Err(error) = written {
                warn!(path = %path.display(), %error, "failed to append monitor record");
            }
        }

        if self.records.len() == self.history {
            self.records.pop_front();
        }
        self.records.push_back(record.clone());
        self.n_episodes += 1;
        self.needs_reset = true;
        (record, summary)
    }
}

impl<E: Environment> Environment for EpisodeMonitor<E> {
    type Observation = E::Observation;
    type Action = E::Action;

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&Value>,
    ) -> anyhow::Result<(Self::Observation, Info)> {
        let reset = self.inner.reset(seed, options)?;
        self.reward = 0.0;
        self.length = 0;
        self.episode_start = SystemTime::now();
        self.needs_reset = false;
        Ok(reset)
    }

    fn step(&mut self, action: &Self::Action) -> anyhow::Result<Step<Self::Observation>> {
        if self.needs_reset {
            anyhow::bail!("stepped an episode that has ended; reset the environment first");
        }
        let mut step = self.inner.step(action)?;
        self.reward += step.reward;
        self.length += 1;
        self.total_steps += 1;

        if step.done() {
            let (_, summary) = self.finish_episode();
            step.info.insert(EPISODE_INFO_KEY.to_string(), summary);
        }
        Ok(step)
    }
}

/// Read an episode summary back out of a step's info.
pub fn episode_summary(info: &Info) -> Option<(f64, usize)> {
    let episode = info.get(EPISODE_INFO_KEY)?;
    let reward = episode.get("r")?.as_f64()?;
    let length = episode.get("l")?.as_u64()? as usize;
    Some((reward, length))
}
