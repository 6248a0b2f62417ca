//! Normalization of legacy and modern step results.

use serde_json::Value;
use tracing::warn;

use super::raw::{RawReset, RawStep};
use super::{Environment, Info, RawEnvironment, Step};

/// Info key under which time-limit wrappers report truncation in the legacy
/// 4-field convention.
pub const TRUNCATION_KEY: &str = "TimeLimit.truncated";

/// Presents any [`RawEnvironment`] through the uniform [`Environment`] contract.
///
/// - Legacy `(obs, reward, done, info)`: if `info` carries [`TRUNCATION_KEY`],
///   `truncated` takes its value and `terminated = done && !truncated`.
///   Otherwise `terminated = done` and `truncated = false`.
/// - Modern results pass through.
/// - Malformed results become `(payload, 0.0, false, false, {})`.
///
/// Non-mapping info values are replaced by an empty mapping. Errors are only
/// returned when the wrapped environment itself fails.
#[derive(Debug)]
pub struct CompatibilityAdapter<E> {
    inner: E,
    malformed_steps: u64,
}

impl<E> CompatibilityAdapter<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            malformed_steps: 0,
        }
    }

    /// Number of step results that matched neither convention.
    pub fn malformed_steps(&self) -> u64 {
        self.malformed_steps
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

fn into_info(info: Value) -> Info {
    match info {
        Value::Object(map) => map,
        _ => Info::new(),
    }
}

fn truncation_flag(info: &Info) -> Option<bool> {
    info.get(TRUNCATION_KEY).map(super::raw::truthy)
}

impl<E> Environment for CompatibilityAdapter<E>
where
    E: RawEnvironment,
    E::Observation: Clone,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&Value>,
    ) -> anyhow::Result<(Self::Observation, Info)> {
        let (observation, info) = match self.inner.reset(seed, options)? {
            RawReset::Observation(observation) => (observation, Info::new()),
            RawReset::WithInfo(observation, info) => (observation, into_info(info)),
        };
        Ok((observation, info))
    }

    fn step(&mut self, action: &Self::Action) -> anyhow::Result<Step<Self::Observation>> {
        let step = match self.inner.step(action)? {
            RawStep::Legacy {
                observation,
                reward,
                done,
                info,
            } => {
                let info = into_info(info);
                let (terminated, truncated) = match truncation_flag(&info) {
                    Some(truncated) => (done && !truncated, truncated),
                    None => (done, false),
                };
                Step {
                    observation,
                    reward,
                    terminated,
                    truncated,
                    info,
                }
            }
            RawStep::Modern {
                observation,
                reward,
                terminated,
                truncated,
                info,
            } => Step {
                observation,
                reward,
                terminated,
                truncated,
                info: into_info(info),
            },
            RawStep::Malformed(observation) => {
                self.malformed_steps += 1;
                if self.malformed_steps.is_power_of_two() {
                    warn!(
                        count = self.malformed_steps,
                        "step result matched neither the 4-field nor the 5-field convention; \
                         treating it as an observation with zero reward"
                    );
                }
                Step {
                    observation,
                    reward: 0.0,
                    terminated: false,
                    truncated: false,
                    info: Info::new(),
                }
            }
        };
        Ok(step)
    }
}
