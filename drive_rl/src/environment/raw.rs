//! Results as produced by an underlying environment, before normalization.
//!
//! Simulator bridges disagree on what `reset` and `step` return. The variants
//! here name every shape the compatibility adapter understands, so the rest of
//! the pipeline never inspects arity or truthiness again.

use serde_json::Value;

/// Result of `reset` on an underlying environment.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReset<O> {
    /// Bare observation (legacy convention).
    Observation(O),
    /// `(observation, info)` pair. `info` may be any value; only mappings are kept.
    WithInfo(O, Value),
}

/// Result of `step` on an underlying environment.
#[derive(Debug, Clone, PartialEq)]
pub enum RawStep<O> {
    /// `(observation, reward, done, info)`.
    Legacy {
        observation: O,
        reward: f64,
        done: bool,
        info: Value,
    },
    /// `(observation, reward, terminated, truncated, info)`.
    Modern {
        observation: O,
        reward: f64,
        terminated: bool,
        truncated: bool,
        info: Value,
    },
    /// Anything else. The payload is treated as the observation.
    Malformed(O),
}

impl<O> RawReset<O> {
    pub fn into_parts(self) -> (O, Value) {
        match self {
            Self::Observation(observation) => (observation, Value::Null),
            Self::WithInfo(observation, info) => (observation, info),
        }
    }
}

impl RawReset<Value> {
    /// Decode an untyped reset result.
    ///
    /// A two-element array is read as `(observation, info)`; anything else is
    /// a bare observation.
    pub fn decode(value: Value) -> Self {
        match value {
            Value::Array(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next(), items.next()) {
                    (Some(observation), Some(info)) => Self::WithInfo(observation, info),
                    // Length was checked above.
                    _ => Self::Observation(Value::Null),
                }
            }
            other => Self::Observation(other),
        }
    }
}

impl RawStep<Value> {
    /// Decode an untyped step result by arity.
    ///
    /// Flags use truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
    /// Rewards accept numbers, booleans and numeric strings. A 4- or 5-element
    /// array whose reward cannot be coerced is treated as malformed.
    pub fn decode(value: Value) -> Self {
        let items = match value {
            Value::Array(items) if items.len() == 4 || items.len() == 5 => items,
            other => return Self::Malformed(other),
        };

        let Some(reward) = coerce_reward(&items[1]) else {
            return Self::Malformed(Value::Array(items));
        };

        let arity = items.len();
        let mut items = items.into_iter();
        let observation = items.next().unwrap_or(Value::Null);
        let _ = items.next();

        if arity == 4 {
            let done = items.next().map(|v| truthy(&v)).unwrap_or(false);
            let info = items.next().unwrap_or(Value::Null);
            Self::Legacy {
                observation,
                reward,
                done,
                info,
            }
        } else {
            let terminated = items.next().map(|v| truthy(&v)).unwrap_or(false);
            let truncated = items.next().map(|v| truthy(&v)).unwrap_or(false);
            let info = items.next().unwrap_or(Value::Null);
            Self::Modern {
                observation,
                reward,
                terminated,
                truncated,
                info,
            }
        }
    }
}

/// Boolean coercion of a JSON value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|x| x != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Float coercion of a JSON reward.
pub fn coerce_reward(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
