use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::{
    error::{AggregateError, RecordError},
    record::{MEAN_ARRIVAL_TIME, NUM_CHANNELS, RunConfig},
    util::format_float,
};

/// A key handed out by [`KeyRegistry::assign`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedKey {
    pub key: String,
    /// Occurrences of the base key including this one
    pub count: u64,
}

/// Grouping key shared by runs with the same channel count and arrival time
pub fn base_key(config: &RunConfig) -> Result<String, RecordError> {
    let channels = config
        .get(NUM_CHANNELS)
        .ok_or(RecordError::MissingField(NUM_CHANNELS))?;
    let arrival = config
        .get(MEAN_ARRIVAL_TIME)
        .ok_or(RecordError::MissingField(MEAN_ARRIVAL_TIME))?;
    Ok(format!("{}_{}", key_part(channels), key_part(arrival)))
}

fn key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => {
            n.as_f64().map_or_else(|| n.to_string(), format_float)
        }
        other => other.to_string(),
    }
}

/// Uniqueness state of one aggregation. Share a single registry across every
/// directory that ends up in the same metrics file.
#[derive(Debug, Default, Clone)]
pub struct KeyRegistry {
    existing: HashSet<String>,
    counts: HashMap<String, u64>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the number of earlier runs with this base key
    pub fn assign(&mut self, base: &str) -> Result<AssignedKey, AggregateError> {
        let count = self.counts.entry(base.to_owned()).or_insert(0);
        let key = format!("{base}_{count}");
        if self.existing.contains(&key) {
            return Err(AggregateError::KeyCollision(key));
        }
        *count += 1;
        let count = *count;
        self.existing.insert(key.clone());
        Ok(AssignedKey { key, count })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.existing.contains(key)
    }

    pub fn len(&self) -> usize {
        self.existing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.existing.is_empty()
    }
}
