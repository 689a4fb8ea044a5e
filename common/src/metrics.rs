use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::RecordError,
    record::{MEAN_ARRIVAL_TIME, ResultsTable, RunConfig, STATE_COLUMN},
    util::parse_bool_like,
};

/// Run key -> metrics, the artifact handed from aggregation to plotting
pub type MetricsMap = BTreeMap<String, MetricsRecord>;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub probability_of_error: f64,
    pub channel_long_buff_ratio: f64,
    pub mean_arrival_time: f64,
    /// Runs seen with this record's base key so far, this one included
    pub key_count: u64,
}

impl MetricsRecord {
    /// `key_count` stays 0 until the run is given a key
    pub fn extract(config: &RunConfig, table: &ResultsTable) -> Result<Self, RecordError> {
        let mean_arrival_time = config
            .mean_arrival_time()?
            .ok_or(RecordError::MissingField(MEAN_ARRIVAL_TIME))?;
        Ok(Self {
            probability_of_error: error_ratio(table),
            channel_long_buff_ratio: config_ratio(config)?,
            mean_arrival_time,
            key_count: 0,
        })
    }
}

/// Fraction of rows whose terminal state is false, 0 for an empty table
pub fn error_ratio(table: &ResultsTable) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    let false_count = table
        .column(STATE_COLUMN)
        .map_or(0, |states| {
            states
                .filter(|s| parse_bool_like(s) == Some(false))
                .count()
        });
    false_count as f64 / table.len() as f64
}

/// Channels per long buffer
pub fn config_ratio(config: &RunConfig) -> Result<f64, RecordError> {
    let channels = config.num_channels()?.unwrap_or(0.0);
    let long_buffs = config.num_long_buffs()?.unwrap_or(1.0);
    if long_buffs > 0.0 {
        Ok(channels / long_buffs)
    } else {
        Ok(0.0)
    }
}
