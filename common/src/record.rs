use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;

/// Separates the configuration blob from the results table
pub const MARKER: &str = "CSV FILE STARTS BELOW";
/// Boolean-like column recording whether an entity reached its terminal state
pub const STATE_COLUMN: &str = "state@end";

pub const NUM_CHANNELS: &str = "num_channels";
pub const NUM_LONG_BUFFS: &str = "num_long_buffs";
pub const MEAN_ARRIVAL_TIME: &str = "mean_arrival_time";

/// Simulation parameters embedded at the top of a run file
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunConfig(Map<String, Value>);

impl RunConfig {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// `Ok(None)` when the field is absent, an error when it is present but not numeric
    pub fn number(&self, field: &'static str) -> Result<Option<f64>, RecordError> {
        match self.0.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or(RecordError::InvalidField(field)),
        }
    }

    pub fn num_channels(&self) -> Result<Option<f64>, RecordError> {
        self.number(NUM_CHANNELS)
    }

    pub fn num_long_buffs(&self) -> Result<Option<f64>, RecordError> {
        self.number(NUM_LONG_BUFFS)
    }

    pub fn mean_arrival_time(&self) -> Result<Option<f64>, RecordError> {
        self.number(MEAN_ARRIVAL_TIME)
    }
}

impl From<Map<String, Value>> for RunConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// End states recorded per simulated entity
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl ResultsTable {
    pub fn from_csv(text: &str) -> Result<Self, RecordError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let headers = reader.headers()?.clone();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;

        if !headers.iter().any(|h| h == STATE_COLUMN) {
            return Err(RecordError::MissingColumn(STATE_COLUMN));
        }
        Ok(Self { headers, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + use<'a>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(self.records.iter().map(move |r| r.get(idx).unwrap_or("")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRun {
    pub config: RunConfig,
    pub table: ResultsTable,
}

/// Splits a raw run file into its configuration and results table.
///
/// The first line is a preamble and is ignored. Missing marker and malformed
/// configuration errors are skippable, table errors are not (see
/// [`RecordError::is_skippable`]).
pub fn parse_run_file(contents: &str) -> Result<ParsedRun, RecordError> {
    let body = contents.split_once('\n').map_or("", |(_, rest)| rest);
    let (json_part, csv_part) = body
        .split_once(MARKER)
        .ok_or(RecordError::MissingMarker)?;

    let config: RunConfig = serde_json::from_str(json_part.trim())?;
    let table = ResultsTable::from_csv(csv_part.trim())?;
    Ok(ParsedRun { config, table })
}
