use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::{error::StoreError, metrics::MetricsMap};

/// Writes `metrics` as a JSON object, replacing whatever is at `path`
pub fn save(metrics: &MetricsMap, path: &Path) -> Result<(), StoreError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    metrics.serialize(&mut ser)?;
    writer.flush()?;
    debug!("Saved {} records to {path:?}", metrics.len());
    Ok(())
}

pub fn load(path: &Path) -> Result<MetricsMap, StoreError> {
    let metrics: MetricsMap = serde_json::from_str(&fs::read_to_string(path)?)?;
    debug!("Loaded {} records from {path:?}", metrics.len());
    Ok(metrics)
}
