use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    error::{AggregateError, SkipReason},
    key::{KeyRegistry, base_key},
    metrics::{MetricsMap, MetricsRecord},
    record::{ParsedRun, ResultsTable, RunConfig, parse_run_file},
};

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Configs, tables and metrics of every run, keyed by run key.
///
/// The three maps always hold the same key set.
#[derive(Debug, Default)]
pub struct Aggregate {
    pub configs: BTreeMap<String, RunConfig>,
    pub tables: BTreeMap<String, ResultsTable>,
    pub metrics: MetricsMap,
    pub skipped: Vec<SkippedFile>,
}

impl Aggregate {
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn insert(
        &mut self,
        key: String,
        run: ParsedRun,
        metrics: MetricsRecord,
    ) -> Result<(), AggregateError> {
        if self.metrics.contains_key(&key) {
            return Err(AggregateError::KeyCollision(key));
        }
        self.configs.insert(key.clone(), run.config);
        self.tables.insert(key.clone(), run.table);
        self.metrics.insert(key, metrics);
        Ok(())
    }

    /// Moves `other` into `self`. Fails without modifying `self` if any key is
    /// already present.
    pub fn merge(&mut self, other: Aggregate) -> Result<(), AggregateError> {
        if let Some(key) = other
            .metrics
            .keys()
            .find(|key| self.metrics.contains_key(*key))
        {
            return Err(AggregateError::KeyCollision(key.clone()));
        }
        self.configs.extend(other.configs);
        self.tables.extend(other.tables);
        self.metrics.extend(other.metrics);
        self.skipped.extend(other.skipped);
        Ok(())
    }
}

struct PendingRun {
    base: String,
    run: ParsedRun,
    metrics: MetricsRecord,
}

fn read_run(path: &Path) -> Result<PendingRun, SkipReason> {
    let contents = fs::read_to_string(path)?;
    let run = parse_run_file(&contents)?;
    let base = base_key(&run.config)?;
    let metrics = MetricsRecord::extract(&run.config, &run.table)?;
    Ok(PendingRun { base, run, metrics })
}

/// Processes every entry of `dir`, without recursing.
///
/// Entries are visited in file name order so that key numbering is stable.
/// Unreadable or non-conforming entries are recorded in
/// [`Aggregate::skipped`]; a malformed results table aborts.
pub fn aggregate_directory(
    dir: &Path,
    registry: &mut KeyRegistry,
) -> Result<Aggregate, AggregateError> {
    let mut aggregate = Aggregate::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(AggregateError::ReadDir {
                    path: dir.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                let path = err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                warn!("Skipping {path:?}: {err}");
                aggregate.skipped.push(SkippedFile {
                    path,
                    reason: err.into(),
                });
                continue;
            }
        };

        let path = entry.into_path();
        debug!("Processing {path:?}");
        let pending = match read_run(&path) {
            Ok(pending) => pending,
            Err(SkipReason::Record(err)) if !err.is_skippable() => {
                return Err(AggregateError::Record { path, source: err });
            }
            Err(reason) => {
                warn!("Skipping {path:?}: {reason}");
                aggregate.skipped.push(SkippedFile { path, reason });
                continue;
            }
        };

        let assigned = registry.assign(&pending.base)?;
        let metrics = MetricsRecord {
            key_count: assigned.count,
            ..pending.metrics
        };
        debug!("{path:?} -> {}", assigned.key);
        aggregate.insert(assigned.key, pending.run, metrics)?;
    }

    info!(
        "Aggregated {} runs from {dir:?}, skipped {}",
        aggregate.len(),
        aggregate.skipped.len()
    );
    Ok(aggregate)
}

/// Aggregates `dirs` in order, with run keys unique across all of them
pub fn aggregate_directories<P: AsRef<Path>>(dirs: &[P]) -> Result<Aggregate, AggregateError> {
    let mut registry = KeyRegistry::new();
    let mut all = Aggregate::default();
    for dir in dirs {
        let aggregate = aggregate_directory(dir.as_ref(), &mut registry)?;
        all.merge(aggregate)?;
    }
    Ok(all)
}
