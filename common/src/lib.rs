pub mod aggregate;
pub mod config;
pub mod error;
pub mod key;
pub mod metrics;
pub mod plot;
pub mod record;
pub mod store;
pub mod util;

pub use aggregate::{Aggregate, SkippedFile, aggregate_directories, aggregate_directory};
pub use key::KeyRegistry;
pub use metrics::{MetricsMap, MetricsRecord};
