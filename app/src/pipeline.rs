use common::{aggregate_directories, config::PipelineConfig, plot::plot_metrics_file, store};
use eyre::{Context, Result};
use tracing::{info, warn};

pub fn aggregate(config: &PipelineConfig) -> Result<()> {
    let aggregate =
        aggregate_directories(&config.directories).context("Aggregate run directories")?;

    for (key, metrics) in &aggregate.metrics {
        info!("Metrics for {key}: {metrics:?}");
    }
    if !aggregate.skipped.is_empty() {
        warn!("{} files skipped", aggregate.skipped.len());
    }

    store::save(&aggregate.metrics, &config.metrics_path)
        .with_context(|| format!("Save metrics to {:?}", config.metrics_path))?;
    println!(
        "Metrics for {} runs written to {}",
        aggregate.len(),
        config.metrics_path.display()
    );
    Ok(())
}

pub fn plot(config: &PipelineConfig) -> Result<()> {
    let series = plot_metrics_file(&config.metrics_path, &config.chart_path, &config.chart)
        .with_context(|| format!("Plot metrics from {:?}", config.metrics_path))?;
    println!(
        "Chart with {series} series written to {}",
        config.chart_path.display()
    );
    Ok(())
}
