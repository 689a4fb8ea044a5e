use std::path::PathBuf;

/// Directories scanned by the aggregation step
pub const DATA_DIRS: &[&str] = &["data_from_curie", "data_from_fermi"];
pub const METRICS_FILE: &str = "metrics.json";
pub const CHART_FILE: &str = "plot.png";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub directories: Vec<PathBuf>,
    pub metrics_path: PathBuf,
    pub chart_path: PathBuf,
    pub chart: ChartConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            directories: DATA_DIRS.iter().map(PathBuf::from).collect(),
            metrics_path: PathBuf::from(METRICS_FILE),
            chart_path: PathBuf::from(CHART_FILE),
            chart: ChartConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub title_font_size: u32,
    pub label_font_size: u32,
    pub tick_font_size: u32,
    pub legend_font_size: u32,
    /// Width of the error bar caps, in pixels
    pub cap_width: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        // 10x6 inch figure at 300 dpi
        Self {
            width: 3000,
            height: 1800,
            title: "Mean Arrival Rate vs. Probability of Loss".to_owned(),
            x_label: "Mean Arrival Rate".to_owned(),
            y_label: "Probability of Loss %".to_owned(),
            title_font_size: 80,
            label_font_size: 72,
            tick_font_size: 60,
            legend_font_size: 64,
            cap_width: 30,
        }
    }
}
