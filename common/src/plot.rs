use std::{fs, path::Path};

use itertools::Itertools;
use plotters::{drawing::DrawingAreaErrorKind, prelude::*};
use tracing::{info, warn};

use crate::{
    config::ChartConfig,
    error::PlotError,
    metrics::MetricsMap,
    store,
    util::{format_float, mean, sample_stddev},
};

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Draw(err.to_string())
    }
}

/// One run of the metrics file
#[derive(Debug, Clone, PartialEq)]
pub struct RunRow {
    pub key: String,
    pub channel_long_buff_ratio: f64,
    pub mean_arrival_time: f64,
    pub probability_of_error: f64,
}

pub fn run_rows(metrics: &MetricsMap) -> Vec<RunRow> {
    metrics
        .iter()
        .map(|(key, m)| RunRow {
            key: key.clone(),
            channel_long_buff_ratio: m.channel_long_buff_ratio,
            mean_arrival_time: m.mean_arrival_time,
            probability_of_error: m.probability_of_error,
        })
        .collect()
}

/// Replicates of one (ratio, arrival time) pair, in percent
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBarPoint {
    pub mean_arrival_time: f64,
    pub mean_percent: f64,
    pub stddev_percent: f64,
    pub runs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBarSeries {
    pub ratio: f64,
    pub points: Vec<ErrorBarPoint>,
}

impl ErrorBarSeries {
    pub fn label(&self) -> String {
        format!("Channel to Long Buff Ratio: {}", format_float(self.ratio))
    }
}

/// Groups runs by configuration ratio, then by mean arrival time.
///
/// Series come out sorted by ratio and points by arrival time.
pub fn error_bar_series(rows: &[RunRow]) -> Vec<ErrorBarSeries> {
    let sorted = rows
        .iter()
        .sorted_by(|a, b| {
            a.channel_long_buff_ratio
                .total_cmp(&b.channel_long_buff_ratio)
                .then(a.mean_arrival_time.total_cmp(&b.mean_arrival_time))
        })
        .collect_vec();

    let by_ratio = sorted.into_iter().chunk_by(|r| r.channel_long_buff_ratio);
    let mut series = Vec::new();
    for (ratio, group) in &by_ratio {
        let by_arrival = group.chunk_by(|r| r.mean_arrival_time);
        let points = by_arrival
            .into_iter()
            .map(|(mean_arrival_time, runs)| {
                let errors = runs.map(|r| r.probability_of_error * 100.0).collect_vec();
                ErrorBarPoint {
                    mean_arrival_time,
                    mean_percent: mean(&errors),
                    stddev_percent: sample_stddev(&errors),
                    runs: errors.len(),
                }
            })
            .collect();
        series.push(ErrorBarSeries { ratio, points });
    }
    series
}

/// Drops points that cannot sit on a log axis
fn plottable(series: &[ErrorBarSeries]) -> Vec<ErrorBarSeries> {
    series
        .iter()
        .map(|s| {
            let (points, dropped): (Vec<_>, Vec<_>) = s
                .points
                .iter()
                .cloned()
                .partition(|p| p.mean_arrival_time.is_finite() && p.mean_arrival_time > 0.0);
            for p in dropped {
                warn!(
                    "Ratio {:?}: dropping mean arrival time {} from log axis",
                    s.ratio, p.mean_arrival_time
                );
            }
            ErrorBarSeries {
                ratio: s.ratio,
                points,
            }
        })
        .filter(|s| !s.points.is_empty())
        .collect()
}

/// Draws one line with error bars per series, log-scaled x-axis
pub fn render_chart(
    series: &[ErrorBarSeries],
    path: &Path,
    config: &ChartConfig,
) -> Result<(), PlotError> {
    let series = plottable(series);
    let points = || series.iter().flat_map(|s| s.points.iter());
    let Some((x_min, x_max)) = points()
        .map(|p| p.mean_arrival_time)
        .minmax()
        .into_option()
    else {
        return Err(PlotError::NoData);
    };
    let y_max = points()
        .map(|p| p.mean_percent + p.stddev_percent)
        .fold(0.0, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", config.title_font_size))
        .margin(40)
        .x_label_area_size(config.label_font_size * 2)
        .y_label_area_size(config.label_font_size * 3)
        .build_cartesian_2d((x_min / 1.5..x_max * 1.5).log_scale(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .label_style(("sans-serif", config.tick_font_size))
        .axis_desc_style(("sans-serif", config.label_font_size))
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = Palette99::pick(i).mix(0.7);
        chart
            .draw_series(LineSeries::new(
                s.points.iter().map(|p| (p.mean_arrival_time, p.mean_percent)),
                color.stroke_width(3),
            ))?
            .label(s.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 60, y)], color.stroke_width(3)));
        chart.draw_series(s.points.iter().map(|p| {
            ErrorBar::new_vertical(
                p.mean_arrival_time,
                p.mean_percent - p.stddev_percent,
                p.mean_percent,
                p.mean_percent + p.stddev_percent,
                color.stroke_width(2),
                config.cap_width,
            )
        }))?;
        chart.draw_series(
            s.points
                .iter()
                .map(|p| Circle::new((p.mean_arrival_time, p.mean_percent), 10, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .label_font(("sans-serif", config.legend_font_size))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!("Wrote chart with {} series to {path:?}", series.len());
    Ok(())
}

/// Loads a metrics file and renders its chart, returning the number of series drawn
pub fn plot_metrics_file(
    metrics_path: &Path,
    chart_path: &Path,
    config: &ChartConfig,
) -> Result<usize, PlotError> {
    let metrics = store::load(metrics_path)?;
    let rows = run_rows(&metrics);
    if rows.is_empty() {
        return Err(PlotError::NoData);
    }
    let series = error_bar_series(&rows);
    render_chart(&series, chart_path, config)?;
    Ok(series.len())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::metrics::MetricsRecord;

    fn row(key: &str, ratio: f64, arrival: f64, error: f64) -> RunRow {
        RunRow {
            key: key.to_owned(),
            channel_long_buff_ratio: ratio,
            mean_arrival_time: arrival,
            probability_of_error: error,
        }
    }

    #[test]
    fn rows_follow_metrics() {
        let metrics = MetricsMap::from([(
            "4_1.0_0".to_owned(),
            MetricsRecord {
                probability_of_error: 0.3,
                channel_long_buff_ratio: 2.0,
                mean_arrival_time: 1.0,
                key_count: 1,
            },
        )]);
        assert_eq!(run_rows(&metrics), vec![row("4_1.0_0", 2.0, 1.0, 0.3)]);
    }

    #[test]
    fn replicates_collapse_into_one_point() {
        let rows = vec![
            row("4_1.0_0", 2.0, 1.0, 0.2),
            row("4_1.0_1", 2.0, 1.0, 0.4),
            row("4_1.0_2", 2.0, 1.0, 0.6),
            row("4_2.0_0", 2.0, 2.0, 0.1),
        ];
        let series = error_bar_series(&rows);
        assert_eq!(series.len(), 1);
        let points = &series[0].points;
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].mean_arrival_time, 1.0);
        assert_eq!(points[0].runs, 3);
        assert!((points[0].mean_percent - 40.0).abs() < 1e-9);
        assert!((points[0].stddev_percent - 20.0).abs() < 1e-9);

        assert_eq!(points[1].runs, 1);
        assert!((points[1].mean_percent - 10.0).abs() < 1e-9);
        assert_eq!(points[1].stddev_percent, 0.0);
    }

    #[test]
    fn series_are_sorted_by_ratio_and_arrival() {
        let rows = vec![
            row("a", 4.0, 10.0, 0.5),
            row("b", 1.0, 5.0, 0.5),
            row("c", 4.0, 0.5, 0.5),
            row("d", 1.0, 0.1, 0.5),
        ];
        let series = error_bar_series(&rows);
        let ratios: Vec<_> = series.iter().map(|s| s.ratio).collect();
        assert_eq!(ratios, vec![1.0, 4.0]);
        let arrivals: Vec<_> = series[1].points.iter().map(|p| p.mean_arrival_time).collect();
        assert_eq!(arrivals, vec![0.5, 10.0]);
    }

    #[test]
    fn label_keeps_decimal_point() {
        let series = ErrorBarSeries {
            ratio: 2.0,
            points: vec![],
        };
        assert_eq!(series.label(), "Channel to Long Buff Ratio: 2.0");
        let series = ErrorBarSeries {
            ratio: 1e-5,
            points: vec![],
        };
        assert_eq!(series.label(), "Channel to Long Buff Ratio: 1e-05");
    }

    #[test]
    fn non_positive_arrival_times_are_dropped() {
        let series = error_bar_series(&[
            row("a", 1.0, 0.0, 0.5),
            row("b", 1.0, 2.0, 0.5),
            row("c", 3.0, -1.0, 0.5),
        ]);
        let kept = plottable(&series);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].points.len(), 1);
        assert_eq!(kept[0].points[0].mean_arrival_time, 2.0);
    }

    #[test]
    fn nothing_plottable_is_no_data() {
        let dir = tempdir().unwrap();
        let series = error_bar_series(&[row("a", 1.0, 0.0, 0.5)]);
        let err = render_chart(&series, &dir.path().join("plot.png"), &ChartConfig::default())
            .unwrap_err();
        assert!(matches!(err, PlotError::NoData));
        assert!(!dir.path().join("plot.png").exists());
    }

    #[test]
    fn empty_metrics_file_is_no_data() {
        let dir = tempdir().unwrap();
        let metrics_path = dir.path().join("metrics.json");
        store::save(&MetricsMap::new(), &metrics_path).unwrap();
        let err = plot_metrics_file(
            &metrics_path,
            &dir.path().join("plot.png"),
            &ChartConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::NoData));
    }

    fn sample_metrics() -> MetricsMap {
        let runs = [
            ("4_0.5_0", 2.0, 0.5, 0.40),
            ("4_0.5_1", 2.0, 0.5, 0.44),
            ("4_1.0_0", 2.0, 1.0, 0.30),
            ("4_2.0_0", 2.0, 2.0, 0.10),
            ("8_0.5_0", 4.0, 0.5, 0.20),
            ("8_1.0_0", 4.0, 1.0, 0.12),
            ("8_1.0_1", 4.0, 1.0, 0.18),
        ];
        runs.into_iter()
            .enumerate()
            .map(|(i, (key, ratio, arrival, error))| {
                let record = MetricsRecord {
                    probability_of_error: error,
                    channel_long_buff_ratio: ratio,
                    mean_arrival_time: arrival,
                    key_count: i as u64 + 1,
                };
                (key.to_owned(), record)
            })
            .collect()
    }

    #[test]
    fn renders_chart_for_metrics_file() {
        let dir = tempdir().unwrap();
        let metrics_path = dir.path().join("metrics.json");
        let chart_path = dir.path().join("charts").join("plot.png");
        store::save(&sample_metrics(), &metrics_path).unwrap();

        let drawn = plot_metrics_file(&metrics_path, &chart_path, &ChartConfig::default());
        assert_eq!(drawn.unwrap(), 2);
        let bytes = fs::read(&chart_path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn render_replaces_existing_chart() {
        let dir = tempdir().unwrap();
        let chart_path = dir.path().join("plot.png");
        fs::write(&chart_path, b"stale chart").unwrap();

        let series = error_bar_series(&[row("a", 2.0, 1.0, 0.3)]);
        render_chart(&series, &chart_path, &ChartConfig::default()).unwrap();
        let bytes = fs::read(&chart_path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        assert!(bytes.len() > b"stale chart".len());
    }

    #[test]
    fn missing_metrics_file_is_a_store_error() {
        let dir = tempdir().unwrap();
        let err = plot_metrics_file(
            &dir.path().join("absent.json"),
            &dir.path().join("plot.png"),
            &ChartConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::Store(_)));
    }
}
