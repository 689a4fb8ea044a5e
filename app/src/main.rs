use clap::{Parser, Subcommand};
use common::config::PipelineConfig;
use eyre::Result;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod pipeline;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate run files from the data directories into the metrics file
    Aggregate,
    /// Render the error rate chart from the metrics file
    Plot,
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("info".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::new(format!("sim_metrics={log_level}"))
        .add_directive(format!("common={log_level}").parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = PipelineConfig::default();
    let result = match args.command {
        Commands::Aggregate => pipeline::aggregate(&config),
        Commands::Plot => pipeline::plot(&config),
    };
    if let Err(err) = &result {
        error!("{err:#?}");
    }
    result
}
