//! sqlquery - polls SQL queries and emits each result row as a metric.

mod cli;

use cli::Cli;
use sqlquery_collector::config::{CollectorConfig, SAMPLE_CONFIG};
use sqlquery_collector::db::{self, QueryExecutor};
use sqlquery_collector::error::{CollectorError, Result};
use sqlquery_collector::logging;
use sqlquery_collector::query::{QueryRunner, RunConfig};
use sqlquery_collector::sink::MetricSink;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if cli.sample_config {
        print!("{SAMPLE_CONFIG}");
        return;
    }

    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    logging::init_stderr_logging(cli.log_directive());

    if let Err(e) = run(&cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let format = cli
        .parse_output_format()
        .map_err(CollectorError::config)?;

    // Precedence: CLI arguments, then the config file, then environment variables.
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = CollectorConfig::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);
    config.apply_env_defaults();
    config.validate()?;

    let db_config = config.database_config()?;
    let run_config = config.to_run_config();

    info!("Connecting to {}", db_config.display_string());
    let executor = db::connect(&db_config).await?;
    let mut sink = format.sink(std::io::stdout());

    let outcome = if cli.once {
        poll_once(executor.as_ref(), &run_config, sink.as_mut()).await
    } else {
        poll_forever(executor.as_ref(), &run_config, sink.as_mut(), config.interval()).await;
        Ok(())
    };

    executor.close().await?;
    outcome
}

async fn poll_once(
    executor: &dyn QueryExecutor,
    config: &RunConfig,
    sink: &mut dyn MetricSink,
) -> Result<()> {
    let summary = QueryRunner::new(executor, config).run(sink).await?;
    info!(
        "Ran {} queries, emitted {} records in {:?}",
        summary.queries, summary.records, summary.elapsed
    );
    Ok(())
}

/// Polls until interrupted. A failed cycle is logged and the next one
/// starts on schedule.
async fn poll_forever(
    executor: &dyn QueryExecutor,
    config: &RunConfig,
    sink: &mut dyn MetricSink,
    interval: Duration,
) {
    let runner = QueryRunner::new(executor, config);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Polling every {:?}", interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match runner.run(sink).await {
                    Ok(summary) => debug!(
                        "Cycle emitted {} records from {} queries in {:?}",
                        summary.records, summary.queries, summary.elapsed
                    ),
                    Err(e) => error!("{}: {}", e.category(), e),
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }
}
