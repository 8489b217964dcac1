use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use txcompose::application::dispatcher::Dispatcher;
use txcompose::application::scenario::ScenarioRunner;
use txcompose::config::NetworkConfig;
use txcompose::domain::simulation::{Host, HostErrorSimulation};
use txcompose::infrastructure::in_memory::{AtomicSequenceGenerator, LoopbackTransport};
use txcompose::interfaces::csv::outcome_writer::OutcomeWriter;
use txcompose::interfaces::csv::scenario_reader::ScenarioReader;
use txcompose::network::Network;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input scenario CSV file
    input: PathBuf,

    /// Network to render for: gpapi, nts or vaps. Overrides the config file.
    #[arg(long)]
    network: Option<Network>,

    /// Host to address: primary or secondary. Overrides the config file.
    #[arg(long)]
    host: Option<Host>,

    /// JSON network configuration (company id, unit number, terminal id).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated host errors, e.g. `primary:timeout,primary:decline`.
    #[arg(long)]
    simulate: Option<String>,

    /// Batch number handed out with generated tracing numbers.
    #[arg(long, default_value_t = 1)]
    batch: u32,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "txcompose=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => NetworkConfig::from_json_file(path).into_diagnostic()?,
        None => NetworkConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    let dispatcher = Dispatcher::new(Box::new(LoopbackTransport::new()), config);
    let mut runner = ScenarioRunner::new(dispatcher, Box::new(AtomicSequenceGenerator::new(cli.batch)));
    if let Some(simulate) = &cli.simulate {
        runner = runner.with_simulation(HostErrorSimulation::parse(simulate).into_diagnostic()?);
    }

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = ScenarioReader::new(file);
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    for step_result in reader.steps() {
        match step_result {
            Ok(step) => match runner.run_step(&step).await {
                Ok(outcome) => writer.write(&outcome).into_diagnostic()?,
                Err(e) => eprintln!("Error processing step {}: {}", step.step, e),
            },
            Err(e) => {
                eprintln!("Error reading step: {}", e);
            }
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}
