use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use event_shapes::config::{RunConfig, load_run_config};
use event_shapes::export::records::writer_for_path;
use event_shapes::export::summary::write_report;
use event_shapes::generator::ToyEventGenerator;
use event_shapes::harness::{
    ComparisonHarness, CsvRecords, HarnessSettings, RunSummary, run_sequential, run_sharded,
};
use event_shapes::thrust::{AcceleratedThrust, AnalyzerSettings, BaselineThrust};
use tracing::info;

/// Cross-validate the accelerated thrust optimizer against the exhaustive baseline on toy events.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Thrust / major / minor / oblateness cross-validation and timing"
)]
struct Cli {
    /// Run configuration (TOML if the extension is .toml, YAML otherwise)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of events to generate (overrides the configuration)
    #[arg(long)]
    events: Option<usize>,

    /// Generator seed (overrides the configuration)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of leading events to list and record
    #[arg(long)]
    list: Option<usize>,

    /// Record every event instead of only the listed ones
    #[arg(long, default_value_t = false)]
    every: bool,

    /// Worker threads; more than one shards the run
    #[arg(long)]
    workers: Option<usize>,

    /// Output CSV file (use '-' for stdout)
    #[arg(long, default_value = "artifacts/thrust.csv")]
    output: PathBuf,

    /// Optional JSON run summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let settings = HarnessSettings::from(&config);
    let analyzer = AnalyzerSettings::from(&config.tolerance);
    let make = || {
        (
            BaselineThrust::new(analyzer),
            AcceleratedThrust::new(analyzer),
        )
    };

    let mut generator = ToyEventGenerator::new(&config.generator)?;
    let context = || format!("cannot write records to {}", cli.output.display());
    let writer = writer_for_path(&cli.output).with_context(context)?;
    let mut records = CsvRecords::new(writer).with_context(context)?;

    let events = config.harness.events;
    let workers = config.harness.workers;
    info!(events, workers, seed = config.generator.seed, "starting comparison");
    let summary = if workers > 1 {
        let corpus: Vec<_> = generator
            .by_ref()
            .take(events)
            .map(|event| (event.index, event.momenta()))
            .collect();
        run_sharded(&corpus, workers, make, &settings, &mut records)?
    } else {
        let (baseline, accelerated) = make();
        let mut harness = ComparisonHarness::new(baseline, accelerated, settings);
        let stream = generator
            .by_ref()
            .take(events)
            .map(|event| (event.index, event.momenta()));
        run_sequential(&mut harness, stream, &mut records)?;
        harness.into_summary()
    };
    records.finish()?;

    // Keep stdout clean for the CSV stream when it goes there.
    if cli.output == Path::new("-") {
        print_report(&mut io::stderr().lock(), &summary, &generator)?;
    } else {
        print_report(&mut io::stdout().lock(), &summary, &generator)?;
    }

    if let Some(path) = &cli.summary {
        write_report(path, &summary.to_report(generator.stats().events))
            .with_context(|| format!("cannot write summary to {}", path.display()))?;
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => load_run_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(events) = cli.events {
        config.harness.events = events;
    }
    if let Some(seed) = cli.seed {
        config.generator.seed = seed;
    }
    if let Some(list) = cli.list {
        config.harness.list_first = list;
    }
    if let Some(workers) = cli.workers {
        config.harness.workers = workers;
    }
    config.harness.record_every |= cli.every;
    config.validate()?;
    Ok(config)
}

fn print_report(
    out: &mut dyn Write,
    summary: &RunSummary,
    generator: &ToyEventGenerator,
) -> io::Result<()> {
    for listing in &summary.listings {
        writeln!(out, "{listing}")?;
    }
    for histogram in summary.histograms() {
        writeln!(out, "{histogram}")?;
    }
    writeln!(out, "{}", generator.stats())?;
    writeln!(out, "{summary}")
}
