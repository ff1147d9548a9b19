use anyhow::Result;
use cca_registry::{CcaConfig, DrySession, EngineRegistryBuilder, MockEngineFactory};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ccactl")]
#[command(about = "Exercise the CCA engine registry against the mock engine")]
#[command(version)]
#[command(long_about = "Loads a pipeline configuration, acquires an engine facade for every \
configured device and tuning mode, drives the configured number of frames through the full \
operation set, then tears everything down and prints a summary.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "cca.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Print the summary as JSON
    #[arg(long, help = "Print the run summary as JSON")]
    json: bool,
}

#[derive(Serialize)]
struct Summary {
    pairs: Vec<cca_registry::PairReport>,
    registry: cca_registry::RegistryStatsSnapshot,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# CCA registry configuration");
        println!("{}", toml::to_string_pretty(&CcaConfig::default())?);
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting ccactl v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match CcaConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let registry = EngineRegistryBuilder::new()
        .factory(MockEngineFactory::new())
        .build()?;

    let pairs = DrySession::new(&registry, &config).run().map_err(|e| {
        error!("Dry run failed: {}", e);
        e
    })?;

    registry.release_all();
    let summary = Summary {
        pairs,
        registry: registry.stats(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &Summary) {
    println!(
        "{:<8} {:<16} {:>8} {:>8} {:>8} {:>10}",
        "device", "mode", "frames", "pal", "skipped", "pal bytes"
    );
    for pair in &summary.pairs {
        println!(
            "{:<8} {:<16} {:>8} {:>8} {:>8} {:>10}",
            pair.device,
            format!("{:?}", pair.mode),
            pair.frames,
            pair.pal_runs,
            pair.pal_skipped,
            pair.pal_bytes
        );
    }
    println!(
        "registry: {} buckets, {} facades created, {} released",
        summary.registry.buckets,
        summary.registry.facades_created,
        summary.registry.facades_released
    );
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("cca_registry={},ccactl={}", log_level, log_level))
    });

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_target(true).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}
