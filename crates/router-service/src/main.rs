use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use router_config::ConfigLoader;
use router_core::RouterBuilder;
use router_ingest::MemorySource;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "liquidity-router")]
#[command(about = "Liquidity graph routing service", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	#[arg(long, env = "ROUTER_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the routing service
	Start,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match cli.command {
		Some(Commands::Start) | None => start_service(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
	}
}

async fn start_service(cli: Cli) -> Result<()> {
	info!("Starting liquidity router");
	info!("Loading configuration from: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	info!("Configuration loaded successfully");
	info!("Router name: {}", config.router.name);
	info!("Sync interval: {}s", config.ingest.sync_interval_secs);

	// Remote order-book sources get registered here; the in-memory source
	// keeps the service runnable until one is wired in.
	let engine = RouterBuilder::new(config)
		.with_source(Box::new(MemorySource::new("memory")))
		.build()
		.context("Failed to build router engine")?;

	info!("Liquidity router started successfully");

	engine.run().await.context("Router engine failed")?;

	info!("Liquidity router stopped");
	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	info!("Configuration is valid");
	info!("Router name: {}", config.router.name);
	info!(
		"Planner bounds: max_hops={}, max_iterations={}, commit_retries={}",
		config.planner.max_hops, config.planner.max_iterations, config.planner.commit_retries
	);
	if let Some(deadline_ms) = config.planner.deadline_ms {
		info!("Planning deadline: {}ms", deadline_ms);
	}
	if let Some(max_price) = config.planner.max_price {
		info!("Price bound: {}", max_price);
	}
	info!("Sync interval: {}s", config.ingest.sync_interval_secs);

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}
