//! Configuration types.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level router configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub router: RouterSettings,
	#[serde(default)]
	pub planner: PlannerSettings,
	#[serde(default)]
	pub ingest: IngestSettings,
}

/// General service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterSettings {
	#[serde(default = "default_name")]
	pub name: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Event bus capacity per subscriber.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			name: default_name(),
			log_level: default_log_level(),
			event_capacity: default_event_capacity(),
		}
	}
}

/// Bounds applied to every planning session.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerSettings {
	#[serde(default = "default_max_hops")]
	pub max_hops: usize,
	#[serde(default = "default_max_iterations")]
	pub max_iterations: u32,
	/// Wall-clock budget per planning call, in milliseconds. Absent means
	/// no deadline beyond the iteration bound.
	#[serde(default)]
	pub deadline_ms: Option<u64>,
	#[serde(default = "default_commit_retries")]
	pub commit_retries: u32,
	/// Maximum acceptable average price (`sold / bought`) enforced after
	/// planning. Absent disables the check.
	#[serde(default)]
	pub max_price: Option<Decimal>,
}

impl Default for PlannerSettings {
	fn default() -> Self {
		Self {
			max_hops: default_max_hops(),
			max_iterations: default_max_iterations(),
			deadline_ms: None,
			commit_retries: default_commit_retries(),
			max_price: None,
		}
	}
}

/// Feed synchronization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestSettings {
	#[serde(default = "default_sync_interval_secs")]
	pub sync_interval_secs: u64,
}

impl Default for IngestSettings {
	fn default() -> Self {
		Self {
			sync_interval_secs: default_sync_interval_secs(),
		}
	}
}

fn default_name() -> String {
	"liquidity-router".to_string()
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_event_capacity() -> usize {
	1000
}

fn default_max_hops() -> usize {
	3
}

fn default_max_iterations() -> u32 {
	64
}

fn default_commit_retries() -> u32 {
	4
}

fn default_sync_interval_secs() -> u64 {
	30
}
