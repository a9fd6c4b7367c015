//! Engine wiring: one shared graph, an ingestion path and a planning path.
//!
//! The [`RouterEngine`] owns the process-lifetime services and exposes the
//! query contract consumed by a presentation layer: sell planning plus
//! read-only snapshots of the order table, the state table and the edge
//! list. It returns structured data only; serialization is the caller's
//! business.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use router_config::Config;
use router_graph::{EdgeRef, SharedGraph};
use router_ingest::{IngestService, OrderSource, SyncSummary};
use router_planner::{PlanError, PlannerConfig, PlannerService, SellPlan};
use router_types::{
	Asset, EventBus, Order, OrderHash, OrderState, PlanEvent, RouterEvent,
};

#[derive(Debug, Error)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// The assembled router: ingestion and planning over one shared graph.
pub struct RouterEngine {
	config: Config,
	graph: SharedGraph,
	ingest: Arc<IngestService>,
	planner: Arc<PlannerService>,
	event_bus: EventBus,
}

impl std::fmt::Debug for RouterEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouterEngine")
			.field("config", &self.config)
			.field("sources", &self.ingest.source_count())
			.finish_non_exhaustive()
	}
}

impl RouterEngine {
	/// Runs the ingestion loop until the process receives ctrl-c.
	///
	/// The first tick fires immediately, so the graph is populated before
	/// the interval cadence begins.
	pub async fn run(&self) -> Result<(), CoreError> {
		let mut interval =
			tokio::time::interval(Duration::from_secs(self.config.ingest.sync_interval_secs));
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = interval.tick() => {
					let summary = self.ingest.sync_once().await;
					if summary.sources_failed > 0 {
						error!(failed = summary.sources_failed, "sources failed during sync");
					}
				}

				_ = tokio::signal::ctrl_c() => {
					info!("Shutting down router");
					break;
				}
			}
		}

		Ok(())
	}

	/// Forces one synchronization pass outside the interval cadence.
	pub async fn sync_once(&self) -> SyncSummary {
		self.ingest.sync_once().await
	}

	/// Plans a market sell and enforces the configured price bound.
	pub async fn plan_sell(
		&self,
		source: &Asset,
		target: &Asset,
		sell_amount: u128,
	) -> Result<SellPlan, PlanError> {
		let result = self.planner.plan_sell(source, target, sell_amount).await;

		match &result {
			Ok(plan) => {
				if let Some(limit) = self.config.planner.max_price {
					if let Err(e) = plan.check_price_limit(limit) {
						self.publish_plan_failure(source, target, &e);
						return Err(e);
					}
				}
				self.event_bus
					.publish(RouterEvent::Plan(PlanEvent::Completed {
						source_asset: source.clone(),
						target_asset: target.clone(),
						amount_sold: plan.amount_sold,
						amount_bought: plan.amount_bought,
					}))
					.ok();
			}
			Err(e) => self.publish_plan_failure(source, target, e),
		}

		result
	}

	fn publish_plan_failure(&self, source: &Asset, target: &Asset, error: &PlanError) {
		self.event_bus
			.publish(RouterEvent::Plan(PlanEvent::Failed {
				source_asset: source.clone(),
				target_asset: target.clone(),
				reason: error.to_string(),
			}))
			.ok();
	}

	/// Full order table, sorted by hash for stable output.
	pub async fn orders(&self) -> Vec<(OrderHash, Order)> {
		let graph = self.graph.read().await;
		let mut orders: Vec<_> = graph
			.orders()
			.map(|(hash, order)| (hash.clone(), order.clone()))
			.collect();
		orders.sort_by(|a, b| a.0.cmp(&b.0));
		orders
	}

	/// Full order-state table, sorted by hash for stable output.
	pub async fn order_states(&self) -> Vec<(OrderHash, OrderState)> {
		let graph = self.graph.read().await;
		let mut states: Vec<_> = graph
			.order_states()
			.map(|(hash, state)| (hash.clone(), state.clone()))
			.collect();
		states.sort_by(|a, b| a.0.cmp(&b.0));
		states
	}

	/// One `{source, target, hash}` entry per active order.
	pub async fn edges(&self) -> Vec<EdgeRef> {
		self.graph.read().await.edges()
	}

	/// Every asset currently touching a live edge.
	pub async fn assets(&self) -> Vec<Asset> {
		self.graph.read().await.assets()
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn config(&self) -> &Config {
		&self.config
	}
}

/// Builder assembling the engine from configuration and order sources.
pub struct RouterBuilder {
	config: Config,
	sources: Vec<Box<dyn OrderSource>>,
}

impl RouterBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			sources: Vec::new(),
		}
	}

	pub fn with_source(mut self, source: Box<dyn OrderSource>) -> Self {
		self.sources.push(source);
		self
	}

	pub fn build(self) -> Result<RouterEngine, CoreError> {
		if self.sources.is_empty() {
			return Err(CoreError::Config("No order sources configured".into()));
		}

		let event_bus = EventBus::new(self.config.router.event_capacity);
		let graph = SharedGraph::default();

		let ingest = Arc::new(IngestService::new(
			graph.clone(),
			event_bus.clone(),
			self.sources,
		));

		let planner_config = PlannerConfig {
			max_hops: self.config.planner.max_hops,
			max_iterations: self.config.planner.max_iterations,
			deadline: self.config.planner.deadline_ms.map(Duration::from_millis),
			commit_retries: self.config.planner.commit_retries,
		};
		let planner = Arc::new(PlannerService::new(graph.clone(), planner_config));

		Ok(RouterEngine {
			config: self.config,
			graph,
			ingest,
			planner,
			event_bus,
		})
	}
}
