//! Market-sell planning over the shared liquidity graph.
//!
//! Route enumeration and evaluation run against an immutable snapshot, so
//! a planning session never holds the graph lock while it computes. The
//! resulting fills are committed back to the live graph under one short
//! write lock; if ingestion consumed the liquidity in the meantime the
//! whole plan is recomputed against a fresh snapshot.

use rust_decimal::Decimal;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use router_graph::{CommitError, SharedGraph};
use router_types::Asset;

pub mod evaluate;
pub mod plan;
pub mod route;
pub mod session;

pub use evaluate::{evaluate_route, RouteQuote};
pub use plan::{FillLedger, SellPlan};
pub use route::{enumerate_routes, Route};
pub use session::{SellSession, SessionLimits, SessionPhase};

/// Terminal errors of a planning call.
#[derive(Debug, Error)]
pub enum PlanError {
	/// The graph cannot satisfy the requested amount within the session's
	/// iteration bound.
	#[error("insufficient liquidity to satisfy the requested amount")]
	InsufficientLiquidity,
	/// The session's deadline or replan budget was exhausted.
	#[error("planning deadline exceeded")]
	Timeout,
	/// The achieved average price violates the caller-supplied bound.
	#[error("average price {price} exceeds limit {limit}")]
	PriceToleranceExceeded { price: Decimal, limit: Decimal },
}

/// Tunables for the planning service.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
	pub max_hops: usize,
	pub max_iterations: u32,
	/// Wall-clock budget per planning call, including replans.
	pub deadline: Option<Duration>,
	/// How many stale-snapshot replans to attempt before giving up.
	pub commit_retries: u32,
}

impl Default for PlannerConfig {
	fn default() -> Self {
		Self {
			max_hops: 3,
			max_iterations: 64,
			deadline: None,
			commit_retries: 4,
		}
	}
}

/// Planning service bound to the process-lifetime graph.
pub struct PlannerService {
	graph: SharedGraph,
	config: PlannerConfig,
}

impl PlannerService {
	pub fn new(graph: SharedGraph, config: PlannerConfig) -> Self {
		Self { graph, config }
	}

	/// Computes and commits an execution plan selling `sell_amount` of
	/// `source` for `target`.
	pub async fn plan_sell(
		&self,
		source: &Asset,
		target: &Asset,
		sell_amount: u128,
	) -> Result<SellPlan, PlanError> {
		let session_id = Uuid::new_v4();
		let deadline = self.config.deadline.map(|budget| Instant::now() + budget);
		let limits = SessionLimits {
			max_hops: self.config.max_hops,
			max_iterations: self.config.max_iterations,
			deadline,
		};

		let mut attempt = 0u32;
		loop {
			if let Some(deadline) = deadline {
				if Instant::now() >= deadline {
					return Err(PlanError::Timeout);
				}
			}

			let mut snapshot = self.graph.snapshot().await;
			let plan = SellSession::new(
				&mut snapshot,
				source.clone(),
				target.clone(),
				sell_amount,
				limits,
			)
			.run()?;

			match self.graph.commit_fills(&plan.fills.to_vec()).await {
				Ok(()) => {
					info!(
						session = %session_id,
						%source,
						%target,
						amount_sold = plan.amount_sold,
						amount_bought = plan.amount_bought,
						orders = plan.fills.len(),
						"sell plan committed"
					);
					return Ok(plan);
				}
				Err(e @ CommitError::Conflict { .. }) => {
					attempt += 1;
					if attempt > self.config.commit_retries {
						warn!(
							session = %session_id,
							attempts = attempt,
							"replan budget exhausted against a moving graph"
						);
						return Err(PlanError::Timeout);
					}
					debug!(session = %session_id, error = %e, attempt, "stale snapshot, replanning");
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use router_graph::LiquidityGraph;
	use router_types::{Order, OrderHash, OrderState};

	fn shared() -> SharedGraph {
		let mut graph = LiquidityGraph::new();
		graph
			.add_order(
				Order::new("TKT", "TKM", 100, 200).unwrap(),
				OrderState::fillable("0xo1"),
			)
			.unwrap();
		graph
			.add_order(
				Order::new("TKT", "TKM", 50, 75).unwrap(),
				OrderState::fillable("0xo2"),
			)
			.unwrap();
		SharedGraph::new(graph)
	}

	#[tokio::test]
	async fn test_plan_commits_to_live_graph() {
		let graph = shared();
		let planner = PlannerService::new(graph.clone(), PlannerConfig::default());

		let plan = planner
			.plan_sell(&"TKT".into(), &"TKM".into(), 120)
			.await
			.unwrap();
		assert_eq!(plan.amount_sold, 120);
		assert_eq!(plan.amount_bought, 230);
		assert_eq!(
			plan.fills.to_vec(),
			vec![(OrderHash::from("0xo1"), 100), (OrderHash::from("0xo2"), 20)]
		);

		// Live graph reflects the committed consumption
		let live = graph.read().await;
		assert!(!live.contains(&"0xo1".into()));
		assert_eq!(live.remaining_capacity(&"0xo2".into()).unwrap(), 30);
	}

	#[tokio::test]
	async fn test_second_plan_sees_consumed_liquidity() {
		let graph = shared();
		let planner = PlannerService::new(graph.clone(), PlannerConfig::default());

		planner
			.plan_sell(&"TKT".into(), &"TKM".into(), 120)
			.await
			.unwrap();
		// 30 of capacity left; asking for 40 must fail terminally
		let err = planner
			.plan_sell(&"TKT".into(), &"TKM".into(), 40)
			.await
			.unwrap_err();
		assert!(matches!(err, PlanError::InsufficientLiquidity));
	}

	#[tokio::test]
	async fn test_edgeless_pair_fails_immediately() {
		let planner = PlannerService::new(shared(), PlannerConfig::default());
		let err = planner
			.plan_sell(&"TKM".into(), &"TKT".into(), 10)
			.await
			.unwrap_err();
		assert!(matches!(err, PlanError::InsufficientLiquidity));
	}
}
