//! Shared ownership of the live graph.
//!
//! Ingestion and planning both mutate one long-lived graph. Planning
//! sessions work against a cloned snapshot and commit their simulated
//! fills back through [`SharedGraph::commit_fills`], which re-validates
//! every fill against live capacity inside one short write lock. A
//! conflicting commit leaves the live graph untouched so the caller can
//! replan against a fresh snapshot.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard};

use router_types::{OrderHash, OrderUpdate};

use crate::{BatchOutcome, LiquidityGraph};

/// Errors raised when committing a planned set of fills.
#[derive(Debug, Error)]
pub enum CommitError {
	/// The live graph no longer has the capacity the plan consumed; the
	/// plan was computed against a stale snapshot.
	#[error("live graph cannot satisfy fill of {amount} on order {hash}")]
	Conflict { hash: OrderHash, amount: u128 },
}

/// Cloneable handle to the process-lifetime liquidity graph.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
	inner: Arc<RwLock<LiquidityGraph>>,
}

impl SharedGraph {
	pub fn new(graph: LiquidityGraph) -> Self {
		Self {
			inner: Arc::new(RwLock::new(graph)),
		}
	}

	/// Immutable snapshot of the current graph state.
	pub async fn snapshot(&self) -> LiquidityGraph {
		self.inner.read().await.clone()
	}

	/// Read access for snapshot accessors that do not need a full clone.
	pub async fn read(&self) -> RwLockReadGuard<'_, LiquidityGraph> {
		self.inner.read().await
	}

	/// Applies an ingestion batch under the write lock.
	pub async fn batch_update(
		&self,
		updates: impl IntoIterator<Item = OrderUpdate>,
	) -> BatchOutcome {
		self.inner.write().await.batch_update(updates)
	}

	/// Commits a plan's fills to the live graph, all-or-nothing.
	///
	/// Every fill is validated against live remaining capacity before any
	/// is applied; a single shortfall aborts the whole commit with
	/// [`CommitError::Conflict`].
	pub async fn commit_fills(&self, fills: &[(OrderHash, u128)]) -> Result<(), CommitError> {
		let mut graph = self.inner.write().await;

		for (hash, amount) in fills {
			let remaining = graph.remaining_capacity(hash).unwrap_or(0);
			if remaining < *amount {
				return Err(CommitError::Conflict {
					hash: hash.clone(),
					amount: *amount,
				});
			}
		}
		for (hash, amount) in fills {
			graph
				.simulate_fill(hash, *amount)
				.expect("validated fill cannot fail");
		}
		Ok(())
	}
}
