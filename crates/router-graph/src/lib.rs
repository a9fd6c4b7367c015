//! The liquidity graph: assets as nodes, fillable orders as keyed edges.
//!
//! [`LiquidityGraph`] owns the order table, the order-state table and a
//! directed multigraph adjacency over them. The three structures move in
//! lockstep: an order hash has an edge if and only if its state exists,
//! is fillable and has remaining capacity. Orders violating this are
//! absent entirely; there are no dangling edges and no orphan states.
//!
//! The adjacency holds hash references only, never order data, so the
//! tables stay the single owner of every record.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::warn;

use router_types::{Asset, Order, OrderHash, OrderState, OrderUpdate};

pub mod shared;

pub use shared::{CommitError, SharedGraph};

/// Errors raised by graph mutations and lookups.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The order hash is already present in the graph.
	#[error("order already exists in graph: {0}")]
	DuplicateOrder(OrderHash),
	/// No order with this hash is present in the graph.
	#[error("order not found in graph: {0}")]
	OrderNotFound(OrderHash),
	/// The supplied state is not fillable (or already at capacity).
	#[error("order is not fillable: {0}")]
	NotFillable(OrderHash),
	/// No edge connects the requested asset pair.
	#[error("no orders from {from} to {target}")]
	NoOrdersForPair { from: Asset, target: Asset },
	/// Amount arithmetic overflowed while converting through an order.
	#[error("amount overflow converting through order {0}")]
	AmountOverflow(OrderHash),
}

/// One directed edge of the graph, suitable for external serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRef {
	pub source: Asset,
	pub target: Asset,
	pub hash: OrderHash,
}

/// Summary of one `batch_update` application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
	pub inserted: usize,
	pub updated: usize,
	pub removed: usize,
	pub rejected: usize,
}

impl BatchOutcome {
	pub fn is_clean(&self) -> bool {
		self.rejected == 0
	}
}

/// Directed multigraph of assets connected by fillable orders.
#[derive(Debug, Clone, Default)]
pub struct LiquidityGraph {
	orders: HashMap<OrderHash, Order>,
	states: HashMap<OrderHash, OrderState>,
	adjacency: BTreeMap<Asset, BTreeMap<Asset, BTreeSet<OrderHash>>>,
	version: u64,
}

impl LiquidityGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a new fillable order and its edge.
	///
	/// Rejects hashes already present with [`GraphError::DuplicateOrder`]
	/// and states that are not fillable, already at capacity, or whose
	/// fill progress exceeds the order size with [`GraphError::NotFillable`].
	pub fn add_order(&mut self, order: Order, state: OrderState) -> Result<(), GraphError> {
		if self.states.contains_key(&state.hash) {
			return Err(GraphError::DuplicateOrder(state.hash));
		}
		if !state.status.is_fillable() || state.filled_amount >= order.source_amount {
			return Err(GraphError::NotFillable(state.hash));
		}

		self.adjacency
			.entry(order.source_asset.clone())
			.or_default()
			.entry(order.target_asset.clone())
			.or_default()
			.insert(state.hash.clone());
		self.orders.insert(state.hash.clone(), order);
		self.states.insert(state.hash.clone(), state);
		self.version += 1;
		Ok(())
	}

	/// Deletes an order, its state and its edge.
	pub fn remove_order(&mut self, hash: &OrderHash) -> Result<(), GraphError> {
		let order = self
			.orders
			.remove(hash)
			.ok_or_else(|| GraphError::OrderNotFound(hash.clone()))?;
		self.states.remove(hash);

		if let Some(targets) = self.adjacency.get_mut(&order.source_asset) {
			if let Some(hashes) = targets.get_mut(&order.target_asset) {
				hashes.remove(hash);
				if hashes.is_empty() {
					targets.remove(&order.target_asset);
				}
			}
			if targets.is_empty() {
				self.adjacency.remove(&order.source_asset);
			}
		}
		self.version += 1;
		Ok(())
	}

	/// Replaces the stored state for an order, removing the order when the
	/// new state is terminal or the order is fully consumed.
	pub fn update_order(&mut self, state: OrderState) -> Result<(), GraphError> {
		let order = self
			.orders
			.get(&state.hash)
			.ok_or_else(|| GraphError::OrderNotFound(state.hash.clone()))?;

		if !state.status.is_fillable() || state.filled_amount >= order.source_amount {
			self.remove_order(&state.hash)
		} else {
			self.states.insert(state.hash.clone(), state);
			self.version += 1;
			Ok(())
		}
	}

	/// Consumes `amount` of an order's capacity as an in-memory projection.
	///
	/// No external ledger is touched; this exists so a planning pass can
	/// account for liquidity consumed by its own earlier steps. Applies
	/// the same removal rule as [`update_order`](Self::update_order).
	pub fn simulate_fill(&mut self, hash: &OrderHash, amount: u128) -> Result<(), GraphError> {
		let state = self
			.states
			.get(hash)
			.ok_or_else(|| GraphError::OrderNotFound(hash.clone()))?;

		let mut next = state.clone();
		next.filled_amount = next.filled_amount.saturating_add(amount);
		self.update_order(next)
	}

	/// Applies a batch of upserts in input order.
	///
	/// Unseen hashes are added, known hashes updated; later entries for
	/// the same hash override earlier ones. A rejected entry is logged
	/// and skipped without poisoning the rest of the batch.
	pub fn batch_update(&mut self, updates: impl IntoIterator<Item = OrderUpdate>) -> BatchOutcome {
		let mut outcome = BatchOutcome::default();
		for update in updates {
			let hash = update.state.hash.clone();
			let known = self.states.contains_key(&hash);
			let result = if known {
				self.update_order(update.state)
			} else {
				self.add_order(update.order, update.state)
			};
			match result {
				Ok(()) if !known => outcome.inserted += 1,
				Ok(()) if self.states.contains_key(&hash) => outcome.updated += 1,
				Ok(()) => outcome.removed += 1,
				Err(e) => {
					warn!(order = %hash, error = %e, "rejected batch entry");
					outcome.rejected += 1;
				}
			}
		}
		outcome
	}

	/// The hash of the maximum-rate order among the pair's edges.
	///
	/// Ties break deterministically toward the lowest hash: candidates
	/// iterate in hash order and only a strictly greater rate displaces
	/// the current best.
	pub fn best_order(&self, source: &Asset, target: &Asset) -> Result<OrderHash, GraphError> {
		let hashes = self
			.adjacency
			.get(source)
			.and_then(|targets| targets.get(target))
			.filter(|hashes| !hashes.is_empty())
			.ok_or_else(|| GraphError::NoOrdersForPair {
				from: source.clone(),
				target: target.clone(),
			})?;

		let mut best: Option<(&OrderHash, &Order)> = None;
		for hash in hashes {
			let order = &self.orders[hash];
			match best {
				Some((_, current)) if order.cmp_rate(current).is_le() => {}
				_ => best = Some((hash, order)),
			}
		}
		Ok(best.expect("non-empty edge set").0.clone())
	}

	/// Unconsumed capacity of an order, in source-asset units.
	pub fn remaining_capacity(&self, hash: &OrderHash) -> Result<u128, GraphError> {
		let order = self
			.orders
			.get(hash)
			.ok_or_else(|| GraphError::OrderNotFound(hash.clone()))?;
		let state = &self.states[hash];
		Ok(order.source_amount - state.filled_amount)
	}

	pub fn order(&self, hash: &OrderHash) -> Option<&Order> {
		self.orders.get(hash)
	}

	pub fn state(&self, hash: &OrderHash) -> Option<&OrderState> {
		self.states.get(hash)
	}

	pub fn contains(&self, hash: &OrderHash) -> bool {
		self.states.contains_key(hash)
	}

	/// Assets directly reachable from `source` through a live edge.
	pub fn successors(&self, source: &Asset) -> impl Iterator<Item = &Asset> {
		self.adjacency
			.get(source)
			.into_iter()
			.flat_map(|targets| targets.keys())
	}

	/// Full order table snapshot accessor.
	pub fn orders(&self) -> impl Iterator<Item = (&OrderHash, &Order)> {
		self.orders.iter()
	}

	/// Full order-state table snapshot accessor.
	pub fn order_states(&self) -> impl Iterator<Item = (&OrderHash, &OrderState)> {
		self.states.iter()
	}

	/// One `{source, target, hash}` entry per active order, in
	/// deterministic adjacency order.
	pub fn edges(&self) -> Vec<EdgeRef> {
		let mut edges = Vec::with_capacity(self.orders.len());
		for (source, targets) in &self.adjacency {
			for (target, hashes) in targets {
				for hash in hashes {
					edges.push(EdgeRef {
						source: source.clone(),
						target: target.clone(),
						hash: hash.clone(),
					});
				}
			}
		}
		edges
	}

	/// Every asset touching at least one live edge.
	pub fn assets(&self) -> Vec<Asset> {
		let mut assets = BTreeSet::new();
		for (source, targets) in &self.adjacency {
			assets.insert(source.clone());
			for target in targets.keys() {
				assets.insert(target.clone());
			}
		}
		assets.into_iter().collect()
	}

	pub fn order_count(&self) -> usize {
		self.orders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}

	/// Monotonic mutation counter, bumped by every successful mutation.
	pub fn version(&self) -> u64 {
		self.version
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use router_types::OrderStatus;

	fn update(
		hash: &str,
		source: &str,
		target: &str,
		source_amount: u128,
		target_amount: u128,
	) -> OrderUpdate {
		OrderUpdate::new(
			Order::new(source, target, source_amount, target_amount).unwrap(),
			OrderState::fillable(hash),
		)
	}

	fn graph_with(updates: Vec<OrderUpdate>) -> LiquidityGraph {
		let mut graph = LiquidityGraph::new();
		let outcome = graph.batch_update(updates);
		assert!(outcome.is_clean());
		graph
	}

	/// Edge present ⟺ state present ∧ fillable ∧ filled < source.
	fn assert_consistent(graph: &LiquidityGraph) {
		let edge_hashes: BTreeSet<_> = graph.edges().into_iter().map(|e| e.hash).collect();
		for (hash, state) in graph.order_states() {
			let order = graph.order(hash).expect("state without order");
			assert!(state.status.is_fillable());
			assert!(state.filled_amount < order.source_amount);
			assert!(edge_hashes.contains(hash), "state without edge: {hash}");
		}
		assert_eq!(edge_hashes.len(), graph.order_count());
	}

	#[test]
	fn test_add_and_lookup() {
		let graph = graph_with(vec![update("0xa1", "TKA", "TKB", 100, 200)]);
		let hash = OrderHash::from("0xa1");

		assert!(graph.contains(&hash));
		assert_eq!(graph.order(&hash).unwrap().source_amount, 100);
		assert_eq!(graph.remaining_capacity(&hash).unwrap(), 100);
		assert_consistent(&graph);
	}

	#[test]
	fn test_add_rejects_duplicates_and_unfillable() {
		let mut graph = graph_with(vec![update("0xa1", "TKA", "TKB", 100, 200)]);

		let dup = update("0xa1", "TKA", "TKB", 100, 200);
		assert!(matches!(
			graph.add_order(dup.order, dup.state),
			Err(GraphError::DuplicateOrder(_))
		));

		let cancelled = OrderUpdate::new(
			Order::new("TKA", "TKB", 10, 10).unwrap(),
			OrderState::new("0xa2", OrderStatus::Cancelled, 0),
		);
		assert!(matches!(
			graph.add_order(cancelled.order, cancelled.state),
			Err(GraphError::NotFillable(_))
		));

		// Fillable status but already at capacity
		let spent = OrderUpdate::new(
			Order::new("TKA", "TKB", 10, 10).unwrap(),
			OrderState::new("0xa3", OrderStatus::Fillable, 10),
		);
		assert!(matches!(
			graph.add_order(spent.order, spent.state),
			Err(GraphError::NotFillable(_))
		));
		assert_consistent(&graph);
	}

	#[test]
	fn test_remove_leaves_no_trace() {
		let mut graph = graph_with(vec![
			update("0xa1", "TKA", "TKB", 100, 200),
			update("0xa2", "TKA", "TKB", 50, 75),
		]);
		let hash = OrderHash::from("0xa1");

		graph.remove_order(&hash).unwrap();
		assert!(!graph.contains(&hash));
		assert!(graph.order(&hash).is_none());
		assert!(graph.state(&hash).is_none());
		assert!(graph.edges().iter().all(|e| e.hash != hash));
		assert!(matches!(
			graph.remove_order(&hash),
			Err(GraphError::OrderNotFound(_))
		));
		assert_consistent(&graph);

		// Removing the last edge of a pair prunes the adjacency entirely
		graph.remove_order(&OrderHash::from("0xa2")).unwrap();
		assert!(graph.is_empty());
		assert!(graph.assets().is_empty());
	}

	#[test]
	fn test_update_replaces_or_removes() {
		let mut graph = graph_with(vec![update("0xa1", "TKA", "TKB", 100, 200)]);

		graph
			.update_order(OrderState::new("0xa1", OrderStatus::Fillable, 40))
			.unwrap();
		assert_eq!(graph.remaining_capacity(&"0xa1".into()).unwrap(), 60);
		assert_consistent(&graph);

		// Terminal status removes
		graph
			.update_order(OrderState::new("0xa1", OrderStatus::Cancelled, 40))
			.unwrap();
		assert!(!graph.contains(&"0xa1".into()));

		assert!(matches!(
			graph.update_order(OrderState::fillable("0xa1")),
			Err(GraphError::OrderNotFound(_))
		));
	}

	#[test]
	fn test_simulate_fill_removal_rule() {
		let mut graph = graph_with(vec![update("0xa1", "TKA", "TKB", 100, 200)]);
		let hash = OrderHash::from("0xa1");

		graph.simulate_fill(&hash, 60).unwrap();
		assert_eq!(graph.remaining_capacity(&hash).unwrap(), 40);
		assert_consistent(&graph);

		// Consuming exactly the rest removes the order
		graph.simulate_fill(&hash, 40).unwrap();
		assert!(!graph.contains(&hash));
		assert!(matches!(
			graph.simulate_fill(&hash, 1),
			Err(GraphError::OrderNotFound(_))
		));
	}

	#[test]
	fn test_best_order_picks_maximum_rate() {
		// A at rate 2.0, B at rate 1.5
		let graph = graph_with(vec![
			update("0xbb", "TKA", "TKB", 50, 75),
			update("0xaa", "TKA", "TKB", 100, 200),
		]);
		assert_eq!(
			graph.best_order(&"TKA".into(), &"TKB".into()).unwrap(),
			OrderHash::from("0xaa")
		);

		assert!(matches!(
			graph.best_order(&"TKB".into(), &"TKA".into()),
			Err(GraphError::NoOrdersForPair { .. })
		));
	}

	#[test]
	fn test_best_order_tie_breaks_to_lowest_hash() {
		// Identical 2.0 rates; lowest hash must win
		let graph = graph_with(vec![
			update("0xc2", "TKA", "TKB", 10, 20),
			update("0xc1", "TKA", "TKB", 100, 200),
		]);
		assert_eq!(
			graph.best_order(&"TKA".into(), &"TKB".into()).unwrap(),
			OrderHash::from("0xc1")
		);
	}

	#[test]
	fn test_batch_update_idempotent() {
		let updates = vec![
			update("0xa1", "TKA", "TKB", 100, 200),
			update("0xa2", "TKB", "TKC", 50, 75),
		];
		let mut once = LiquidityGraph::new();
		once.batch_update(updates.clone());

		let mut twice = LiquidityGraph::new();
		twice.batch_update(updates.clone());
		twice.batch_update(updates);

		assert_eq!(once.edges(), twice.edges());
		let states = |g: &LiquidityGraph| -> BTreeMap<OrderHash, OrderState> {
			g.order_states()
				.map(|(h, s)| (h.clone(), s.clone()))
				.collect()
		};
		assert_eq!(states(&once), states(&twice));
		assert_consistent(&twice);
	}

	#[test]
	fn test_batch_update_last_entry_wins() {
		let mut graph = LiquidityGraph::new();
		let order = Order::new("TKA", "TKB", 100, 200).unwrap();
		let outcome = graph.batch_update(vec![
			OrderUpdate::new(order.clone(), OrderState::fillable("0xa1")),
			OrderUpdate::new(order, OrderState::new("0xa1", OrderStatus::Fillable, 30)),
		]);

		assert_eq!(outcome.inserted, 1);
		assert_eq!(outcome.updated, 1);
		assert_eq!(graph.remaining_capacity(&"0xa1".into()).unwrap(), 70);
	}

	#[test]
	fn test_batch_update_survives_bad_entries() {
		let mut graph = LiquidityGraph::new();
		let bad = OrderUpdate::new(
			Order::new("TKA", "TKB", 10, 10).unwrap(),
			OrderState::new("0xbad", OrderStatus::Expired, 0),
		);
		let outcome = graph.batch_update(vec![
			update("0xa1", "TKA", "TKB", 100, 200),
			bad,
			update("0xa2", "TKB", "TKC", 50, 75),
		]);

		assert_eq!(outcome.inserted, 2);
		assert_eq!(outcome.rejected, 1);
		assert_eq!(graph.order_count(), 2);
		assert_consistent(&graph);
	}

	#[test]
	fn test_batch_update_counts_removals() {
		let mut graph = graph_with(vec![update("0xa1", "TKA", "TKB", 100, 200)]);
		let outcome = graph.batch_update(vec![OrderUpdate::new(
			Order::new("TKA", "TKB", 100, 200).unwrap(),
			OrderState::new("0xa1", OrderStatus::FullyFilled, 100),
		)]);

		assert_eq!(outcome.removed, 1);
		assert!(graph.is_empty());
	}

	#[test]
	fn test_multigraph_keeps_competing_edges() {
		let graph = graph_with(vec![
			update("0xa1", "TKA", "TKB", 100, 200),
			update("0xa2", "TKA", "TKB", 50, 75),
		]);
		assert_eq!(graph.edges().len(), 2);
		assert_eq!(graph.assets(), vec![Asset::from("TKA"), Asset::from("TKB")]);
		assert_eq!(
			graph.successors(&"TKA".into()).collect::<Vec<_>>(),
			vec![&Asset::from("TKB")]
		);
	}
}
