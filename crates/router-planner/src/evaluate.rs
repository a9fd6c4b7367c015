//! Route evaluation: walking a fixed route against a graph snapshot.

use tracing::debug;

use router_graph::{GraphError, LiquidityGraph};
use router_types::OrderHash;

use crate::route::Route;

/// The outcome of evaluating one route for a given available amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuote {
	/// Per-hop `(order, fill)` pairs in route order.
	pub fills: Vec<(OrderHash, u128)>,
	/// Amount obtainable at the route's destination.
	pub output: u128,
}

impl RouteQuote {
	/// Fill consumed at the first hop, i.e. the amount of the requested
	/// sell this quote actually spends.
	pub fn first_hop_fill(&self) -> u128 {
		self.fills.first().map(|(_, fill)| *fill).unwrap_or(0)
	}
}

/// Walks the route hop by hop, picking the best order at each hop.
///
/// Each hop fills `min(remaining capacity, available)` and converts it at
/// the order's rate with truncating integer division. The truncation is
/// intentional (never overpay) and compounds across long routes.
///
/// A hop without any order fails the whole route with
/// [`GraphError::NoOrdersForPair`]; callers exclude such routes from the
/// candidate set. Multiplication overflow fails the route the same way.
pub fn evaluate_route(
	graph: &LiquidityGraph,
	route: &Route,
	available_amount: u128,
) -> Result<RouteQuote, GraphError> {
	let mut fills = Vec::with_capacity(route.hop_count());
	let mut available = available_amount;

	for (source, target) in route.hops() {
		let hash = graph.best_order(source, target)?;
		let order = graph.order(&hash).expect("best_order returned live hash");

		let remaining = graph.remaining_capacity(&hash)?;
		let hop_fill = remaining.min(available);
		available = order.convert(hop_fill).ok_or_else(|| {
			debug!(order = %hash, fill = hop_fill, "hop conversion overflow");
			GraphError::AmountOverflow(hash.clone())
		})?;

		fills.push((hash, hop_fill));
	}

	Ok(RouteQuote {
		fills,
		output: available,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use router_types::{Asset, Order, OrderState};

	fn graph(orders: &[(&str, &str, &str, u128, u128)]) -> LiquidityGraph {
		let mut graph = LiquidityGraph::new();
		for (hash, source, target, source_amount, target_amount) in orders {
			graph
				.add_order(
					Order::new(*source, *target, *source_amount, *target_amount).unwrap(),
					OrderState::fillable(*hash),
				)
				.unwrap();
		}
		graph
	}

	fn route(assets: &[&str]) -> Route {
		Route::new(assets.iter().map(|a| Asset::from(*a)).collect())
	}

	#[test]
	fn test_single_hop_respects_capacity() {
		let graph = graph(&[("0x1", "TKA", "TKB", 50, 75)]);
		let quote = evaluate_route(&graph, &route(&["TKA", "TKB"]), 120).unwrap();

		assert_eq!(quote.fills, vec![(OrderHash::from("0x1"), 50)]);
		assert_eq!(quote.output, 75);
		assert_eq!(quote.first_hop_fill(), 50);
	}

	#[test]
	fn test_truncating_division_per_hop() {
		let graph = graph(&[("0x1", "TKA", "TKB", 50, 75)]);
		let quote = evaluate_route(&graph, &route(&["TKA", "TKB"]), 20).unwrap();

		// floor(20 * 75 / 50) = 30
		assert_eq!(quote.output, 30);
	}

	#[test]
	fn test_multi_hop_chains_output_into_next_fill() {
		let graph = graph(&[
			("0x1", "TKA", "TKB", 100, 40),
			("0x2", "TKB", "TKC", 100, 300),
		]);
		let quote = evaluate_route(&graph, &route(&["TKA", "TKB", "TKC"]), 100).unwrap();

		// Hop 1: fill 100 -> 40; hop 2: fill 40 -> floor(40 * 300 / 100) = 120
		assert_eq!(
			quote.fills,
			vec![(OrderHash::from("0x1"), 100), (OrderHash::from("0x2"), 40)]
		);
		assert_eq!(quote.output, 120);
	}

	#[test]
	fn test_missing_hop_fails_whole_route() {
		let graph = graph(&[("0x1", "TKA", "TKB", 100, 200)]);
		assert!(matches!(
			evaluate_route(&graph, &route(&["TKA", "TKB", "TKC"]), 100),
			Err(GraphError::NoOrdersForPair { .. })
		));
	}

	#[test]
	fn test_monotonic_in_available_amount() {
		let graph = graph(&[
			("0x1", "TKA", "TKB", 100, 150),
			("0x2", "TKB", "TKC", 70, 90),
		]);
		let r = route(&["TKA", "TKB", "TKC"]);

		let mut previous = 0;
		for available in 0..=150 {
			let output = evaluate_route(&graph, &r, available).unwrap().output;
			assert!(
				output >= previous,
				"output shrank at available={available}: {output} < {previous}"
			);
			previous = output;
		}
		// Saturated: capacity caps further growth
		assert_eq!(
			evaluate_route(&graph, &r, 1_000).unwrap().output,
			evaluate_route(&graph, &r, 10_000).unwrap().output
		);
	}

	#[test]
	fn test_overflow_excludes_route() {
		let graph = graph(&[("0x1", "TKA", "TKB", 2, u128::MAX)]);
		assert!(evaluate_route(&graph, &route(&["TKA", "TKB"]), 1).is_ok());
		assert!(matches!(
			evaluate_route(&graph, &route(&["TKA", "TKB"]), 2),
			Err(GraphError::AmountOverflow(_))
		));
	}
}
