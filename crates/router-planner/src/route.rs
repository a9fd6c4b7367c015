//! Route enumeration over a graph snapshot.

use serde::Serialize;
use std::collections::HashSet;

use router_graph::LiquidityGraph;
use router_types::Asset;

/// An ordered sequence of at least two assets forming a chain of
/// convertible hops.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Route(Vec<Asset>);

impl Route {
	pub fn new(assets: Vec<Asset>) -> Self {
		debug_assert!(assets.len() >= 2);
		Self(assets)
	}

	pub fn assets(&self) -> &[Asset] {
		&self.0
	}

	/// Consecutive `(source, target)` pairs along the route.
	pub fn hops(&self) -> impl Iterator<Item = (&Asset, &Asset)> {
		self.0.iter().zip(self.0.iter().skip(1))
	}

	pub fn hop_count(&self) -> usize {
		self.0.len() - 1
	}
}

/// All simple directed paths from `source` to `target` with at most
/// `max_hops` edges, over the given graph snapshot.
///
/// The adjacency iterates in asset order, so the result is deterministic
/// for a fixed snapshot. Must be re-invoked after any graph mutation:
/// previously valid routes may have lost their edges.
pub fn enumerate_routes(
	graph: &LiquidityGraph,
	source: &Asset,
	target: &Asset,
	max_hops: usize,
) -> Vec<Route> {
	let mut routes = Vec::new();
	if source == target || max_hops == 0 {
		return routes;
	}

	let mut path = vec![source.clone()];
	let mut visited: HashSet<Asset> = [source.clone()].into();
	walk(graph, target, max_hops, &mut path, &mut visited, &mut routes);
	routes
}

fn walk(
	graph: &LiquidityGraph,
	target: &Asset,
	max_hops: usize,
	path: &mut Vec<Asset>,
	visited: &mut HashSet<Asset>,
	routes: &mut Vec<Route>,
) {
	// A route recorded here spends path.len() hops; extending through an
	// intermediate node spends at least path.len() + 1.
	let current = path.last().expect("path never empty").clone();
	for next in graph.successors(&current).cloned().collect::<Vec<_>>() {
		if next == *target {
			if path.len() <= max_hops {
				let mut assets = path.clone();
				assets.push(next);
				routes.push(Route::new(assets));
			}
			continue;
		}
		if path.len() >= max_hops || visited.contains(&next) {
			continue;
		}
		path.push(next.clone());
		visited.insert(next.clone());
		walk(graph, target, max_hops, path, visited, routes);
		visited.remove(&next);
		path.pop();
	}
}
