//! The allocation loop as an explicit per-session state machine.
//!
//! Interleaved read-then-write across loop iterations is the trickiest
//! correctness property of planning: every committed increment consumes
//! simulated liquidity, which invalidates previously enumerated routes.
//! Modeling the loop as `Enumerating → Evaluating → Committing →
//! (Continue | Done | Failed)` keeps that boundary observable and lets
//! tests drive one transition at a time.

use std::time::Instant;
use tracing::{debug, trace};

use router_graph::LiquidityGraph;
use router_types::Asset;

use crate::evaluate::{evaluate_route, RouteQuote};
use crate::plan::{FillLedger, SellPlan};
use crate::route::{enumerate_routes, Route};
use crate::PlanError;

/// Bounds on a single planning session.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
	/// Maximum number of edges per candidate route.
	pub max_hops: usize,
	/// Maximum number of greedy increments before giving up.
	pub max_iterations: u32,
	/// Externally supplied deadline; expiry fails the session.
	pub deadline: Option<Instant>,
}

impl Default for SessionLimits {
	fn default() -> Self {
		Self {
			max_hops: 3,
			max_iterations: 64,
			deadline: None,
		}
	}
}

/// Observable phase of a planning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
	Enumerating,
	Evaluating,
	Committing,
	Continue,
	Done,
	Failed,
}

/// One market-sell planning session over a private graph snapshot.
///
/// The session owns no order data; it mutates the snapshot it was handed
/// through simulated fills only. Committing the result to a live graph is
/// the caller's business.
pub struct SellSession<'g> {
	graph: &'g mut LiquidityGraph,
	source: Asset,
	target: Asset,
	sell_amount: u128,
	limits: SessionLimits,
	amount_sold: u128,
	amount_bought: u128,
	fills: FillLedger,
	iterations: u32,
	phase: SessionPhase,
	routes: Vec<Route>,
	chosen: Option<RouteQuote>,
	failure: Option<PlanError>,
}

impl<'g> SellSession<'g> {
	pub fn new(
		graph: &'g mut LiquidityGraph,
		source: Asset,
		target: Asset,
		sell_amount: u128,
		limits: SessionLimits,
	) -> Self {
		let phase = if sell_amount == 0 {
			SessionPhase::Done
		} else {
			SessionPhase::Enumerating
		};
		Self {
			graph,
			source,
			target,
			sell_amount,
			limits,
			amount_sold: 0,
			amount_bought: 0,
			fills: FillLedger::new(),
			iterations: 0,
			phase,
			routes: Vec::new(),
			chosen: None,
			failure: None,
		}
	}

	pub fn phase(&self) -> SessionPhase {
		self.phase
	}

	pub fn iterations(&self) -> u32 {
		self.iterations
	}

	/// Advances the session by one phase transition.
	pub fn step(&mut self) {
		match self.phase {
			SessionPhase::Enumerating => self.enumerate(),
			SessionPhase::Evaluating => self.evaluate(),
			SessionPhase::Committing => self.commit(),
			SessionPhase::Continue => self.phase = SessionPhase::Enumerating,
			SessionPhase::Done | SessionPhase::Failed => {}
		}
	}

	/// Drives the session to completion.
	pub fn run(mut self) -> Result<SellPlan, PlanError> {
		loop {
			match self.phase {
				SessionPhase::Done => {
					return Ok(SellPlan {
						fills: self.fills,
						amount_sold: self.amount_sold,
						amount_bought: self.amount_bought,
					})
				}
				SessionPhase::Failed => {
					return Err(self.failure.take().expect("failed session has an error"))
				}
				_ => self.step(),
			}
		}
	}

	fn fail(&mut self, error: PlanError) {
		self.failure = Some(error);
		self.phase = SessionPhase::Failed;
	}

	fn enumerate(&mut self) {
		if let Some(deadline) = self.limits.deadline {
			if Instant::now() >= deadline {
				self.fail(PlanError::Timeout);
				return;
			}
		}
		if self.iterations >= self.limits.max_iterations {
			debug!(
				iterations = self.iterations,
				sold = self.amount_sold,
				requested = self.sell_amount,
				"iteration bound reached before request was satisfied"
			);
			self.fail(PlanError::InsufficientLiquidity);
			return;
		}
		self.iterations += 1;

		self.routes =
			enumerate_routes(self.graph, &self.source, &self.target, self.limits.max_hops);
		self.phase = SessionPhase::Evaluating;
	}

	fn evaluate(&mut self) {
		let available = self.sell_amount - self.amount_sold;
		let mut best: Option<(Route, RouteQuote)> = None;

		for route in std::mem::take(&mut self.routes) {
			let quote = match evaluate_route(self.graph, &route, available) {
				Ok(quote) => quote,
				Err(e) => {
					trace!(error = %e, "route excluded");
					continue;
				}
			};
			let better = match &best {
				None => true,
				Some((best_route, best_quote)) => {
					// Highest output; ties to fewest hops, then lexical
					// route order.
					quote.output > best_quote.output
						|| (quote.output == best_quote.output
							&& (route.hop_count() < best_route.hop_count()
								|| (route.hop_count() == best_route.hop_count()
									&& route < *best_route)))
				}
			};
			if better {
				best = Some((route, quote));
			}
		}

		match best {
			Some((_, quote)) => {
				self.chosen = Some(quote);
				self.phase = SessionPhase::Committing;
			}
			None => self.fail(PlanError::InsufficientLiquidity),
		}
	}

	fn commit(&mut self) {
		let quote = self.chosen.take().expect("committing without a quote");

		self.amount_sold += quote.first_hop_fill();
		self.amount_bought += quote.output;
		for (hash, fill) in quote.fills {
			self.graph
				.simulate_fill(&hash, fill)
				.expect("fill was evaluated against this snapshot");
			self.fills.merge(hash, fill);
		}

		self.phase = if self.amount_sold >= self.sell_amount {
			SessionPhase::Done
		} else {
			SessionPhase::Continue
		};
	}
}
