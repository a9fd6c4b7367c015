//! Order ingestion: feeding the liquidity graph from external sources.
//!
//! Remote order-book providers live behind the [`OrderSource`] trait; the
//! [`IngestService`] pulls complete `(order, state)` batches from every
//! registered source and upserts them through the graph's batch-update
//! protocol. There is no durable state anywhere: a restart simply
//! resynchronizes from the sources.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use router_graph::SharedGraph;
use router_types::{EventBus, IngestEvent, OrderUpdate, RouterEvent};

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

pub use implementations::memory::MemorySource;

/// Errors a source can surface while assembling a batch.
#[derive(Debug, Error)]
pub enum SourceError {
	/// The upstream provider could not be reached.
	#[error("source unavailable: {0}")]
	Unavailable(String),
	/// The upstream payload could not be interpreted.
	#[error("malformed feed payload: {0}")]
	Malformed(String),
}

/// One external order-book provider.
///
/// Implementations deliver full `(order, state)` pairs; everything beyond
/// the graph's own invariants is validated upstream, not here.
#[async_trait]
pub trait OrderSource: Send + Sync {
	/// Stable name used in logs and events.
	fn name(&self) -> &str;

	/// Fetches the source's current batch of order updates.
	async fn fetch(&self) -> Result<Vec<OrderUpdate>, SourceError>;
}

/// Summary of one full synchronization pass across all sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
	pub sources_ok: usize,
	pub sources_failed: usize,
	pub inserted: usize,
	pub updated: usize,
	pub removed: usize,
	pub rejected: usize,
}

/// Service that drives periodic resynchronization of the graph.
pub struct IngestService {
	sources: Vec<Box<dyn OrderSource>>,
	graph: SharedGraph,
	events: EventBus,
}

impl IngestService {
	pub fn new(graph: SharedGraph, events: EventBus, sources: Vec<Box<dyn OrderSource>>) -> Self {
		Self {
			sources,
			graph,
			events,
		}
	}

	pub fn source_count(&self) -> usize {
		self.sources.len()
	}

	/// Fetches every source once and applies each batch to the graph.
	///
	/// A failing source is logged and skipped; per-entry rejections are
	/// handled inside the graph's batch update. One bad source never
	/// poisons the synchronization pass.
	pub async fn sync_once(&self) -> SyncSummary {
		let mut summary = SyncSummary::default();

		for source in &self.sources {
			let updates = match source.fetch().await {
				Ok(updates) => updates,
				Err(e) => {
					warn!(source = source.name(), error = %e, "source fetch failed");
					summary.sources_failed += 1;
					self.events
						.publish(RouterEvent::Ingest(IngestEvent::SourceFailed {
							source: source.name().to_string(),
							reason: e.to_string(),
						}))
						.ok();
					continue;
				}
			};

			let outcome = self.graph.batch_update(updates).await;
			info!(
				source = source.name(),
				inserted = outcome.inserted,
				updated = outcome.updated,
				removed = outcome.removed,
				rejected = outcome.rejected,
				"source synchronized"
			);
			summary.sources_ok += 1;
			summary.inserted += outcome.inserted;
			summary.updated += outcome.updated;
			summary.removed += outcome.removed;
			summary.rejected += outcome.rejected;

			self.events
				.publish(RouterEvent::Ingest(IngestEvent::SyncCompleted {
					source: source.name().to_string(),
					inserted: outcome.inserted,
					updated: outcome.updated,
					removed: outcome.removed,
					rejected: outcome.rejected,
				}))
				.ok();
		}

		summary
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use router_types::{Order, OrderState};

	struct BrokenSource;

	#[async_trait]
	impl OrderSource for BrokenSource {
		fn name(&self) -> &str {
			"broken"
		}

		async fn fetch(&self) -> Result<Vec<OrderUpdate>, SourceError> {
			Err(SourceError::Unavailable("connection refused".into()))
		}
	}

	fn update(hash: &str, source: &str, target: &str) -> OrderUpdate {
		OrderUpdate::new(
			Order::new(source, target, 100, 200).unwrap(),
			OrderState::fillable(hash),
		)
	}

	#[tokio::test]
	async fn test_sync_applies_source_batches() {
		let graph = SharedGraph::default();
		let source = MemorySource::new("memory");
		source
			.set_updates(vec![
				update("0xa1", "TKA", "TKB"),
				update("0xa2", "TKB", "TKC"),
			])
			.await;

		let service = IngestService::new(graph.clone(), EventBus::new(16), vec![Box::new(source)]);
		let summary = service.sync_once().await;

		assert_eq!(summary.sources_ok, 1);
		assert_eq!(summary.inserted, 2);
		assert_eq!(graph.read().await.order_count(), 2);
	}

	#[tokio::test]
	async fn test_failing_source_does_not_poison_sync() {
		let graph = SharedGraph::default();
		let healthy = MemorySource::new("healthy");
		healthy.set_updates(vec![update("0xa1", "TKA", "TKB")]).await;

		let service = IngestService::new(
			graph.clone(),
			EventBus::new(16),
			vec![Box::new(BrokenSource), Box::new(healthy)],
		);
		let summary = service.sync_once().await;

		assert_eq!(summary.sources_failed, 1);
		assert_eq!(summary.sources_ok, 1);
		assert_eq!(graph.read().await.order_count(), 1);
	}

	#[tokio::test]
	async fn test_sync_publishes_events() {
		let graph = SharedGraph::default();
		let events = EventBus::new(16);
		let mut receiver = events.subscribe();

		let source = MemorySource::new("memory");
		source.set_updates(vec![update("0xa1", "TKA", "TKB")]).await;
		let service = IngestService::new(graph, events, vec![Box::new(source)]);
		service.sync_once().await;

		match receiver.recv().await.unwrap() {
			RouterEvent::Ingest(IngestEvent::SyncCompleted {
				source, inserted, ..
			}) => {
				assert_eq!(source, "memory");
				assert_eq!(inserted, 1);
			}
			other => panic!("unexpected event: {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_resync_is_idempotent() {
		let graph = SharedGraph::default();
		let source = MemorySource::new("memory");
		source.set_updates(vec![update("0xa1", "TKA", "TKB")]).await;
		let service = IngestService::new(graph.clone(), EventBus::new(16), vec![Box::new(source)]);

		let first = service.sync_once().await;
		let second = service.sync_once().await;

		assert_eq!(first.inserted, 1);
		assert_eq!(second.inserted, 0);
		assert_eq!(second.updated, 1);
		assert_eq!(graph.read().await.order_count(), 1);
	}
}
