use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::Asset;

/// Events broadcast across the router's services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RouterEvent {
	Ingest(IngestEvent),
	Plan(PlanEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestEvent {
	/// One source was synchronized into the graph.
	SyncCompleted {
		source: String,
		inserted: usize,
		updated: usize,
		removed: usize,
		rejected: usize,
	},
	/// A source failed to deliver its batch; the sync continued without it.
	SourceFailed { source: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlanEvent {
	Completed {
		source_asset: Asset,
		target_asset: Asset,
		amount_sold: u128,
		amount_bought: u128,
	},
	Failed {
		source_asset: Asset,
		target_asset: Asset,
		reason: String,
	},
}

/// Broadcast-based event bus connecting the router's services.
///
/// Each subscriber receives its own copy of every event published after
/// the subscription was created; publishing with no subscribers is not an
/// error worth surfacing, so callers typically ignore the result.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<RouterEvent>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` undelivered events per
	/// subscriber before old ones are dropped.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
		self.sender.subscribe()
	}

	pub fn publish(
		&self,
		event: RouterEvent,
	) -> Result<(), broadcast::error::SendError<RouterEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}
