//! In-memory order source.

use async_trait::async_trait;
use tokio::sync::RwLock;

use router_types::OrderUpdate;

use crate::{OrderSource, SourceError};

/// Order source backed by an in-memory batch.
///
/// Used by tests and demo wiring; a real deployment registers sources
/// backed by remote order-book providers instead.
pub struct MemorySource {
	name: String,
	updates: RwLock<Vec<OrderUpdate>>,
}

impl MemorySource {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			updates: RwLock::new(Vec::new()),
		}
	}

	/// Replaces the batch the next fetch will deliver.
	pub async fn set_updates(&self, updates: Vec<OrderUpdate>) {
		*self.updates.write().await = updates;
	}

	/// Appends one update to the pending batch.
	pub async fn push(&self, update: OrderUpdate) {
		self.updates.write().await.push(update);
	}
}

#[async_trait]
impl OrderSource for MemorySource {
	fn name(&self) -> &str {
		&self.name
	}

	async fn fetch(&self) -> Result<Vec<OrderUpdate>, SourceError> {
		Ok(self.updates.read().await.clone())
	}
}
