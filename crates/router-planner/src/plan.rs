//! Plan output types: the insertion-ordered fill ledger and the sell plan.

use rust_decimal::prelude::*;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use router_types::OrderHash;

use crate::PlanError;

/// Insertion-ordered mapping from order hash to accumulated fill amount.
///
/// Downstream execution replays fills in the order they were incurred, so
/// the ledger keeps a parallel key list next to the lookup map rather than
/// using a plain unordered map. Merging an existing key keeps its original
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillLedger {
	keys: Vec<OrderHash>,
	amounts: HashMap<OrderHash, u128>,
}

impl FillLedger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `amount` to the hash's accumulated fill, registering the hash
	/// at the end of the ledger on first sight.
	pub fn merge(&mut self, hash: OrderHash, amount: u128) {
		match self.amounts.get_mut(&hash) {
			Some(total) => *total = total.saturating_add(amount),
			None => {
				self.keys.push(hash.clone());
				self.amounts.insert(hash, amount);
			}
		}
	}

	pub fn amount(&self, hash: &OrderHash) -> Option<u128> {
		self.amounts.get(hash).copied()
	}

	/// Fills in the order they were incurred.
	pub fn iter(&self) -> impl Iterator<Item = (&OrderHash, u128)> {
		self.keys.iter().map(|hash| (hash, self.amounts[hash]))
	}

	pub fn to_vec(&self) -> Vec<(OrderHash, u128)> {
		self.iter().map(|(hash, amount)| (hash.clone(), amount)).collect()
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}
}

impl Serialize for FillLedger {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut seq = serializer.serialize_seq(Some(self.keys.len()))?;
		for (hash, amount) in self.iter() {
			seq.serialize_element(&(hash, amount))?;
		}
		seq.end()
	}
}

/// A computed execution plan for a market sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellPlan {
	/// Order fills in the order they were incurred.
	pub fills: FillLedger,
	/// Total source-asset amount the plan consumes.
	pub amount_sold: u128,
	/// Total target-asset amount the plan obtains.
	pub amount_bought: u128,
}

impl SellPlan {
	/// Achieved average price, `amount_sold / amount_bought`.
	///
	/// `None` when nothing was bought or the amounts exceed decimal range.
	pub fn average_price(&self) -> Option<Decimal> {
		if self.amount_bought == 0 {
			return None;
		}
		let sold = Decimal::from_u128(self.amount_sold)?;
		let bought = Decimal::from_u128(self.amount_bought)?;
		sold.checked_div(bought)
	}

	/// Enforces a caller-supplied maximum acceptable average price.
	///
	/// Computed post-planning by the execution layer; an unrepresentable
	/// price (nothing bought) counts as exceeding any limit.
	pub fn check_price_limit(&self, limit: Decimal) -> Result<(), PlanError> {
		match self.average_price() {
			Some(price) if price <= limit => Ok(()),
			Some(price) => Err(PlanError::PriceToleranceExceeded { price, limit }),
			None => Err(PlanError::PriceToleranceExceeded {
				price: Decimal::MAX,
				limit,
			}),
		}
	}
}
