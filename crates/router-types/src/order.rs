//! Order model: standing, partially-fillable exchange commitments.
//!
//! An [`Order`] describes the original size of a commitment and never
//! changes once created. The mutable side lives in [`OrderState`], keyed
//! by the order hash, which tracks status and cumulative fill progress.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::Asset;

/// Errors raised when constructing order values.
#[derive(Debug, Error)]
pub enum OrderError {
	/// Order amounts must be strictly positive.
	#[error("order amount must be positive: {0}")]
	ZeroAmount(&'static str),
	/// Source and target asset must differ.
	#[error("order source and target asset are identical: {0}")]
	SelfTrade(Asset),
}

/// Unique identifier of an order, as supplied by the order feed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHash(String);

impl OrderHash {
	pub fn new(digest: impl Into<String>) -> Self {
		Self(digest.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for OrderHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for OrderHash {
	fn from(digest: &str) -> Self {
		Self::new(digest)
	}
}

/// A standing commitment to exchange `source_amount` of `source_asset`
/// for `target_amount` of `target_asset` at a constant rate.
///
/// Amounts describe the original order size, not the remaining size;
/// fill progress is tracked separately in [`OrderState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Asset given up by whoever fills the order.
	pub source_asset: Asset,
	/// Asset received in return.
	pub target_asset: Asset,
	/// Total quantity of `source_asset` the order accepts.
	pub source_amount: u128,
	/// Total quantity of `target_asset` the order pays out.
	pub target_amount: u128,
}

impl Order {
	/// Builds an order, rejecting zero amounts and self-trades.
	pub fn new(
		source_asset: impl Into<Asset>,
		target_asset: impl Into<Asset>,
		source_amount: u128,
		target_amount: u128,
	) -> Result<Self, OrderError> {
		let source_asset = source_asset.into();
		let target_asset = target_asset.into();
		if source_amount == 0 {
			return Err(OrderError::ZeroAmount("source_amount"));
		}
		if target_amount == 0 {
			return Err(OrderError::ZeroAmount("target_amount"));
		}
		if source_asset == target_asset {
			return Err(OrderError::SelfTrade(source_asset));
		}
		Ok(Self {
			source_asset,
			target_asset,
			source_amount,
			target_amount,
		})
	}

	/// Keccak-256 digest over the order contents, hex encoded.
	///
	/// Feeds normally supply the canonical hash; this exists for sources
	/// that deliver bare orders.
	pub fn compute_hash(&self) -> OrderHash {
		let mut hasher = Keccak256::new();
		hasher.update(self.source_asset.as_str().as_bytes());
		hasher.update([0u8]);
		hasher.update(self.target_asset.as_str().as_bytes());
		hasher.update([0u8]);
		hasher.update(self.source_amount.to_be_bytes());
		hasher.update(self.target_amount.to_be_bytes());
		OrderHash::new(format!("0x{}", hex::encode(hasher.finalize())))
	}

	/// Converts `amount` of the source asset through this order's rate,
	/// rounding down. `None` on multiplication overflow.
	pub fn convert(&self, amount: u128) -> Option<u128> {
		amount
			.checked_mul(self.target_amount)
			.map(|product| product / self.source_amount)
	}

	/// Compares this order's exchange rate (`target_amount /
	/// source_amount`) against another's, exactly.
	pub fn cmp_rate(&self, other: &Order) -> Ordering {
		cmp_ratio(
			self.target_amount,
			self.source_amount,
			other.target_amount,
			other.source_amount,
		)
	}
}

/// Compares `an/ad` against `bn/bd` without overflow or rounding.
///
/// Continued-fraction descent: equal integer parts reduce the problem to
/// the reciprocals of the remainders, whose denominators strictly shrink.
fn cmp_ratio(an: u128, ad: u128, bn: u128, bd: u128) -> Ordering {
	debug_assert!(ad > 0 && bd > 0);
	let (aq, ar) = (an / ad, an % ad);
	let (bq, br) = (bn / bd, bn % bd);
	if aq != bq {
		return aq.cmp(&bq);
	}
	match (ar, br) {
		(0, 0) => Ordering::Equal,
		(0, _) => Ordering::Less,
		(_, 0) => Ordering::Greater,
		_ => cmp_ratio(bd, br, ad, ar),
	}
}

/// Lifecycle status of an order as reported by the feed.
///
/// Only `Fillable` orders participate in routing; every other value is
/// terminal from the router's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
	Invalid,
	Fillable,
	Expired,
	FullyFilled,
	Cancelled,
}

impl OrderStatus {
	pub fn is_fillable(&self) -> bool {
		matches!(self, OrderStatus::Fillable)
	}
}

/// Mutable per-order state, keyed by the order hash.
///
/// Invariant maintained by the graph: `filled_amount` never exceeds the
/// order's `source_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
	pub hash: OrderHash,
	pub status: OrderStatus,
	/// Cumulative amount of the order's `source_amount` consumed so far.
	pub filled_amount: u128,
}

impl OrderState {
	pub fn new(hash: impl Into<OrderHash>, status: OrderStatus, filled_amount: u128) -> Self {
		Self {
			hash: hash.into(),
			status,
			filled_amount,
		}
	}

	/// A fresh, untouched fillable state.
	pub fn fillable(hash: impl Into<OrderHash>) -> Self {
		Self::new(hash, OrderStatus::Fillable, 0)
	}
}

/// One entry of the ingestion contract: an order paired with its state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
	pub order: Order,
	pub state: OrderState,
}

impl OrderUpdate {
	pub fn new(order: Order, state: OrderState) -> Self {
		Self { order, state }
	}
}
