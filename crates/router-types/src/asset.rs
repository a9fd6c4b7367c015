//! Asset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a tradable token.
///
/// The router never interprets the contents; feeds typically supply a hex
/// asset-data descriptor or a ticker symbol. `Ord` is derived so adjacency
/// structures keyed by `Asset` iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
	pub fn new(descriptor: impl Into<String>) -> Self {
		Self(descriptor.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Asset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for Asset {
	fn from(descriptor: &str) -> Self {
		Self::new(descriptor)
	}
}

impl From<String> for Asset {
	fn from(descriptor: String) -> Self {
		Self(descriptor)
	}
}
