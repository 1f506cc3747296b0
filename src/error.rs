//! Error taxonomy shared by the graph core, the history store and the session.

use thiserror::Error;
use uuid::Uuid;

/// Fallback notice when a persistence call fails without a reason.
pub const GENERIC_PERSISTENCE_FAILURE: &str = "Could not update saved search";

/// Errors surfaced by the explorer core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
	/// The relationship query returned zero tuples.
	#[error("No users found with that email")]
	NoResults,

	/// A save/unsave or history-append call reported failure.
	#[error("{reason}")]
	PersistenceFailure { reason: String },

	/// A palette constant could not be parsed as `#rrggbb`.
	#[error("Malformed colour: {0}")]
	MalformedColour(String),

	/// A response arrived for a request that has since been superseded.
	#[error("Stale response discarded")]
	StaleResponse,

	/// A search or dataset name failed validation.
	#[error("Invalid query: {0}")]
	InvalidQuery(String),

	/// No history entry has this id.
	#[error("Search entry not found: {0}")]
	EntryNotFound(Uuid),

	/// A history entry with this id already exists.
	#[error("Search entry already recorded: {0}")]
	DuplicateEntry(Uuid),

	/// A remote collaborator (relationship source or history store) failed.
	#[error("Remote call failed: {0}")]
	Source(String),

	/// The JSON configuration is malformed or out of range.
	#[error("Configuration error: {0}")]
	Config(String),
}

impl GraphError {
	/// Builds a persistence failure from an optional remote reason.
	pub fn persistence(reason: Option<String>) -> Self {
		Self::PersistenceFailure {
			reason: reason
				.filter(|r| !r.trim().is_empty())
				.unwrap_or_else(|| GENERIC_PERSISTENCE_FAILURE.to_string()),
		}
	}

	/// Text to show the user, or `None` when the error is silent.
	pub fn notice(&self) -> Option<String> {
		match self {
			Self::StaleResponse => None,
			other => Some(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_persistence_reason_passthrough() {
		let err = GraphError::persistence(Some("Query with that ID does not exist".into()));
		assert_eq!(err.notice().as_deref(), Some("Query with that ID does not exist"));
	}

	#[test]
	fn test_persistence_generic_reason() {
		assert_eq!(
			GraphError::persistence(None).to_string(),
			GENERIC_PERSISTENCE_FAILURE
		);
		assert_eq!(
			GraphError::persistence(Some("  ".into())).to_string(),
			GENERIC_PERSISTENCE_FAILURE
		);
	}

	#[test]
	fn test_stale_is_silent() {
		assert_eq!(GraphError::StaleResponse.notice(), None);
		assert!(GraphError::NoResults.notice().is_some());
	}
}
