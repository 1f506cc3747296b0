use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::SearchParams;

/// Saved flag of one history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveState {
	/// Not saved.
	Unsaved,
	/// `at` is when it was saved, if known.
	Saved { at: Option<DateTime<Utc>> },
}

impl SaveState {
	/// Whether this is `Saved`.
	pub fn is_saved(&self) -> bool {
		matches!(self, Self::Saved { .. })
	}

	/// The opposite state, stamped with `now` when saving.
	pub fn toggled(&self, now: DateTime<Utc>) -> Self {
		match self {
			Self::Unsaved => Self::Saved { at: Some(now) },
			Self::Saved { .. } => Self::Unsaved,
		}
	}
}

/// One submitted search, as persisted by the history store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
	/// Stable id, minted on creation.
	pub id: Uuid,
	/// Text searched for.
	pub email_search: String,
	/// Domain filter; empty when unused.
	pub emails_end_with: String,
	/// Team size.
	pub limit: u32,
	/// Kept in the saved list when set.
	pub saved: bool,
	/// When the search was submitted.
	pub created_at: DateTime<Utc>,
	/// Set while `saved`.
	pub saved_at: Option<DateTime<Utc>>,
}

impl SearchEntry {
	/// A fresh unsaved entry with a new id.
	pub fn new(params: &SearchParams, created_at: DateTime<Utc>) -> Self {
		Self {
			id: Uuid::new_v4(),
			email_search: params.email_search.clone(),
			emails_end_with: params.emails_end_with.clone(),
			limit: params.limit,
			saved: false,
			created_at,
			saved_at: None,
		}
	}

	/// Parameters to re-run this search.
	pub fn params(&self) -> SearchParams {
		SearchParams {
			email_search: self.email_search.clone(),
			emails_end_with: self.emails_end_with.clone(),
			limit: self.limit,
		}
	}

	/// The saved flag and timestamp as one value.
	pub fn state(&self) -> SaveState {
		if self.saved {
			SaveState::Saved { at: self.saved_at }
		} else {
			SaveState::Unsaved
		}
	}

	pub(crate) fn set_state(&mut self, state: SaveState) {
		match state {
			SaveState::Unsaved => {
				self.saved = false;
				self.saved_at = None;
			}
			SaveState::Saved { at } => {
				self.saved = true;
				self.saved_at = at;
			}
		}
	}
}
