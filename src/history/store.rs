use chrono::{DateTime, Utc};
use log::{debug, warn};
use uuid::Uuid;

use crate::error::GraphError;

use super::entry::{SaveState, SearchEntry};
use super::repository::PersistOutcome;

/// Proof of an optimistic toggle, handed back on completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleTicket {
	/// Entry being toggled.
	pub id: Uuid,
	/// State the remote is asked to store.
	pub target: SaveState,
	version: u64,
}

#[derive(Clone, Debug)]
struct Tracked {
	entry: SearchEntry,
	/// Bumped on every optimistic toggle.
	version: u64,
	/// Last state the remote acknowledged, and the toggle that produced it.
	confirmed: SaveState,
	confirmed_version: u64,
	in_flight: u32,
}

impl Tracked {
	fn confirmed(entry: SearchEntry) -> Self {
		Self {
			confirmed: entry.state(),
			entry,
			version: 0,
			confirmed_version: 0,
			in_flight: 0,
		}
	}
}

/// Past searches of one user on one dataset.
///
/// "Recent" and "saved" are views over the same entries. Toggles apply
/// locally first and are confirmed or rolled back by [`complete_toggle`].
///
/// [`complete_toggle`]: SearchHistory::complete_toggle
#[derive(Clone, Debug, Default)]
pub struct SearchHistory {
	entries: Vec<Tracked>,
}

impl SearchHistory {
	/// Empty history.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of entries in the recent list.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether nothing is tracked.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Entry by id.
	pub fn get(&self, id: Uuid) -> Option<&SearchEntry> {
		self.tracked(id).map(|t| &t.entry)
	}

	fn tracked(&self, id: Uuid) -> Option<&Tracked> {
		self.entries.iter().find(|t| t.entry.id == id)
	}

	fn tracked_mut(&mut self, id: Uuid) -> Result<&mut Tracked, GraphError> {
		self.entries
			.iter_mut()
			.find(|t| t.entry.id == id)
			.ok_or(GraphError::EntryNotFound(id))
	}

	/// Upserts entries listed by the remote store. Entries with a toggle in
	/// flight keep their local state.
	pub fn hydrate(&mut self, recent: Vec<SearchEntry>, saved: Vec<SearchEntry>) {
		for entry in recent.into_iter().chain(saved) {
			match self.entries.iter_mut().find(|t| t.entry.id == entry.id) {
				Some(t) if t.in_flight > 0 => {}
				Some(t) => *t = Tracked::confirmed(entry),
				None => self.entries.push(Tracked::confirmed(entry)),
			}
		}
	}

	/// Records a newly submitted search as the most recent entry.
	pub fn append(&mut self, entry: SearchEntry) -> Result<(), GraphError> {
		if self.tracked(entry.id).is_some() {
			return Err(GraphError::DuplicateEntry(entry.id));
		}
		self.entries.push(Tracked::confirmed(entry));
		Ok(())
	}

	/// Drops an entry whose creation the remote rejected.
	pub fn discard(&mut self, id: Uuid) -> bool {
		let before = self.entries.len();
		self.entries.retain(|t| t.entry.id != id);
		before != self.entries.len()
	}

	/// Flips the entry's saved state immediately.
	///
	/// A second toggle before the first completes flips the already-flipped
	/// state.
	pub fn begin_toggle(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<ToggleTicket, GraphError> {
		let tracked = self.tracked_mut(id)?;
		let target = tracked.entry.state().toggled(now);
		tracked.entry.set_state(target);
		tracked.version += 1;
		tracked.in_flight += 1;
		debug!("toggle v{} of {id} -> saved={}", tracked.version, target.is_saved());
		Ok(ToggleTicket {
			id,
			target,
			version: tracked.version,
		})
	}

	/// Settles a toggle with the remote's answer.
	///
	/// A failed toggle restores the last confirmed state if it is still the
	/// newest toggle; otherwise the newer toggle decides. Once nothing is in
	/// flight the entry always mirrors the confirmed state.
	pub fn complete_toggle(
		&mut self,
		ticket: &ToggleTicket,
		outcome: PersistOutcome,
	) -> Result<SaveState, GraphError> {
		let tracked = self.tracked_mut(ticket.id)?;
		tracked.in_flight = tracked.in_flight.saturating_sub(1);

		let result = if outcome.success {
			if ticket.version > tracked.confirmed_version {
				tracked.confirmed = ticket.target;
				tracked.confirmed_version = ticket.version;
			}
			Ok(())
		} else {
			if ticket.version == tracked.version {
				warn!("rolling back toggle v{} of {}", ticket.version, ticket.id);
				tracked.entry.set_state(tracked.confirmed);
			}
			Err(GraphError::persistence(outcome.reason))
		};

		if tracked.in_flight == 0 {
			tracked.entry.set_state(tracked.confirmed);
		}
		result.map(|()| tracked.entry.state())
	}

	/// Entries newest first, optionally capped.
	pub fn recent(&self, limit: Option<usize>) -> Vec<&SearchEntry> {
		let mut entries: Vec<&SearchEntry> = self.entries.iter().rev().map(|t| &t.entry).collect();
		entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		if let Some(limit) = limit {
			entries.truncate(limit);
		}
		entries
	}

	/// Saved entries, most recently saved first.
	pub fn saved(&self) -> Vec<&SearchEntry> {
		let mut entries: Vec<&SearchEntry> = self
			.entries
			.iter()
			.rev()
			.map(|t| &t.entry)
			.filter(|e| e.saved)
			.collect();
		entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
		entries
	}
}
