//! Drives [`SearchHistory`] against a [`SearchRepository`].
//!
//! Each helper mutates the history, releases the borrow, awaits the remote
//! and then settles the result, so other tasks may touch the history while a
//! call is in flight. `on_change` sees the history right after the optimistic
//! change and again once it has settled.

use std::cell::RefCell;

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::error::GraphError;

use super::entry::{SaveState, SearchEntry};
use super::repository::{PersistOutcome, SearchRepository};
use super::store::SearchHistory;

/// Loads the recent and saved views from the remote into `history`.
pub async fn load(
	history: &RefCell<SearchHistory>,
	repo: &dyn SearchRepository,
	dataset: &str,
	recent_limit: usize,
) -> Result<(), GraphError> {
	let (recent, saved) = futures::try_join!(
		repo.list_recent(dataset, Some(recent_limit)),
		repo.list_saved(dataset)
	)?;
	info!("loaded {} recent and {} saved searches for {dataset}", recent.len(), saved.len());
	history.borrow_mut().hydrate(recent, saved);
	Ok(())
}

/// Appends `entry` optimistically, removing it again if the remote rejects it.
pub async fn record_search(
	history: &RefCell<SearchHistory>,
	repo: &dyn SearchRepository,
	dataset: &str,
	entry: SearchEntry,
	on_change: &dyn Fn(&SearchHistory),
) -> Result<(), GraphError> {
	let id = entry.id;
	history.borrow_mut().append(entry.clone())?;
	on_change(&history.borrow());

	let outcome = repo
		.create(dataset, &entry)
		.await
		.unwrap_or_else(|e| PersistOutcome::failed(e.notice()));
	if outcome.success {
		return Ok(());
	}
	warn!("search {id} was not recorded, removing it from history");
	history.borrow_mut().discard(id);
	on_change(&history.borrow());
	Err(GraphError::persistence(outcome.reason))
}

/// Flips the saved flag of `id` optimistically and settles it with the remote.
pub async fn toggle_saved(
	history: &RefCell<SearchHistory>,
	repo: &dyn SearchRepository,
	id: Uuid,
	on_change: &dyn Fn(&SearchHistory),
) -> Result<SaveState, GraphError> {
	let ticket = history.borrow_mut().begin_toggle(id, Utc::now())?;
	on_change(&history.borrow());
	let outcome = repo
		.set_saved(id, ticket.target.is_saved())
		.await
		.unwrap_or_else(|e| PersistOutcome::failed(e.notice()));
	let settled = history.borrow_mut().complete_toggle(&ticket, outcome);
	on_change(&history.borrow());
	settled
}

#[cfg(test)]
mod tests {
	use async_trait::async_trait;
	use futures::executor::block_on;

	use super::*;
	use crate::history::MemorySearchRepository;
	use crate::query::SearchParams;

	/// Accepts reads, rejects every write.
	struct ReadOnlyRepository {
		inner: MemorySearchRepository,
		reason: Option<String>,
	}

	#[async_trait(?Send)]
	impl SearchRepository for ReadOnlyRepository {
		async fn create(&self, _: &str, _: &SearchEntry) -> Result<PersistOutcome, GraphError> {
			Ok(PersistOutcome::failed(self.reason.clone()))
		}

		async fn list_recent(&self, dataset: &str, limit: Option<usize>) -> Result<Vec<SearchEntry>, GraphError> {
			self.inner.list_recent(dataset, limit).await
		}

		async fn list_saved(&self, dataset: &str) -> Result<Vec<SearchEntry>, GraphError> {
			self.inner.list_saved(dataset).await
		}

		async fn set_saved(&self, _: Uuid, _: bool) -> Result<PersistOutcome, GraphError> {
			Err(GraphError::Source("connection reset".into()))
		}
	}

	fn entry(search: &str) -> SearchEntry {
		SearchEntry::new(&SearchParams::new(search, 10), Utc::now())
	}

	#[test]
	fn test_record_and_toggle_round_trip() {
		let repo = MemorySearchRepository::new();
		let history = RefCell::new(SearchHistory::new());
		let e = entry("alice");

		block_on(record_search(&history, &repo, "enron", e.clone(), &|_| {})).unwrap();
		assert_eq!(repo.len(), 1);

		let state = block_on(toggle_saved(&history, &repo, e.id, &|_| {})).unwrap();
		assert!(state.is_saved());
		assert!(repo.get(e.id).unwrap().saved);
		assert_eq!(history.borrow().saved().len(), 1);

		let state = block_on(toggle_saved(&history, &repo, e.id, &|_| {})).unwrap();
		assert_eq!(state, SaveState::Unsaved);
		assert!(!repo.get(e.id).unwrap().saved);
	}

	#[test]
	fn test_rejected_append_is_removed() {
		let repo = ReadOnlyRepository {
			inner: MemorySearchRepository::new(),
			reason: None,
		};
		let history = RefCell::new(SearchHistory::new());
		let err = block_on(record_search(&history, &repo, "enron", entry("alice"), &|_| {})).unwrap_err();
		assert!(matches!(err, GraphError::PersistenceFailure { .. }));
		assert!(history.borrow().is_empty());
	}

	#[test]
	fn test_toggle_transport_error_rolls_back() {
		let inner = MemorySearchRepository::new();
		let e = entry("alice");
		block_on(inner.create("enron", &e)).unwrap();
		let repo = ReadOnlyRepository {
			inner,
			reason: Some("read only".into()),
		};
		let history = RefCell::new(SearchHistory::new());
		block_on(load(&history, &repo, "enron", 10)).unwrap();
		assert_eq!(history.borrow().len(), 1);

		let err = block_on(toggle_saved(&history, &repo, e.id, &|_| {})).unwrap_err();
		assert_eq!(
			err,
			GraphError::PersistenceFailure {
				reason: "Remote call failed: connection reset".into()
			}
		);
		assert!(!history.borrow().get(e.id).unwrap().saved);
		assert!(history.borrow().saved().is_empty());
	}

	#[test]
	fn test_changes_visible_before_remote_settles() {
		let repo = ReadOnlyRepository {
			inner: MemorySearchRepository::new(),
			reason: None,
		};
		let history = RefCell::new(SearchHistory::new());
		let seen = RefCell::new(Vec::new());
		let e = entry("alice");

		let _ = block_on(record_search(&history, &repo, "enron", e.clone(), &|h| {
			seen.borrow_mut().push(h.len())
		}));
		assert_eq!(*seen.borrow(), vec![1, 0]);

		history.borrow_mut().hydrate(vec![e.clone()], Vec::new());
		seen.borrow_mut().clear();
		let _ = block_on(toggle_saved(&history, &repo, e.id, &|h| {
			seen.borrow_mut().push(h.saved().len())
		}));
		assert_eq!(*seen.borrow(), vec![1, 0]);
	}

	#[test]
	fn test_toggle_unknown_entry() {
		let repo = MemorySearchRepository::new();
		let history = RefCell::new(SearchHistory::new());
		let id = Uuid::new_v4();
		assert_eq!(
			block_on(toggle_saved(&history, &repo, id, &|_| {})),
			Err(GraphError::EntryNotFound(id))
		);
	}
}
