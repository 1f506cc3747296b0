//! Persistence boundary for search history.

use std::cell::RefCell;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GraphError;

use super::entry::SearchEntry;

/// Answer of a mutating persistence call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistOutcome {
	/// Whether the store applied the change.
	pub success: bool,
	/// Why the call failed, when the store says.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

impl PersistOutcome {
	/// A successful outcome.
	pub fn ok() -> Self {
		Self {
			success: true,
			reason: None,
		}
	}

	/// A refused outcome, with the reason if given.
	pub fn failed(reason: Option<String>) -> Self {
		Self {
			success: false,
			reason,
		}
	}
}

/// Store of one user's searches, partitioned by dataset.
#[async_trait(?Send)]
pub trait SearchRepository {
	/// Records a new entry under `dataset`.
	async fn create(&self, dataset: &str, entry: &SearchEntry) -> Result<PersistOutcome, GraphError>;

	/// Newest first, optionally capped.
	async fn list_recent(&self, dataset: &str, limit: Option<usize>) -> Result<Vec<SearchEntry>, GraphError>;

	/// Saved entries, most recently saved first.
	async fn list_saved(&self, dataset: &str) -> Result<Vec<SearchEntry>, GraphError>;

	/// Stores the saved flag of an existing entry.
	async fn set_saved(&self, id: Uuid, saved: bool) -> Result<PersistOutcome, GraphError>;
}

/// In-memory [`SearchRepository`].
#[derive(Debug, Default)]
pub struct MemorySearchRepository {
	rows: RefCell<Vec<(String, SearchEntry)>>,
}

impl MemorySearchRepository {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored entries across all datasets.
	pub fn len(&self) -> usize {
		self.rows.borrow().len()
	}

	/// Whether nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.rows.borrow().is_empty()
	}

	/// Entry by id, in any dataset.
	pub fn get(&self, id: Uuid) -> Option<SearchEntry> {
		self.rows
			.borrow()
			.iter()
			.find(|(_, e)| e.id == id)
			.map(|(_, e)| e.clone())
	}

	fn in_dataset(&self, dataset: &str) -> Vec<SearchEntry> {
		self.rows
			.borrow()
			.iter()
			.rev()
			.filter(|(d, _)| d == dataset)
			.map(|(_, e)| e.clone())
			.collect()
	}
}

#[async_trait(?Send)]
impl SearchRepository for MemorySearchRepository {
	async fn create(&self, dataset: &str, entry: &SearchEntry) -> Result<PersistOutcome, GraphError> {
		let mut rows = self.rows.borrow_mut();
		if rows.iter().any(|(_, e)| e.id == entry.id) {
			return Ok(PersistOutcome::failed(Some("Query already exists".into())));
		}
		rows.push((dataset.to_string(), entry.clone()));
		Ok(PersistOutcome::ok())
	}

	async fn list_recent(&self, dataset: &str, limit: Option<usize>) -> Result<Vec<SearchEntry>, GraphError> {
		let mut entries = self.in_dataset(dataset);
		entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		if let Some(limit) = limit {
			entries.truncate(limit);
		}
		Ok(entries)
	}

	async fn list_saved(&self, dataset: &str) -> Result<Vec<SearchEntry>, GraphError> {
		let mut entries: Vec<_> = self.in_dataset(dataset).into_iter().filter(|e| e.saved).collect();
		entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
		Ok(entries)
	}

	async fn set_saved(&self, id: Uuid, saved: bool) -> Result<PersistOutcome, GraphError> {
		let mut rows = self.rows.borrow_mut();
		let Some((_, entry)) = rows.iter_mut().find(|(_, e)| e.id == id) else {
			return Ok(PersistOutcome::failed(Some(
				"Query with that ID does not exist".into(),
			)));
		};
		entry.saved = saved;
		entry.saved_at = saved.then(Utc::now);
		Ok(PersistOutcome::ok())
	}
}

#[cfg(test)]
mod tests {
	use chrono::DateTime;
	use futures::executor::block_on;

	use super::*;
	use crate::query::SearchParams;

	fn entry(search: &str, created: i64) -> SearchEntry {
		SearchEntry::new(
			&SearchParams::new(search, 10),
			DateTime::from_timestamp(created, 0).unwrap(),
		)
	}

	#[test]
	fn test_partitioned_by_dataset() {
		let repo = MemorySearchRepository::new();
		block_on(repo.create("enron", &entry("alice", 1))).unwrap();
		block_on(repo.create("other", &entry("bruno", 2))).unwrap();
		block_on(repo.create("enron", &entry("chen", 3))).unwrap();

		let recent = block_on(repo.list_recent("enron", None)).unwrap();
		let names: Vec<_> = recent.iter().map(|e| e.email_search.as_str()).collect();
		assert_eq!(names, vec!["chen", "alice"]);
		assert_eq!(block_on(repo.list_recent("enron", Some(1))).unwrap().len(), 1);
	}

	#[test]
	fn test_set_saved() {
		let repo = MemorySearchRepository::new();
		let e = entry("alice", 1);
		block_on(repo.create("enron", &e)).unwrap();

		assert_eq!(block_on(repo.set_saved(e.id, true)).unwrap(), PersistOutcome::ok());
		let saved = block_on(repo.list_saved("enron")).unwrap();
		assert_eq!(saved.len(), 1);
		assert!(saved[0].saved_at.is_some());

		block_on(repo.set_saved(e.id, false)).unwrap();
		assert!(block_on(repo.list_saved("enron")).unwrap().is_empty());
	}

	#[test]
	fn test_set_saved_unknown_id() {
		let repo = MemorySearchRepository::new();
		let outcome = block_on(repo.set_saved(Uuid::new_v4(), true)).unwrap();
		assert!(!outcome.success);
		assert_eq!(outcome.reason.as_deref(), Some("Query with that ID does not exist"));
	}

	#[test]
	fn test_create_duplicate_fails() {
		let repo = MemorySearchRepository::new();
		let e = entry("alice", 1);
		assert!(block_on(repo.create("enron", &e)).unwrap().success);
		assert!(!block_on(repo.create("enron", &e)).unwrap().success);
		assert_eq!(repo.len(), 1);
	}
}
