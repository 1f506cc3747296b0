//! Query parameters and the relationship-source boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::RelationshipTuple;

/// Shortest accepted email search.
pub const MIN_EMAIL_SEARCH_LEN: usize = 4;

/// What the user searched for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
	/// Substring of the subject's email address.
	pub email_search: String,
	/// Suffix filter on peers' addresses; empty means no filter.
	pub emails_end_with: String,
	/// Maximum number of peers shown ("team size").
	pub limit: u32,
}

impl SearchParams {
	/// Search with no domain filter.
	pub fn new(email_search: impl Into<String>, limit: u32) -> Self {
		Self {
			email_search: email_search.into(),
			emails_end_with: String::new(),
			limit,
		}
	}

	/// Restricts peers to addresses ending with `suffix`.
	pub fn ending_with(mut self, suffix: impl Into<String>) -> Self {
		self.emails_end_with = suffix.into();
		self
	}

	/// Same filters, centred on another subject.
	pub fn recentred(&self, email_search: &str) -> Self {
		Self {
			email_search: email_search.to_string(),
			..self.clone()
		}
	}

	/// Checks the search length and team size.
	pub fn validate(&self) -> Result<(), GraphError> {
		if self.email_search.trim().chars().count() < MIN_EMAIL_SEARCH_LEN {
			return Err(GraphError::InvalidQuery(format!(
				"email search must be at least {MIN_EMAIL_SEARCH_LEN} characters"
			)));
		}
		if self.limit < 1 {
			return Err(GraphError::InvalidQuery("team size must be at least 1".into()));
		}
		Ok(())
	}
}

/// Dataset names are path segments: non-empty, no `/`.
pub fn validate_dataset(name: &str) -> Result<(), GraphError> {
	if name.is_empty() {
		return Err(GraphError::InvalidQuery("dataset name must not be empty".into()));
	}
	Ok(())
}

/// Rounds sentiment to two decimals, as the source reports it.
pub fn round_sentiment(sentiment: f64) -> f64 {
	(sentiment * 100.0).round() / 100.0
}

/// External service answering relationship queries.
#[async_trait(?Send)]
pub trait RelationshipSource {
	/// Names of the datasets that can be queried.
	async fn datasets(&self) -> Result<Vec<String>, GraphError>;

	/// Tuples whose sender contains `email` and whose receiver ends with `ends_with`.
	async fn relationships(
		&self,
		dataset: &str,
		email: &str,
		ends_with: &str,
	) -> Result<Vec<RelationshipTuple>, GraphError>;
}

/// In-memory relationship source.
#[derive(Clone, Debug, Default)]
pub struct StaticRelationships {
	datasets: BTreeMap<String, Vec<RelationshipTuple>>,
}

impl StaticRelationships {
	/// No datasets.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a dataset.
	pub fn with_dataset(mut self, name: impl Into<String>, tuples: Vec<RelationshipTuple>) -> Self {
		self.datasets.insert(name.into(), tuples);
		self
	}

	/// A deterministic mailbox sample: `people` addresses spread across a few
	/// domains, each writing to a handful of colleagues.
	pub fn sample(name: impl Into<String>, people: usize) -> Self {
		Self::new().with_sample(name, people)
	}

	/// [`sample`](Self::sample) for one more dataset.
	pub fn with_sample(self, name: impl Into<String>, people: usize) -> Self {
		self.with_dataset(name, sample_tuples(people))
	}
}

#[async_trait(?Send)]
impl RelationshipSource for StaticRelationships {
	async fn datasets(&self) -> Result<Vec<String>, GraphError> {
		Ok(self.datasets.keys().cloned().collect())
	}

	async fn relationships(
		&self,
		dataset: &str,
		email: &str,
		ends_with: &str,
	) -> Result<Vec<RelationshipTuple>, GraphError> {
		let tuples = self
			.datasets
			.get(dataset)
			.ok_or_else(|| GraphError::Source(format!("unknown dataset {dataset}")))?;
		Ok(tuples
			.iter()
			.filter(|t| t.sender.contains(email) && t.receiver.ends_with(ends_with))
			.map(|t| {
				let mut t = t.clone();
				t.link.sentiment = round_sentiment(t.link.sentiment);
				t
			})
			.collect())
	}
}

const SAMPLE_NAMES: &[&str] = &[
	"alice", "bruno", "chen", "dara", "emeka", "fatima", "goran", "hana", "ivan", "jules",
	"kofi", "lena", "mateo", "nora", "omar", "priya",
];
const SAMPLE_DOMAINS: &[&str] = &["enron.com", "ects.enron.com", "example.org"];

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn sample_address(i: usize) -> String {
	let name = SAMPLE_NAMES[i % SAMPLE_NAMES.len()];
	let domain = SAMPLE_DOMAINS[i % SAMPLE_DOMAINS.len()];
	match i / SAMPLE_NAMES.len() {
		0 => format!("{name}@{domain}"),
		n => format!("{name}.{n}@{domain}"),
	}
}

fn sample_tuples(people: usize) -> Vec<RelationshipTuple> {
	let mut tuples = Vec::new();
	if people < 2 {
		return tuples;
	}
	for i in 0..people {
		let fan_out = 3 + (rand_simple(i) * 6.0) as usize;
		for k in 1..=fan_out.min(people - 1) {
			let seed = i * 31 + k;
			let j = (i + k * 7 + (rand_simple(seed) * people as f64) as usize) % people;
			if j == i {
				continue;
			}
			tuples.push(RelationshipTuple::new(
				sample_address(i),
				rand_simple(seed + 1),
				1 + (rand_simple(seed + 2) * 400.0) as u32,
				sample_address(j),
			));
		}
	}
	tuples
}
