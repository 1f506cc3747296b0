//! Ranks and caps the raw relationship tuples of one query.

use crate::error::GraphError;

use super::types::{RelationshipTuple, SentimentLink};

/// Output of [`reduce`]: the anchor's label and its peers, best first.
#[derive(Clone, Debug, PartialEq)]
pub struct Reduced {
	/// Label of the node every kept tuple touches.
	pub anchor: String,
	/// Kept tuples, strongest first.
	pub ranked: Vec<RelationshipTuple>,
}

/// `0.2 * ln(emails_sent) + sentiment`.
///
/// Volume is log-damped so it cannot dominate sentiment. `emails_sent` must be
/// at least 1; a zero volume scores `-inf` and therefore ranks last.
pub fn score(link: &SentimentLink) -> f64 {
	if link.emails_sent == 0 {
		return f64::NEG_INFINITY;
	}
	0.2 * (link.emails_sent as f64).ln() + link.sentiment
}

/// Keeps the first sender's tuples, sorts them by descending [`score`] (stable)
/// and returns the top `limit`.
pub fn reduce(tuples: &[RelationshipTuple], limit: usize) -> Result<Reduced, GraphError> {
	let first = tuples.first().ok_or(GraphError::NoResults)?;
	let anchor = first.sender.clone();

	let mut ranked: Vec<(f64, &RelationshipTuple)> = tuples
		.iter()
		.filter(|t| t.sender == anchor)
		.map(|t| (score(&t.link), t))
		.collect();
	let discarded = tuples.len() - ranked.len();
	if discarded > 0 {
		log::debug!("discarded {discarded} tuples not sent by {anchor}");
	}

	// slice::sort_by is stable, so equal scores keep input order
	ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

	Ok(Reduced {
		anchor,
		ranked: ranked.into_iter().take(limit).map(|(_, t)| t.clone()).collect(),
	})
}
