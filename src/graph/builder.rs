use std::collections::HashSet;

use super::reducer::Reduced;
use super::types::{ANCHOR_ID, EgoGraph, GraphEdge, GraphNode, PeerActivation, Position};

/// Turns a [`Reduced`] result into anchor/peer nodes and anchor-to-peer edges.
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
	activation: Option<PeerActivation>,
}

impl GraphBuilder {
	/// A builder whose peers re-run the search with their label when activated.
	pub fn new(activate_peer: impl Fn(&str) + 'static) -> Self {
		Self {
			activation: Some(PeerActivation::new(activate_peer)),
		}
	}

	/// Builder with a caller-supplied activation.
	pub fn with_activation(activation: PeerActivation) -> Self {
		Self {
			activation: Some(activation),
		}
	}

	/// One node per distinct receiver of the anchor, all at the origin until laid out.
	pub fn build(&self, reduced: &Reduced) -> EgoGraph {
		let mut nodes = vec![GraphNode {
			id: ANCHOR_ID.to_string(),
			label: reduced.anchor.clone(),
			position: Position::ORIGIN,
			fixed: true,
			activatable: false,
		}];
		let mut edges = Vec::with_capacity(reduced.ranked.len());
		let mut seen: HashSet<&str> = HashSet::new();

		for tuple in &reduced.ranked {
			if tuple.sender != reduced.anchor || !seen.insert(tuple.receiver.as_str()) {
				continue;
			}
			let id = (nodes.len() + 1).to_string();
			edges.push(GraphEdge {
				id: format!("e{ANCHOR_ID}-{id}"),
				source: ANCHOR_ID.to_string(),
				target: id.clone(),
				sentiment: tuple.link.sentiment,
				emails_sent: tuple.link.emails_sent,
			});
			nodes.push(GraphNode {
				id,
				label: tuple.receiver.clone(),
				position: Position::ORIGIN,
				fixed: false,
				activatable: self.activation.is_some(),
			});
		}

		EgoGraph::new(nodes, edges, self.activation.clone())
	}
}
