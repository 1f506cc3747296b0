use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::layout::{LayoutFrame, LayoutGeneration};

/// Id of the fixed anchor node in every ego-network.
pub const ANCHOR_ID: &str = "1";

/// Sentiment and volume carried by one directed communication pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentLink {
	/// Score in `[0, 1]`.
	pub sentiment: f64,
	/// Number of emails behind the score.
	pub emails_sent: u32,
}

/// `(sender, link, receiver)` as produced by the relationship source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipTuple {
	/// Address on one side of the link.
	pub sender: String,
	/// Sentiment between the two.
	pub link: SentimentLink,
	/// Address on the other side.
	pub receiver: String,
}

impl RelationshipTuple {
	/// A tuple from its parts.
	pub fn new(sender: impl Into<String>, sentiment: f64, emails_sent: u32, receiver: impl Into<String>) -> Self {
		Self {
			sender: sender.into(),
			link: SentimentLink {
				sentiment,
				emails_sent,
			},
			receiver: receiver.into(),
		}
	}
}

/// A point in layout space; the anchor sits at the origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// Horizontal offset.
	pub x: f64,
	/// Vertical offset.
	pub y: f64,
}

impl Position {
	/// The anchor position.
	pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };
}

/// A node of the ego graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Simulation-local id (`"1"` for the anchor, then `"2"`, `"3"`, ...).
	pub id: String,
	/// Email address shown next to the node.
	pub label: String,
	/// Last layout position.
	pub position: Position,
	/// Only the anchor is fixed.
	pub fixed: bool,
	/// Whether activating this node re-centres the search on its label.
	pub activatable: bool,
}

/// An undirected sentiment link between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
	/// Unique per edge within one graph.
	pub id: String,
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Score in `[0, 1]`.
	pub sentiment: f64,
	/// Number of emails behind the score.
	pub emails_sent: u32,
}

impl GraphEdge {
	/// Stroke width grows with the log of the email volume, never below 1.
	pub fn stroke_width(&self) -> f64 {
		if self.emails_sent == 0 {
			return 1.0;
		}
		(self.emails_sent as f64 / 2.0).log2().max(1.0)
	}
}

/// Capability invoked with a peer's label when that peer is activated.
#[derive(Clone)]
pub struct PeerActivation(Rc<dyn Fn(&str)>);

impl PeerActivation {
	/// Wraps a handler.
	pub fn new(f: impl Fn(&str) + 'static) -> Self {
		Self(Rc::new(f))
	}

	/// Runs the handler for `label`.
	pub fn call(&self, label: &str) {
		(self.0)(label)
	}
}

impl fmt::Debug for PeerActivation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("PeerActivation")
	}
}

/// A positioned one-hop graph: one fixed anchor plus its peers.
#[derive(Clone, Debug, Serialize)]
pub struct EgoGraph {
	/// Anchor first.
	pub nodes: Vec<GraphNode>,
	/// One per kept tuple.
	pub edges: Vec<GraphEdge>,
	#[serde(skip)]
	generation: Option<LayoutGeneration>,
	#[serde(skip)]
	activation: Option<PeerActivation>,
}

impl EgoGraph {
	pub(crate) fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>, activation: Option<PeerActivation>) -> Self {
		Self {
			nodes,
			edges,
			generation: None,
			activation,
		}
	}

	/// The fixed node.
	pub fn anchor(&self) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.fixed)
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Peer count, anchor excluded.
	pub fn peer_count(&self) -> usize {
		self.nodes.iter().filter(|n| !n.fixed).count()
	}

	/// Layout run whose frames this graph currently accepts.
	pub fn generation(&self) -> Option<LayoutGeneration> {
		self.generation
	}

	pub(crate) fn bind_generation(&mut self, generation: LayoutGeneration) {
		self.generation = Some(generation);
	}

	/// Stops accepting frames from any layout run.
	pub(crate) fn release_generation(&mut self) {
		self.generation = None;
	}

	/// Applies a layout frame. Frames from any other layout run are ignored.
	pub fn apply_frame(&mut self, frame: &LayoutFrame) -> bool {
		if self.generation != Some(frame.generation) {
			log::debug!(
				"ignoring layout frame from {:?}, graph bound to {:?}",
				frame.generation,
				self.generation
			);
			return false;
		}
		for (id, pos) in &frame.positions {
			if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) {
				if !node.fixed {
					node.position = *pos;
				}
			}
		}
		true
	}

	/// Activates the node with `id`. Returns `false` for the anchor, unknown
	/// ids, or graphs built without an activation capability.
	pub fn activate(&self, id: &str) -> bool {
		let (Some(node), Some(activation)) = (self.node(id), self.activation.as_ref()) else {
			return false;
		};
		if !node.activatable {
			return false;
		}
		activation.call(&node.label);
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn edge(emails_sent: u32) -> GraphEdge {
		GraphEdge {
			id: "e1-2".into(),
			source: ANCHOR_ID.into(),
			target: "2".into(),
			sentiment: 0.5,
			emails_sent,
		}
	}

	#[test]
	fn test_stroke_width() {
		assert_eq!(edge(0).stroke_width(), 1.0);
		assert_eq!(edge(1).stroke_width(), 1.0);
		assert_eq!(edge(4).stroke_width(), 1.0);
		assert!((edge(32).stroke_width() - 4.0).abs() < 1e-9);
	}

	#[test]
	fn test_node_serialises_without_callback() {
		let node = GraphNode {
			id: "2".into(),
			label: "b@example.com".into(),
			position: Position::ORIGIN,
			fixed: false,
			activatable: true,
		};
		let json = serde_json::to_value(&node).unwrap();
		assert_eq!(json["label"], "b@example.com");
		assert_eq!(json["activatable"], true);

		let edge_json = serde_json::to_value(edge(3)).unwrap();
		assert_eq!(edge_json["emailsSent"], 3);
	}
}
