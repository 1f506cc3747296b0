use std::collections::HashSet;

use crate::graph::{ANCHOR_ID, EgoGraph};

use super::types::{HoverState, PanState, PressState, ViewTransform};

pub const NODE_RADIUS: f64 = 60.0;
pub const HIT_RADIUS: f64 = NODE_RADIUS;
/// Screen pixels a press may travel and still count as a click.
pub const CLICK_SLOP: f64 = 4.0;

/// View-side state of the canvas: camera, pointer gestures and hover fade.
pub struct ForceGraphState {
	pub transform: ViewTransform,
	pub pan: PanState,
	pub press: PressState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	/// Keep the whole graph in view until the user pans or zooms.
	pub follow: bool,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			pan: PanState::default(),
			press: PressState::default(),
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
			follow: true,
		}
	}

	/// Forget gestures and hover from the previous graph and follow again.
	pub fn reset(&mut self) {
		self.pan = PanState::default();
		self.press = PressState::default();
		self.hover = HoverState::default();
		self.follow = true;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, graph: &EgoGraph, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		// last drawn wins, matching paint order
		graph
			.nodes
			.iter()
			.rev()
			.find(|node| {
				let (dx, dy) = (node.position.x - gx, node.position.y - gy);
				(dx * dx + dy * dy).sqrt() < HIT_RADIUS
			})
			.map(|node| node.id.clone())
	}

	/// Centre the anchor and zoom so every node fits.
	pub fn fit(&mut self, graph: &EgoGraph) {
		let extent = graph
			.nodes
			.iter()
			.map(|n| (n.position.x * n.position.x + n.position.y * n.position.y).sqrt())
			.fold(0.0, f64::max)
			+ NODE_RADIUS * 1.5;
		let k = (self.width.min(self.height) / 2.0 / extent).clamp(0.1, 1.0);
		self.transform = ViewTransform {
			x: self.width / 2.0,
			y: self.height / 2.0,
			k,
		};
	}

	pub fn set_hover(&mut self, graph: &EgoGraph, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node.clone();
		self.hover.neighbors = node
			.map(|id| neighbours(graph, &id))
			.unwrap_or_default();
		if !was_hovering {
			self.hover.delay_t = 0.0;
		}
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.is_hovered(id) || self.hover.neighbors.contains(id) || self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.prev_node.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Advance view animations by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

/// Ids adjacent to `id`. In an ego-network the anchor neighbours everyone.
fn neighbours(graph: &EgoGraph, id: &str) -> HashSet<String> {
	let mut out: HashSet<String> = graph
		.edges
		.iter()
		.filter_map(|e| {
			if e.source == id {
				Some(e.target.clone())
			} else if e.target == id {
				Some(e.source.clone())
			} else {
				None
			}
		})
		.collect();
	out.remove(id);
	if id != ANCHOR_ID {
		debug_assert!(out.len() <= 1);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphBuilder, Position, Reduced, RelationshipTuple};

	fn graph() -> EgoGraph {
		let mut g = GraphBuilder::default().build(&Reduced {
			anchor: "a".into(),
			ranked: vec![
				RelationshipTuple::new("a", 0.5, 3, "b"),
				RelationshipTuple::new("a", 0.5, 3, "c"),
			],
		});
		g.nodes[1].position = Position { x: 300.0, y: 0.0 };
		g.nodes[2].position = Position { x: -300.0, y: 0.0 };
		g
	}

	#[test]
	fn test_hit_testing() {
		let g = graph();
		let state = ForceGraphState::new(800.0, 600.0);
		assert_eq!(state.node_at_position(&g, 400.0, 300.0).as_deref(), Some("1"));
		assert_eq!(state.node_at_position(&g, 700.0, 310.0).as_deref(), Some("2"));
		assert_eq!(state.node_at_position(&g, 400.0, 100.0), None);
	}

	#[test]
	fn test_hover_neighbours() {
		let g = graph();
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.set_hover(&g, Some("2".into()));
		assert!(state.is_highlighted("1"));
		assert!(state.is_highlighted("2"));
		assert!(!state.is_highlighted("3"));

		state.set_hover(&g, Some("1".into()));
		assert!(state.is_highlighted("3"));

		state.set_hover(&g, None);
		assert!(state.has_active_highlight());
		assert!(state.is_hovered("1"));
	}

	#[test]
	fn test_fit_keeps_graph_on_screen() {
		let g = graph();
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.fit(&g);
		assert!(state.transform.k < 1.0);
		let (x, _) = state.screen_to_graph(800.0, 300.0);
		assert!(x > 300.0);
	}
}
