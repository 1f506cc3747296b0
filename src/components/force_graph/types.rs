use std::collections::HashSet;

/// Screen-from-graph transform: `screen = graph * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A press that may still turn into a click on `node`.
#[derive(Clone, Debug, Default)]
pub struct PressState {
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub prev_node: Option<String>,
	pub prev_neighbors: HashSet<String>,
	pub highlight_t: f64,
	pub delay_t: f64,
}
