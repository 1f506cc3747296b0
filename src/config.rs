//! Tunables for the palette, the layout simulation, history and query defaults.
//!
//! Every section falls back to its defaults, so an override only needs the
//! keys it changes:
//!
//! ```json
//! { "layout": { "budget_ms": 2500 }, "history": { "recent_limit": 20 } }
//! ```

use serde::Deserialize;

use crate::colour::TriColourScale;
use crate::error::GraphError;

/// Everything the explorer can be tuned with, read from JSON.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Edge colours.
	pub palette: PaletteConfig,
	/// Force parameters.
	pub layout: LayoutConfig,
	/// History view.
	pub history: HistoryConfig,
	/// Search defaults.
	pub query: QueryConfig,
}

impl AppConfig {
	/// Parses a (possibly partial) JSON override and validates it.
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		let config: Self =
			serde_json::from_str(json).map_err(|e| GraphError::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects unparsable colours, out-of-range layout values and a zero default limit.
	pub fn validate(&self) -> Result<(), GraphError> {
		self.palette.scale()?;
		self.layout.validate()?;
		if self.query.default_limit == 0 {
			return Err(GraphError::Config("query.default_limit must be at least 1".into()));
		}
		Ok(())
	}
}

/// Sentiment palette, stored as hex strings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
	/// Colour of sentiment 0.
	pub low: String,
	/// Colour at `cutoff`.
	pub mid: String,
	/// Colour of sentiment 1.
	pub high: String,
	/// Position of `mid`, strictly between 0 and 1.
	pub cutoff: f64,
}

impl PaletteConfig {
	/// Parses the three colours into a scale.
	pub fn scale(&self) -> Result<TriColourScale, GraphError> {
		TriColourScale::new(&self.low, &self.mid, &self.high, self.cutoff)
	}
}

impl Default for PaletteConfig {
	fn default() -> Self {
		Self {
			low: TriColourScale::DEFAULT_LOW.into(),
			mid: TriColourScale::DEFAULT_MID.into(),
			high: TriColourScale::DEFAULT_HIGH.into(),
			cutoff: TriColourScale::DEFAULT_CUTOFF,
		}
	}
}

/// Force parameters and the run budget of the layout simulation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Target separation of linked nodes.
	pub link_distance: f64,
	/// Link strength; `None` means `-1 / edge_count`.
	pub link_strength: Option<f64>,
	/// Ring radius is `(n / sqrt(n)) * radial_scale`.
	pub radial_scale: f64,
	/// Pull toward the ring.
	pub radial_strength: f64,
	/// Collision radius of one node.
	pub collide_radius: f64,
	/// Multiplier on `collide_radius`.
	pub collide_padding: f64,
	/// How hard overlaps are resolved.
	pub collide_strength: f64,
	/// Wall-clock budget of one run in milliseconds.
	pub budget_ms: f64,
	/// Alpha below which a run stops.
	pub alpha_min: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
}

impl LayoutConfig {
	/// Cooling rate that takes alpha from 1 to `alpha_min` in about 300 ticks.
	pub fn alpha_decay(&self) -> f64 {
		1.0 - self.alpha_min.powf(1.0 / 300.0)
	}

	/// Checks the run budget, cooling and collision parameters.
	pub fn validate(&self) -> Result<(), GraphError> {
		if !(self.budget_ms > 0.0) {
			return Err(GraphError::Config("layout.budget_ms must be positive".into()));
		}
		if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
			return Err(GraphError::Config("layout.alpha_min must lie in (0, 1)".into()));
		}
		if !(0.0..=1.0).contains(&self.velocity_decay) {
			return Err(GraphError::Config("layout.velocity_decay must lie in [0, 1]".into()));
		}
		if self.collide_radius < 0.0 || self.collide_padding <= 0.0 {
			return Err(GraphError::Config("layout collision radius and padding must be positive".into()));
		}
		Ok(())
	}
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			charge_strength: -200.0,
			link_distance: 30.0,
			link_strength: None,
			radial_scale: 100.0,
			radial_strength: 1.0,
			collide_radius: 100.0,
			collide_padding: 1.2,
			collide_strength: 1.0,
			budget_ms: 4000.0,
			alpha_min: 0.001,
			velocity_decay: 0.4,
		}
	}
}

/// Settings of the search history.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
	/// Cap of the "latest searches" view.
	pub recent_limit: usize,
}

impl Default for HistoryConfig {
	fn default() -> Self {
		Self { recent_limit: 10 }
	}
}

/// Search defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
	/// Team size used when the form leaves it blank.
	pub default_limit: u32,
}

impl Default for QueryConfig {
	fn default() -> Self {
		Self { default_limit: 10 }
	}
}
