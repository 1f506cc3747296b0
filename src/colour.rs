//! Sentiment to colour mapping over a two-segment (low, mid, high) scale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// A 24-bit RGB colour. Displays as lowercase `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
}

impl Rgb {
	/// Colour from its channels.
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses `#rrggbb` or `rrggbb`, case-insensitive.
	pub fn from_hex(hex: &str) -> Result<Self, GraphError> {
		let digits = hex.strip_prefix('#').unwrap_or(hex);
		if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(GraphError::MalformedColour(hex.to_string()));
		}
		let channel = |i: usize| {
			u8::from_str_radix(&digits[i..i + 2], 16)
				.map_err(|_| GraphError::MalformedColour(hex.to_string()))
		};
		Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
	}

	/// Lowercase `#rrggbb`.
	pub fn to_hex(self) -> String {
		self.to_string()
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

fn blend_channel(a: u8, b: u8, t: f64) -> u8 {
	let v = a as f64 + (b as f64 - a as f64) * t;
	v.round().clamp(0.0, 255.0) as u8
}

/// Per-channel linear blend: `c1 + (c2 - c1) * t`, rounded and clamped.
pub fn interpolate(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
	Rgb::new(
		blend_channel(c1.r, c2.r, t),
		blend_channel(c1.g, c2.g, t),
		blend_channel(c1.b, c2.b, t),
	)
}

/// Tri-colour scale keyed by a cutoff.
///
/// Values in `[0, cutoff]` blend low to mid, values in `(cutoff, 1]` blend
/// mid to high. Both segments meet at the mid colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriColourScale {
	low: Rgb,
	mid: Rgb,
	high: Rgb,
	cutoff: f64,
}

impl TriColourScale {
	/// Red end of the scale.
	pub const DEFAULT_LOW: &'static str = "#fb2c36";
	/// Neutral midpoint.
	pub const DEFAULT_MID: &'static str = "#f0b100";
	/// Green end of the scale.
	pub const DEFAULT_HIGH: &'static str = "#05df72";
	/// Score at which the scale hits its midpoint colour.
	pub const DEFAULT_CUTOFF: f64 = 0.3;

	/// Validates the palette. Parsing happens once here so that [`map`](Self::map) is total.
	pub fn new(low: &str, mid: &str, high: &str, cutoff: f64) -> Result<Self, GraphError> {
		if !(cutoff > 0.0 && cutoff < 1.0) {
			return Err(GraphError::Config(format!(
				"colour cutoff must lie strictly between 0 and 1, got {cutoff}"
			)));
		}
		Ok(Self {
			low: Rgb::from_hex(low)?,
			mid: Rgb::from_hex(mid)?,
			high: Rgb::from_hex(high)?,
			cutoff,
		})
	}

	/// Score mapped to the midpoint colour.
	pub fn cutoff(&self) -> f64 {
		self.cutoff
	}

	/// Colour of a score. Scores are clamped to `[0, 1]`; NaN counts as 0.
	pub fn map(&self, sentiment: f64) -> Rgb {
		let v = if sentiment.is_nan() {
			0.0
		} else {
			sentiment.clamp(0.0, 1.0)
		};
		if v <= self.cutoff {
			interpolate(self.low, self.mid, v / self.cutoff)
		} else {
			interpolate(self.mid, self.high, (v - self.cutoff) / (1.0 - self.cutoff))
		}
	}

	/// [`map`](Self::map) rendered as `#rrggbb`.
	pub fn map_hex(&self, sentiment: f64) -> String {
		self.map(sentiment).to_hex()
	}
}

impl Default for TriColourScale {
	fn default() -> Self {
		Self {
			low: Rgb::new(0xfb, 0x2c, 0x36),
			mid: Rgb::new(0xf0, 0xb1, 0x00),
			high: Rgb::new(0x05, 0xdf, 0x72),
			cutoff: Self::DEFAULT_CUTOFF,
		}
	}
}
