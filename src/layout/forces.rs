//! Velocity-based forces in the style of d3-force.
//!
//! Forces read positions and only ever adjust velocities; the simulation
//! integrates afterwards and re-pins fixed bodies.

/// One simulated node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	/// Horizontal position.
	pub x: f64,
	/// Vertical position.
	pub y: f64,
	/// Velocity along x.
	pub vx: f64,
	/// Velocity along y.
	pub vy: f64,
	/// Pinned bodies never move.
	pub fixed: bool,
}

impl Body {
	/// A free body at rest.
	pub fn at(x: f64, y: f64) -> Self {
		Self {
			x,
			y,
			..Self::default()
		}
	}

	/// A body that never moves.
	pub fn pinned(x: f64, y: f64) -> Self {
		Self {
			x,
			y,
			fixed: true,
			..Self::default()
		}
	}
}

/// Deterministic LCG used to break ties between coincident bodies.
#[derive(Clone, Debug)]
pub struct Jiggle(u32);

impl Jiggle {
	/// Same seed, same sequence.
	pub fn new(seed: u32) -> Self {
		Self(seed)
	}

	fn next_unit(&mut self) -> f64 {
		self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		self.0 as f64 / 4_294_967_296.0
	}

	/// A tiny non-zero offset.
	pub fn offset(&mut self) -> f64 {
		let v = (self.next_unit() - 0.5) * 1e-6;
		if v == 0.0 { 1e-7 } else { v }
	}
}

/// Adjusts body velocities for one tick.
pub trait Force {
	/// Scaled by `alpha` unless noted otherwise.
	fn apply(&mut self, bodies: &mut [Body], alpha: f64, jiggle: &mut Jiggle);
}

/// Spring along each link toward `distance`, split between the endpoints by degree.
#[derive(Clone, Debug)]
pub struct LinkForce {
	links: Vec<(usize, usize)>,
	bias: Vec<f64>,
	distance: f64,
	strength: f64,
}

impl LinkForce {
	/// `strength` of `None` uses `-1 / links.len()`.
	pub fn new(links: Vec<(usize, usize)>, body_count: usize, distance: f64, strength: Option<f64>) -> Self {
		let mut degree = vec![0usize; body_count];
		for &(s, t) in &links {
			degree[s] += 1;
			degree[t] += 1;
		}
		let bias = links
			.iter()
			.map(|&(s, t)| degree[s] as f64 / (degree[s] + degree[t]) as f64)
			.collect();
		let strength = strength.unwrap_or_else(|| {
			if links.is_empty() {
				0.0
			} else {
				-1.0 / links.len() as f64
			}
		});
		Self {
			links,
			bias,
			distance,
			strength,
		}
	}

	/// Explicit strength, or `-1 / link count`.
	pub fn strength(&self) -> f64 {
		self.strength
	}
}

impl Force for LinkForce {
	fn apply(&mut self, bodies: &mut [Body], alpha: f64, jiggle: &mut Jiggle) {
		for (&(s, t), &b) in self.links.iter().zip(&self.bias) {
			let (src, tgt) = (bodies[s], bodies[t]);
			let mut x = tgt.x + tgt.vx - src.x - src.vx;
			let mut y = tgt.y + tgt.vy - src.y - src.vy;
			if x == 0.0 {
				x = jiggle.offset();
			}
			if y == 0.0 {
				y = jiggle.offset();
			}
			let len = (x * x + y * y).sqrt();
			let l = (len - self.distance) / len * alpha * self.strength;
			x *= l;
			y *= l;
			bodies[t].vx -= x * b;
			bodies[t].vy -= y * b;
			bodies[s].vx += x * (1.0 - b);
			bodies[s].vy += y * (1.0 - b);
		}
	}
}

/// Pairwise charge; negative strength repels.
#[derive(Clone, Debug)]
pub struct ManyBodyForce {
	strength: f64,
	distance_min2: f64,
}

impl ManyBodyForce {
	/// Negative strength repels.
	pub fn new(strength: f64) -> Self {
		Self {
			strength,
			distance_min2: 1.0,
		}
	}
}

impl Force for ManyBodyForce {
	fn apply(&mut self, bodies: &mut [Body], alpha: f64, jiggle: &mut Jiggle) {
		let positions: Vec<(f64, f64)> = bodies.iter().map(|b| (b.x, b.y)).collect();
		for (i, body) in bodies.iter_mut().enumerate() {
			for (j, &(ox, oy)) in positions.iter().enumerate() {
				if i == j {
					continue;
				}
				let mut x = ox - positions[i].0;
				let mut y = oy - positions[i].1;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = jiggle.offset();
					l += x * x;
				}
				if y == 0.0 {
					y = jiggle.offset();
					l += y * y;
				}
				if l < self.distance_min2 {
					l = (self.distance_min2 * l).sqrt();
				}
				let w = self.strength * alpha / l;
				body.vx += x * w;
				body.vy += y * w;
			}
		}
	}
}

/// Pulls free bodies toward a ring of `radius` around `(cx, cy)`.
#[derive(Clone, Debug)]
pub struct RadialForce {
	radius: f64,
	strength: f64,
	cx: f64,
	cy: f64,
}

impl RadialForce {
	/// Ring of `radius` around the origin.
	pub fn new(radius: f64, strength: f64) -> Self {
		Self {
			radius,
			strength,
			cx: 0.0,
			cy: 0.0,
		}
	}

	/// `(n / sqrt(n)) * scale`, i.e. `sqrt(n) * scale`.
	pub fn halo_radius(node_count: usize, scale: f64) -> f64 {
		if node_count == 0 {
			return 0.0;
		}
		let n = node_count as f64;
		n / n.sqrt() * scale
	}

	/// Ring radius.
	pub fn radius(&self) -> f64 {
		self.radius
	}
}

impl Force for RadialForce {
	fn apply(&mut self, bodies: &mut [Body], alpha: f64, _jiggle: &mut Jiggle) {
		for body in bodies.iter_mut().filter(|b| !b.fixed) {
			let dx = if body.x == self.cx { 1e-6 } else { body.x - self.cx };
			let dy = if body.y == self.cy { 1e-6 } else { body.y - self.cy };
			let r = (dx * dx + dy * dy).sqrt();
			let k = (self.radius - r) * self.strength * alpha / r;
			body.vx += dx * k;
			body.vy += dy * k;
		}
	}
}

/// Keeps circles of `radius` from overlapping. Not scaled by alpha.
#[derive(Clone, Debug)]
pub struct CollideForce {
	radius: f64,
	strength: f64,
}

impl CollideForce {
	/// Circles of `radius`; `strength` in `[0, 1]`.
	pub fn new(radius: f64, strength: f64) -> Self {
		Self { radius, strength }
	}
}

impl Force for CollideForce {
	fn apply(&mut self, bodies: &mut [Body], _alpha: f64, jiggle: &mut Jiggle) {
		let r = self.radius * 2.0;
		for i in 0..bodies.len() {
			let (xi, yi) = (bodies[i].x + bodies[i].vx, bodies[i].y + bodies[i].vy);
			for j in (i + 1)..bodies.len() {
				let mut x = xi - (bodies[j].x + bodies[j].vx);
				let mut y = yi - (bodies[j].y + bodies[j].vy);
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = jiggle.offset();
					l += x * x;
				}
				if y == 0.0 {
					y = jiggle.offset();
					l += y * y;
				}
				let len = l.sqrt();
				let push = (r - len) / len * self.strength;
				x *= push;
				y *= push;
				// a fixed body absorbs nothing, its partner takes the whole push
				let k = match (bodies[i].fixed, bodies[j].fixed) {
					(true, false) => 0.0,
					(false, true) => 1.0,
					_ => 0.5,
				};
				bodies[i].vx += x * k;
				bodies[i].vy += y * k;
				bodies[j].vx -= x * (1.0 - k);
				bodies[j].vy -= y * (1.0 - k);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dist(a: &Body, b: &Body) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn test_charge_repels() {
		let mut bodies = [Body::at(-10.0, 0.0), Body::at(10.0, 0.0)];
		ManyBodyForce::new(-200.0).apply(&mut bodies, 1.0, &mut Jiggle::new(1));
		assert!(bodies[0].vx < 0.0);
		assert!(bodies[1].vx > 0.0);
		assert!((bodies[0].vx + bodies[1].vx).abs() < 1e-9);
	}

	#[test]
	fn test_charge_separates_coincident_bodies() {
		let mut bodies = [Body::at(0.0, 0.0), Body::at(0.0, 0.0)];
		ManyBodyForce::new(-200.0).apply(&mut bodies, 1.0, &mut Jiggle::new(1));
		assert!(bodies.iter().all(|b| b.vx.is_finite() && b.vy.is_finite()));
		assert!(bodies[0].vx != 0.0 || bodies[0].vy != 0.0);
	}

	#[test]
	fn test_positive_link_attracts() {
		let mut bodies = [Body::at(0.0, 0.0), Body::at(100.0, 0.0)];
		let mut link = LinkForce::new(vec![(0, 1)], 2, 30.0, Some(1.0));
		link.apply(&mut bodies, 1.0, &mut Jiggle::new(1));
		assert!(bodies[0].vx > 0.0);
		assert!(bodies[1].vx < 0.0);
	}

	#[test]
	fn test_default_link_strength_scales_with_edge_count() {
		let link = LinkForce::new(vec![(0, 1), (0, 2), (0, 3), (0, 4)], 5, 30.0, None);
		assert_eq!(link.strength(), -0.25);
		assert_eq!(LinkForce::new(vec![], 1, 30.0, None).strength(), 0.0);
	}

	#[test]
	fn test_radial_pulls_toward_ring() {
		let mut bodies = [Body::pinned(0.0, 0.0), Body::at(10.0, 0.0), Body::at(500.0, 0.0)];
		RadialForce::new(300.0, 1.0).apply(&mut bodies, 1.0, &mut Jiggle::new(1));
		assert_eq!((bodies[0].vx, bodies[0].vy), (0.0, 0.0));
		assert!(bodies[1].vx > 0.0);
		assert!(bodies[2].vx < 0.0);
	}

	#[test]
	fn test_halo_radius() {
		assert_eq!(RadialForce::halo_radius(0, 100.0), 0.0);
		assert!((RadialForce::halo_radius(4, 100.0) - 200.0).abs() < 1e-9);
		assert!((RadialForce::halo_radius(9, 100.0) - 300.0).abs() < 1e-9);
	}

	#[test]
	fn test_collide_pushes_overlapping_apart() {
		let mut bodies = [Body::at(0.0, 0.0), Body::at(50.0, 0.0)];
		let before = dist(&bodies[0], &bodies[1]);
		CollideForce::new(100.0, 1.0).apply(&mut bodies, 1.0, &mut Jiggle::new(1));
		for b in bodies.iter_mut() {
			b.x += b.vx;
			b.y += b.vy;
		}
		let after = dist(&bodies[0], &bodies[1]);
		assert!(after > before);
		assert!((after - 200.0).abs() < 1e-9);
	}

	#[test]
	fn test_collide_fixed_body_does_not_move() {
		let mut bodies = [Body::pinned(0.0, 0.0), Body::at(50.0, 0.0)];
		CollideForce::new(100.0, 1.0).apply(&mut bodies, 1.0, &mut Jiggle::new(1));
		assert_eq!(bodies[0].vx, 0.0);
		assert!((bodies[1].vx - 150.0).abs() < 1e-9);
	}

	#[test]
	fn test_collide_ignores_separated() {
		let mut bodies = [Body::at(0.0, 0.0), Body::at(500.0, 0.0)];
		CollideForce::new(100.0, 1.0).apply(&mut bodies, 1.0, &mut Jiggle::new(1));
		assert_eq!(bodies[0].vx, 0.0);
		assert_eq!(bodies[1].vx, 0.0);
	}
}
