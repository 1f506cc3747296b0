use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::graph::{EgoGraph, Position};

use super::forces::{Body, CollideForce, Force, Jiggle, LinkForce, ManyBodyForce, RadialForce};

const JIGGLE_SEED: u32 = 0x5eed;

/// One cooling run over a fixed node/edge set.
pub struct Simulation {
	ids: Vec<String>,
	bodies: Vec<Body>,
	forces: Vec<Box<dyn Force>>,
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	velocity_decay: f64,
	jiggle: Jiggle,
}

impl Simulation {
	/// Seeds one body per node; the anchor is pinned where it stands.
	pub fn new(graph: &EgoGraph, config: &LayoutConfig) -> Self {
		let ids: Vec<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
		let bodies: Vec<Body> = graph
			.nodes
			.iter()
			.map(|n| {
				if n.fixed {
					Body::pinned(n.position.x, n.position.y)
				} else {
					Body::at(n.position.x, n.position.y)
				}
			})
			.collect();

		let index: HashMap<&str, usize> =
			ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
		let links: Vec<(usize, usize)> = graph
			.edges
			.iter()
			.filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
			.collect();

		let radius = RadialForce::halo_radius(bodies.len(), config.radial_scale);
		let forces: Vec<Box<dyn Force>> = vec![
			Box::new(LinkForce::new(
				links,
				bodies.len(),
				config.link_distance,
				config.link_strength,
			)),
			Box::new(ManyBodyForce::new(config.charge_strength)),
			Box::new(RadialForce::new(radius, config.radial_strength)),
			Box::new(CollideForce::new(
				config.collide_radius * config.collide_padding,
				config.collide_strength,
			)),
		];

		Self {
			ids,
			bodies,
			forces,
			alpha: 1.0,
			alpha_min: config.alpha_min,
			alpha_decay: config.alpha_decay(),
			velocity_decay: config.velocity_decay,
			jiggle: Jiggle::new(JIGGLE_SEED),
		}
	}

	/// Current heat; starts at 1.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Cooled below `alpha_min`; further ticks change little.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.alpha_min
	}

	/// One step: forces, then integration, then cooling.
	pub fn tick(&mut self) {
		self.alpha += (0.0 - self.alpha) * self.alpha_decay;
		for force in self.forces.iter_mut() {
			force.apply(&mut self.bodies, self.alpha, &mut self.jiggle);
		}
		let keep = 1.0 - self.velocity_decay;
		for body in self.bodies.iter_mut() {
			if body.fixed {
				body.vx = 0.0;
				body.vy = 0.0;
			} else {
				body.vx *= keep;
				body.vy *= keep;
				body.x += body.vx;
				body.y += body.vy;
			}
		}
	}

	/// Current positions keyed by node id.
	pub fn positions(&self) -> Vec<(String, Position)> {
		self.ids
			.iter()
			.zip(&self.bodies)
			.map(|(id, b)| (id.clone(), Position { x: b.x, y: b.y }))
			.collect()
	}
}
