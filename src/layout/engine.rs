use log::{debug, info};

use crate::config::LayoutConfig;
use crate::graph::{EgoGraph, Position};

use super::simulation::Simulation;

/// Identifies one layout run. Strictly increasing per engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutGeneration(u64);

/// Positions of every node after one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutFrame {
	/// Run this frame belongs to.
	pub generation: LayoutGeneration,
	/// Ticks taken so far.
	pub tick: u32,
	/// Node id and position, one per node.
	pub positions: Vec<(String, Position)>,
}

struct ActiveRun {
	generation: LayoutGeneration,
	started_ms: f64,
	ticks: u32,
	simulation: Simulation,
}

/// Owns at most one running simulation.
///
/// Callers drive it with [`step`](Self::step) from their frame loop and apply
/// the emitted frames to the graph bound by [`start`](Self::start).
pub struct LayoutEngine {
	config: LayoutConfig,
	last_generation: u64,
	active: Option<ActiveRun>,
}

impl LayoutEngine {
	/// Idle engine; generations start after 0.
	pub fn new(config: LayoutConfig) -> Self {
		Self {
			config,
			last_generation: 0,
			active: None,
		}
	}

	/// Parameters of every run.
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Whether a run is in progress.
	pub fn is_running(&self) -> bool {
		self.active.is_some()
	}

	/// Generation of the running simulation, if any.
	pub fn current_generation(&self) -> Option<LayoutGeneration> {
		self.active.as_ref().map(|run| run.generation)
	}

	/// Stops any running simulation, then starts one over `graph` and binds
	/// the graph to the new generation.
	pub fn start(&mut self, graph: &mut EgoGraph, now_ms: f64) -> LayoutGeneration {
		self.stop();
		self.last_generation += 1;
		let generation = LayoutGeneration(self.last_generation);
		graph.bind_generation(generation);
		info!(
			"layout {:?} started: {} nodes, {} edges",
			generation,
			graph.nodes.len(),
			graph.edges.len()
		);
		self.active = Some(ActiveRun {
			generation,
			started_ms: now_ms,
			ticks: 0,
			simulation: Simulation::new(graph, &self.config),
		});
		generation
	}

	/// Advances one tick and emits every node's position.
	///
	/// Returns `None` once stopped. A run stops itself when its time budget is
	/// spent or when it has cooled.
	pub fn step(&mut self, now_ms: f64) -> Option<LayoutFrame> {
		let run = self.active.as_mut()?;
		if now_ms - run.started_ms >= self.config.budget_ms {
			debug!(
				"layout {:?} hit its {}ms budget after {} ticks",
				run.generation, self.config.budget_ms, run.ticks
			);
			self.stop();
			return None;
		}
		if run.simulation.is_settled() {
			debug!("layout {:?} settled after {} ticks", run.generation, run.ticks);
			self.stop();
			return None;
		}
		run.simulation.tick();
		run.ticks += 1;
		Some(LayoutFrame {
			generation: run.generation,
			tick: run.ticks,
			positions: run.simulation.positions(),
		})
	}

	/// Cancels the running simulation. Safe to call repeatedly.
	pub fn stop(&mut self) -> bool {
		match self.active.take() {
			Some(run) => {
				debug!("layout {:?} stopped", run.generation);
				true
			}
			None => false,
		}
	}
}

impl Default for LayoutEngine {
	fn default() -> Self {
		Self::new(LayoutConfig::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphBuilder, Reduced, RelationshipTuple};

	fn graph(anchor: &str, peers: &[&str]) -> EgoGraph {
		GraphBuilder::default().build(&Reduced {
			anchor: anchor.into(),
			ranked: peers
				.iter()
				.map(|p| RelationshipTuple::new(anchor, 0.5, 4, *p))
				.collect(),
		})
	}

	#[test]
	fn test_frames_cover_every_node() {
		let mut engine = LayoutEngine::default();
		let mut g = graph("a", &["b", "c", "d"]);
		let generation = engine.start(&mut g, 0.0);

		let frame = engine.step(16.0).unwrap();
		assert_eq!(frame.generation, generation);
		assert_eq!(frame.tick, 1);
		let ids: Vec<_> = frame.positions.iter().map(|(id, _)| id.as_str()).collect();
		assert_eq!(ids, vec!["1", "2", "3", "4"]);

		assert!(g.apply_frame(&frame));
		assert_eq!(g.anchor().unwrap().position, Position::ORIGIN);
		assert!(g.nodes[1..].iter().any(|n| n.position != Position::ORIGIN));
	}

	#[test]
	fn test_budget_stops_run() {
		let mut engine = LayoutEngine::default();
		let mut g = graph("a", &["b"]);
		engine.start(&mut g, 1000.0);
		assert!(engine.step(1000.0 + 3999.0).is_some());
		assert!(engine.step(1000.0 + 4000.0).is_none());
		assert!(!engine.is_running());
		assert!(engine.step(1000.0 + 4001.0).is_none());
	}

	#[test]
	fn test_settles_before_budget() {
		let mut engine = LayoutEngine::default();
		let mut g = graph("a", &["b", "c"]);
		engine.start(&mut g, 0.0);
		let mut ticks = 0;
		while engine.step(0.0).is_some() {
			ticks += 1;
			assert!(ticks < 1000);
		}
		assert!(!engine.is_running());
	}

	#[test]
	fn test_stop_is_idempotent() {
		let mut engine = LayoutEngine::default();
		let mut g = graph("a", &["b"]);
		engine.start(&mut g, 0.0);
		assert!(engine.stop());
		assert!(!engine.stop());
		assert!(engine.step(10.0).is_none());
	}

	#[test]
	fn test_restart_supersedes_previous_run() {
		let mut engine = LayoutEngine::default();
		let mut first = graph("a", &["b", "c"]);
		let first_gen = engine.start(&mut first, 0.0);
		let stale = engine.step(16.0).unwrap();

		let mut second = graph("z", &["y"]);
		let second_gen = engine.start(&mut second, 20.0);
		assert!(second_gen > first_gen);
		assert_eq!(engine.current_generation(), Some(second_gen));

		let before = second.nodes.clone();
		assert!(!second.apply_frame(&stale));
		assert_eq!(second.nodes, before);

		let fresh = engine.step(36.0).unwrap();
		assert_eq!(fresh.generation, second_gen);
		assert!(second.apply_frame(&fresh));
	}
}
