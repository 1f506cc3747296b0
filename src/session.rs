//! One graph view: query tokens, the displayed ego-network and its layout.
//!
//! Searches are split into [`GraphSession::begin_search`] and
//! [`GraphSession::apply_results`] so the caller can await the relationship
//! source without holding the session borrowed. Only the newest request's
//! results are ever applied.

use std::cell::RefCell;

use chrono::Utc;
use log::{debug, info};

use crate::colour::{Rgb, TriColourScale};
use crate::config::AppConfig;
use crate::error::GraphError;
use crate::graph::{EgoGraph, GraphBuilder, GraphEdge, PeerActivation, RelationshipTuple, reduce};
use crate::history::{SearchEntry, SearchHistory, SearchRepository, remote};
use crate::layout::{LayoutEngine, LayoutFrame};
use crate::query::{RelationshipSource, SearchParams, validate_dataset};

/// Monotonic request id; only the latest one may change the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// A submitted search awaiting its relationship tuples.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingQuery {
	/// Compared against the latest token when results arrive.
	pub token: RequestToken,
	/// Dataset searched.
	pub dataset: String,
	/// What was searched for.
	pub params: SearchParams,
}

/// State of one explorer view: the dataset, its latest search, graph and layout.
pub struct GraphSession {
	dataset: String,
	config: AppConfig,
	scale: TriColourScale,
	builder: GraphBuilder,
	layout: LayoutEngine,
	graph: Option<EgoGraph>,
	latest: u64,
	last_params: Option<SearchParams>,
}

impl GraphSession {
	/// `activate_peer` receives a peer's label when its node is activated.
	pub fn new(
		dataset: impl Into<String>,
		config: AppConfig,
		activate_peer: PeerActivation,
	) -> Result<Self, GraphError> {
		let dataset = dataset.into();
		validate_dataset(&dataset)?;
		config.validate()?;
		Ok(Self {
			scale: config.palette.scale()?,
			layout: LayoutEngine::new(config.layout.clone()),
			builder: GraphBuilder::with_activation(activate_peer),
			dataset,
			config,
			graph: None,
			latest: 0,
			last_params: None,
		})
	}

	/// Name of the dataset on view.
	pub fn dataset(&self) -> &str {
		&self.dataset
	}

	/// Configuration the session was built with.
	pub fn config(&self) -> &AppConfig {
		&self.config
	}

	/// The displayed graph, if a search has succeeded.
	pub fn graph(&self) -> Option<&EgoGraph> {
		self.graph.as_ref()
	}

	/// Colour of an edge under the configured palette.
	pub fn edge_colour(&self, edge: &GraphEdge) -> Rgb {
		self.scale.map(edge.sentiment)
	}

	/// Parameters of the most recent search, if any.
	pub fn last_params(&self) -> Option<&SearchParams> {
		self.last_params.as_ref()
	}

	/// Parameters for re-centring the view on `label`, keeping the last filters.
	pub fn recentre(&self, label: &str) -> SearchParams {
		match &self.last_params {
			Some(params) => params.recentred(label),
			None => SearchParams::new(label, self.config.query.default_limit),
		}
	}

	/// Validates `params` and issues a token that supersedes every earlier one.
	pub fn begin_search(&mut self, params: SearchParams) -> Result<PendingQuery, GraphError> {
		params.validate()?;
		self.latest += 1;
		self.last_params = Some(params.clone());
		debug!("search #{} for {:?} on {}", self.latest, params.email_search, self.dataset);
		Ok(PendingQuery {
			token: RequestToken(self.latest),
			dataset: self.dataset.clone(),
			params,
		})
	}

	/// Whether no newer search has begun since `pending`.
	pub fn is_latest(&self, pending: &PendingQuery) -> bool {
		pending.token == RequestToken(self.latest)
	}

	/// Replaces the displayed graph with the result of `pending` and restarts
	/// the layout.
	///
	/// Superseded requests yield [`GraphError::StaleResponse`] and empty
	/// results [`GraphError::NoResults`]; neither touches the current graph.
	pub fn apply_results(
		&mut self,
		pending: &PendingQuery,
		tuples: &[RelationshipTuple],
		now_ms: f64,
	) -> Result<&EgoGraph, GraphError> {
		if !self.is_latest(pending) {
			debug!("discarding stale results of {:?}", pending.token);
			return Err(GraphError::StaleResponse);
		}
		let reduced = reduce(tuples, pending.params.limit as usize)?;
		let mut graph = self.builder.build(&reduced);
		self.layout.start(&mut graph, now_ms);
		info!(
			"showing {} with {} peers",
			reduced.anchor,
			graph.peer_count()
		);
		Ok(self.graph.insert(graph))
	}

	/// Steps the layout once and applies the frame. Returns whether any
	/// position changed.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		match self.layout.step(now_ms) {
			Some(frame) => self.apply_frame(&frame),
			None => false,
		}
	}

	/// Applies a tick from the current run. Frames of an older run are ignored and return `false`.
	pub fn apply_frame(&mut self, frame: &LayoutFrame) -> bool {
		self.graph.as_mut().is_some_and(|g| g.apply_frame(frame))
	}

	/// Whether the layout is still moving nodes.
	pub fn is_layout_running(&self) -> bool {
		self.layout.is_running()
	}

	/// Cancels the layout; frames already emitted are ignored afterwards.
	pub fn stop_layout(&mut self) {
		self.layout.stop();
		if let Some(graph) = self.graph.as_mut() {
			graph.release_generation();
		}
	}
}

/// What happened to one submitted search.
#[derive(Debug)]
pub struct SearchReport {
	/// Outcome of the graph update; `StaleResponse` when superseded.
	pub graph: Result<(), GraphError>,
	/// Outcome of recording the search in history.
	pub history: Result<(), GraphError>,
}

impl SearchReport {
	/// Whether a newer search replaced this one before it finished.
	pub fn is_stale(&self) -> bool {
		matches!(self.graph, Err(GraphError::StaleResponse))
	}

	/// User-visible notices, graph first.
	pub fn notices(&self) -> Vec<String> {
		[&self.graph, &self.history]
			.into_iter()
			.filter_map(|r| r.as_ref().err().and_then(GraphError::notice))
			.collect()
	}
}

/// Runs a search end to end: issues the query, records it in `history` and
/// applies the tuples if this is still the latest request.
///
/// `now_ms` is read when results arrive and starts the layout's time budget.
/// `on_history` sees every change to `history` as it happens. A request
/// superseded while in flight reports [`GraphError::StaleResponse`] whatever
/// the source answered.
pub async fn search(
	session: &RefCell<GraphSession>,
	history: &RefCell<SearchHistory>,
	source: &dyn RelationshipSource,
	repo: &dyn SearchRepository,
	params: SearchParams,
	now_ms: impl Fn() -> f64,
	on_history: &dyn Fn(&SearchHistory),
) -> SearchReport {
	let pending = match session.borrow_mut().begin_search(params) {
		Ok(pending) => pending,
		Err(e) => {
			return SearchReport {
				graph: Err(e),
				history: Ok(()),
			};
		}
	};
	let entry = SearchEntry::new(&pending.params, Utc::now());

	let (tuples, recorded) = futures::join!(
		source.relationships(
			&pending.dataset,
			&pending.params.email_search,
			&pending.params.emails_end_with,
		),
		remote::record_search(history, repo, &pending.dataset, entry, on_history),
	);

	let graph = if session.borrow().is_latest(&pending) {
		tuples.and_then(|tuples| {
			session
				.borrow_mut()
				.apply_results(&pending, &tuples, now_ms())
				.map(|_| ())
		})
	} else {
		debug!("discarding stale outcome of {:?}", pending.token);
		Err(GraphError::StaleResponse)
	};
	SearchReport {
		graph,
		history: recorded,
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use futures::executor::block_on;

	use super::*;
	use crate::graph::{ANCHOR_ID, Position};
	use crate::history::MemorySearchRepository;
	use crate::query::StaticRelationships;

	fn example_tuples() -> Vec<RelationshipTuple> {
		vec![
			RelationshipTuple::new("a@enron.com", 0.9, 100, "b@enron.com"),
			RelationshipTuple::new("a@enron.com", 0.2, 50, "c@enron.com"),
			RelationshipTuple::new("x@enron.com", 0.99, 999, "b@enron.com"),
		]
	}

	fn session() -> GraphSession {
		GraphSession::new("enron", AppConfig::default(), PeerActivation::new(|_| {})).unwrap()
	}

	fn labels(session: &GraphSession) -> Vec<String> {
		session
			.graph()
			.map(|g| g.nodes.iter().map(|n| n.label.clone()).collect())
			.unwrap_or_default()
	}

	#[test]
	fn test_apply_builds_and_starts_layout() {
		let mut s = session();
		let pending = s.begin_search(SearchParams::new("a@enron", 10)).unwrap();
		let graph = s.apply_results(&pending, &example_tuples(), 0.0).unwrap();
		assert_eq!(graph.nodes.len(), 3);
		assert_eq!(graph.edges.len(), 2);
		assert!(s.is_layout_running());
		assert_eq!(labels(&s), vec!["a@enron.com", "b@enron.com", "c@enron.com"]);

		assert!(s.tick(16.0));
		let graph = s.graph().unwrap();
		assert_eq!(graph.node(ANCHOR_ID).unwrap().position, Position::ORIGIN);
		assert!(graph.nodes[1..].iter().all(|n| n.position != Position::ORIGIN));
	}

	#[test]
	fn test_invalid_params_rejected() {
		let mut s = session();
		assert!(matches!(
			s.begin_search(SearchParams::new("ab", 10)),
			Err(GraphError::InvalidQuery(_))
		));
		assert!(GraphSession::new("", AppConfig::default(), PeerActivation::new(|_| {})).is_err());
	}

	#[test]
	fn test_stale_results_discarded() {
		let mut s = session();
		let first = s.begin_search(SearchParams::new("a@enron", 10)).unwrap();
		let second = s.begin_search(SearchParams::new("z@enron", 10)).unwrap();
		assert!(!s.is_latest(&first));

		let newer = vec![RelationshipTuple::new("z@enron.com", 0.5, 3, "y@enron.com")];
		s.apply_results(&second, &newer, 0.0).unwrap();
		assert_eq!(
			s.apply_results(&first, &example_tuples(), 5.0).unwrap_err(),
			GraphError::StaleResponse
		);
		assert_eq!(labels(&s), vec!["z@enron.com", "y@enron.com"]);
	}

	#[test]
	fn test_stale_before_newer_arrives() {
		let mut s = session();
		let first = s.begin_search(SearchParams::new("a@enron", 10)).unwrap();
		let _second = s.begin_search(SearchParams::new("z@enron", 10)).unwrap();
		assert_eq!(
			s.apply_results(&first, &example_tuples(), 0.0).unwrap_err(),
			GraphError::StaleResponse
		);
		assert!(s.graph().is_none());
		assert!(!s.is_layout_running());
	}

	#[test]
	fn test_no_results_keeps_previous_graph() {
		let mut s = session();
		let first = s.begin_search(SearchParams::new("a@enron", 10)).unwrap();
		s.apply_results(&first, &example_tuples(), 0.0).unwrap();
		let before = s.graph().unwrap().nodes.clone();

		let empty = s.begin_search(SearchParams::new("nobody", 10)).unwrap();
		assert_eq!(s.apply_results(&empty, &[], 0.0).unwrap_err(), GraphError::NoResults);
		assert_eq!(s.graph().unwrap().nodes, before);
	}

	#[test]
	fn test_one_active_simulation_across_searches() {
		let mut s = session();
		let first = s.begin_search(SearchParams::new("a@enron", 10)).unwrap();
		s.apply_results(&first, &example_tuples(), 0.0).unwrap();
		let old_frame = s.layout.step(1.0).unwrap();

		let second = s.begin_search(SearchParams::new("z@enron", 10)).unwrap();
		let newer = vec![RelationshipTuple::new("z@enron.com", 0.5, 3, "y@enron.com")];
		s.apply_results(&second, &newer, 10.0).unwrap();
		let before = s.graph().unwrap().nodes.clone();
		assert!(!s.apply_frame(&old_frame));
		assert_eq!(s.graph().unwrap().nodes, before);
		assert!(s.tick(20.0));
	}

	#[test]
	fn test_stop_layout_blocks_late_frames() {
		let mut s = session();
		let pending = s.begin_search(SearchParams::new("a@enron", 10)).unwrap();
		s.apply_results(&pending, &example_tuples(), 0.0).unwrap();
		let generation = s.graph().unwrap().generation().unwrap();
		let late = LayoutFrame {
			generation,
			tick: 99,
			positions: vec![("2".into(), Position { x: 5.0, y: 5.0 })],
		};

		s.stop_layout();
		s.stop_layout();
		assert!(!s.is_layout_running());
		assert!(!s.apply_frame(&late));
		assert!(!s.tick(16.0));
	}

	#[test]
	fn test_recentre_keeps_filters() {
		let mut s = session();
		assert_eq!(s.recentre("b@enron.com"), SearchParams::new("b@enron.com", 10));
		s.begin_search(SearchParams::new("a@enron", 4).ending_with("enron.com"))
			.unwrap();
		let next = s.recentre("b@enron.com");
		assert_eq!(next.limit, 4);
		assert_eq!(next.emails_end_with, "enron.com");
	}

	#[test]
	fn test_search_end_to_end() {
		let activated = Rc::new(RefCell::new(Vec::<String>::new()));
		let sink = activated.clone();
		let session = RefCell::new(
			GraphSession::new(
				"enron",
				AppConfig::default(),
				PeerActivation::new(move |label| sink.borrow_mut().push(label.to_string())),
			)
			.unwrap(),
		);
		let history = RefCell::new(SearchHistory::new());
		let source = StaticRelationships::new().with_dataset("enron", example_tuples());
		let repo = MemorySearchRepository::new();

		let report = block_on(search(
			&session,
			&history,
			&source,
			&repo,
			SearchParams::new("a@enron", 10),
			|| 0.0,
			&|_| {},
		));
		assert!(report.graph.is_ok());
		assert!(report.history.is_ok());
		assert!(report.notices().is_empty());
		assert_eq!(history.borrow().recent(None).len(), 1);
		assert_eq!(repo.len(), 1);

		assert!(session.borrow().graph().unwrap().activate("2"));
		assert_eq!(*activated.borrow(), vec!["b@enron.com".to_string()]);

		let report = block_on(search(
			&session,
			&history,
			&source,
			&repo,
			SearchParams::new("nobody", 10),
			|| 0.0,
			&|_| {},
		));
		assert_eq!(report.graph, Err(GraphError::NoResults));
		assert_eq!(report.notices(), vec!["No users found with that email".to_string()]);
		assert_eq!(labels(&session.borrow()).len(), 3);
		assert_eq!(history.borrow().recent(None).len(), 2);
	}

	/// Starts a newer search on the session, then fails the current one.
	struct SupersededSource<'a> {
		session: &'a RefCell<GraphSession>,
	}

	#[async_trait::async_trait(?Send)]
	impl RelationshipSource for SupersededSource<'_> {
		async fn datasets(&self) -> Result<Vec<String>, GraphError> {
			Ok(vec!["enron".into()])
		}

		async fn relationships(
			&self,
			_: &str,
			_: &str,
			_: &str,
		) -> Result<Vec<RelationshipTuple>, GraphError> {
			self.session
				.borrow_mut()
				.begin_search(SearchParams::new("z@enron", 10))?;
			Err(GraphError::Source("timeout".into()))
		}
	}

	#[test]
	fn test_superseded_failure_is_silent() {
		let session = RefCell::new(session());
		let history = RefCell::new(SearchHistory::new());
		let repo = MemorySearchRepository::new();
		let source = SupersededSource { session: &session };

		let report = block_on(search(
			&session,
			&history,
			&source,
			&repo,
			SearchParams::new("a@enron", 10),
			|| 0.0,
			&|_| {},
		));
		assert_eq!(report.graph, Err(GraphError::StaleResponse));
		assert!(report.is_stale());
		assert!(report.notices().is_empty());
		assert!(session.borrow().graph().is_none());
	}

	#[test]
	fn test_search_publishes_history_while_pending() {
		let session = RefCell::new(session());
		let history = RefCell::new(SearchHistory::new());
		let source = StaticRelationships::new().with_dataset("enron", example_tuples());
		let repo = MemorySearchRepository::new();
		let seen = RefCell::new(Vec::new());

		let report = block_on(search(
			&session,
			&history,
			&source,
			&repo,
			SearchParams::new("a@enron", 10),
			|| 0.0,
			&|h| seen.borrow_mut().push(h.len()),
		));
		assert!(!report.is_stale());
		assert_eq!(*seen.borrow(), vec![1]);
	}
}
