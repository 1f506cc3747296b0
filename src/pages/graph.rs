use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;
use log::warn;
use uuid::Uuid;

use crate::components::force_graph::ForceGraphCanvas;
use crate::components::history_panel::HistoryPanel;
use crate::components::notices::Notices;
use crate::components::search_form::{SearchFields, SearchForm};
use crate::graph::PeerActivation;
use crate::history::{SearchEntry, SearchHistory, remote};
use crate::query::SearchParams;
use crate::services::{Services, services};
use crate::session::{self, GraphSession};

/// Non-reactive state of one explorer page.
#[derive(Clone)]
struct Explorer {
	session: Rc<RefCell<GraphSession>>,
	history: Rc<RefCell<SearchHistory>>,
	services: Rc<Services>,
}

type ExplorerHandle = StoredValue<Explorer, LocalStorage>;

/// Reactive state the page's views read from.
#[derive(Clone, Copy)]
struct ExplorerView {
	fields: SearchFields,
	revision: RwSignal<u64>,
	recent: RwSignal<Vec<SearchEntry>>,
	saved: RwSignal<Vec<SearchEntry>>,
	notices: RwSignal<Vec<String>>,
	loading: RwSignal<bool>,
	searching: RwSignal<bool>,
}

impl ExplorerView {
	fn new(default_limit: u32) -> Self {
		Self {
			fields: SearchFields::new(default_limit),
			revision: RwSignal::new(0),
			recent: RwSignal::new(Vec::new()),
			saved: RwSignal::new(Vec::new()),
			notices: RwSignal::new(Vec::new()),
			loading: RwSignal::new(true),
			searching: RwSignal::new(false),
		}
	}

	fn publish(&self, history: &SearchHistory, recent_limit: usize) {
		self.recent
			.set(history.recent(Some(recent_limit)).into_iter().cloned().collect());
		self.saved.set(history.saved().into_iter().cloned().collect());
	}

	fn notify(&self, notices: impl IntoIterator<Item = String>) {
		let mut notices = notices.into_iter().peekable();
		if notices.peek().is_some() {
			self.notices.update(|all| all.extend(notices));
		}
	}
}

fn run_search(handle: ExplorerHandle, ui: ExplorerView, params: SearchParams) {
	let Some(explorer) = handle.try_get_value() else {
		return;
	};
	ui.fields.fill(&params);
	ui.searching.set(true);
	spawn_local(async move {
		let services = explorer.services.as_ref();
		let limit = services.config.history.recent_limit;
		let report = session::search(
			&explorer.session,
			&explorer.history,
			services.source.as_ref(),
			services.repo.as_ref(),
			params,
			js_sys::Date::now,
			&|history| ui.publish(history, limit),
		)
		.await;
		if report.graph.is_ok() {
			ui.revision.update(|r| *r += 1);
		}
		ui.notify(report.notices());
		// a newer search owns the flag now
		if !report.is_stale() {
			ui.searching.set(false);
		}
	});
}

fn toggle_saved(handle: ExplorerHandle, ui: ExplorerView, id: Uuid) {
	let Some(explorer) = handle.try_get_value() else {
		return;
	};
	spawn_local(async move {
		let services = explorer.services.as_ref();
		let limit = services.config.history.recent_limit;
		let result = remote::toggle_saved(&explorer.history, services.repo.as_ref(), id, &|history| {
			ui.publish(history, limit)
		})
		.await;
		if let Err(e) = result {
			ui.notify(e.notice());
		}
	});
}

fn load_history(handle: ExplorerHandle, ui: ExplorerView) {
	let Some(explorer) = handle.try_get_value() else {
		return;
	};
	spawn_local(async move {
		let services = explorer.services.as_ref();
		let dataset = explorer.session.borrow().dataset().to_string();
		let limit = services.config.history.recent_limit;
		match remote::load(&explorer.history, services.repo.as_ref(), &dataset, limit).await {
			Ok(()) => ui.publish(&explorer.history.borrow(), limit),
			Err(e) => {
				warn!("could not load history for {dataset}: {e}");
				ui.notify(e.notice());
			}
		}
		ui.loading.set(false);
	});
}

/// Search form, canvas and history for one dataset.
#[component]
fn DatasetExplorer(dataset: String) -> impl IntoView {
	let services = services();
	let ui = ExplorerView::new(services.config.query.default_limit);
	let activated = RwSignal::new(None::<String>);

	let session = GraphSession::new(
		dataset.clone(),
		services.config.clone(),
		PeerActivation::new(move |label| activated.set(Some(label.to_string()))),
	);
	let session = match session {
		Ok(session) => Rc::new(RefCell::new(session)),
		Err(e) => return view! { <p class="notice">{e.to_string()}</p> }.into_any(),
	};
	let handle: ExplorerHandle = StoredValue::new_local(Explorer {
		session: session.clone(),
		history: Rc::new(RefCell::new(SearchHistory::new())),
		services,
	});
	load_history(handle, ui);

	// clicking a peer re-centres on it with the current filters
	Effect::new(move |_| {
		let Some(label) = activated.get() else {
			return;
		};
		let Some(params) = handle.try_with_value(|e| e.session.borrow().recentre(&label)) else {
			return;
		};
		run_search(handle, ui, params);
	});

	on_cleanup(move || {
		handle.try_with_value(|e| e.session.borrow_mut().stop_layout());
	});

	let on_search = Callback::new(move |params: SearchParams| run_search(handle, ui, params));
	let on_toggle = Callback::new(move |id: Uuid| toggle_saved(handle, ui, id));
	let ExplorerView {
		fields,
		revision,
		recent,
		saved,
		notices,
		loading,
		searching,
	} = ui;

	view! {
		<div class="explorer">
			<div class="explorer-canvas">
				<ForceGraphCanvas session=session revision=revision />
			</div>
			<aside class="explorer-side">
				<SearchForm
					dataset=dataset
					fields=fields
					searching=searching
					on_search=on_search
				/>
				<Notices notices=notices />
				<HistoryPanel
					title="Saved Searches"
					empty_text="No saved searches yet!"
					entries=saved
					loading=loading
					on_run=on_search
					on_toggle=on_toggle
				/>
				<HistoryPanel
					title="Latest Searches"
					empty_text="No searches yet!"
					entries=recent
					loading=loading
					on_run=on_search
					on_toggle=on_toggle
				/>
			</aside>
		</div>
	}
	.into_any()
}

/// Routed at `/graph/:dataset_name`.
#[component]
pub fn GraphPage() -> impl IntoView {
	let params = use_params_map();
	let dataset = move || params.read().get("dataset_name").unwrap_or_default();

	view! {
		{move || {
			let dataset = dataset();
			view! { <DatasetExplorer dataset=dataset /> }
		}}
	}
}
