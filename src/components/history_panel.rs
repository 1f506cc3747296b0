use leptos::prelude::*;
use uuid::Uuid;

use crate::history::SearchEntry;
use crate::query::SearchParams;

/// One list of past searches with a star to save or unsave each entry.
#[component]
pub fn HistoryPanel(
	title: &'static str,
	empty_text: &'static str,
	#[prop(into)] entries: Signal<Vec<SearchEntry>>,
	#[prop(into)] loading: Signal<bool>,
	on_run: Callback<SearchParams>,
	on_toggle: Callback<Uuid>,
) -> impl IntoView {
	let rows = move || {
		entries
			.get()
			.into_iter()
			.map(|entry| {
				let (id, params) = (entry.id, entry.params());
				let (star, hint) = if entry.saved {
					("\u{2605}", "Unsave")
				} else {
					("\u{2606}", "Save")
				};
				view! {
					<li class="history-entry">
						<button
							class="star"
							class:saved=entry.saved
							title=hint
							on:click=move |_| on_toggle.run(id)
						>
							{star}
						</button>
						<a class="rerun" on:click=move |_| on_run.run(params.clone())>
							{format!("{} ({})", entry.email_search, entry.limit)}
						</a>
					</li>
				}
			})
			.collect_view()
	};

	view! {
		<section class="history-panel">
			<h2>{title}</h2>
			<Show
				when=move || !loading.get()
				fallback=|| view! { <p class="loading">"Loading..."</p> }
			>
				<Show
					when=move || !entries.with(Vec::is_empty)
					fallback=move || view! { <p class="empty">{empty_text}</p> }
				>
					<ul>{rows}</ul>
				</Show>
			</Show>
		</section>
	}
}
