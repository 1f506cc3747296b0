use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;

use crate::error::GraphError;
use crate::services::services;

/// Lists the datasets that can be explored.
#[component]
pub fn Home() -> impl IntoView {
	let datasets = RwSignal::new(None::<Result<Vec<String>, GraphError>>);
	spawn_local(async move {
		let services = services();
		let names = services.source.datasets().await;
		datasets.set(Some(names));
	});

	let listing = move || {
		datasets.get().map(|names| {
			names.map(|names| {
				names
					.into_iter()
					.map(|name| {
						let href = format!("/graph/{name}");
						view! {
							<li>
								<A href=href>{name}</A>
							</li>
						}
					})
					.collect_view()
			})
		})
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<main class="datasets">
				<h1>"Email Sentiment Graphs"</h1>
				<p class="subtitle">"Pick a dataset, then search for a user to see who they talk to and how."</p>
				<ul class="dataset-list">{listing}</ul>
			</main>
		</ErrorBoundary>
	}
}
