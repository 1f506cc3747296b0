use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use crate::error::GraphError;
use crate::query::SearchParams;

/// Editable search fields, kept as text until submitted.
#[derive(Clone, Copy)]
pub struct SearchFields {
	pub team_size: RwSignal<String>,
	pub email: RwSignal<String>,
	pub ends_with: RwSignal<String>,
	pub error: RwSignal<Option<String>>,
}

impl SearchFields {
	pub fn new(default_limit: u32) -> Self {
		Self {
			team_size: RwSignal::new(default_limit.to_string()),
			email: RwSignal::new(String::new()),
			ends_with: RwSignal::new(String::new()),
			error: RwSignal::new(None),
		}
	}

	/// Shows `params` in the form, e.g. when a history entry is re-run.
	pub fn fill(&self, params: &SearchParams) {
		self.team_size.set(params.limit.to_string());
		self.email.set(params.email_search.clone());
		self.ends_with.set(params.emails_end_with.clone());
		self.error.set(None);
	}

	pub fn params(&self) -> Result<SearchParams, GraphError> {
		let limit = self
			.team_size
			.get_untracked()
			.trim()
			.parse::<u32>()
			.map_err(|_| GraphError::InvalidQuery("team size must be a whole number".into()))?;
		let params = SearchParams::new(self.email.get_untracked().trim(), limit)
			.ending_with(self.ends_with.get_untracked().trim());
		params.validate()?;
		Ok(params)
	}
}

#[component]
pub fn SearchForm(
	dataset: String,
	fields: SearchFields,
	#[prop(into)] searching: Signal<bool>,
	on_search: Callback<SearchParams>,
) -> impl IntoView {
	let (advanced, set_advanced) = signal(false);
	let SearchFields {
		team_size,
		email,
		ends_with,
		error,
	} = fields;

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		match fields.params() {
			Ok(params) => {
				error.set(None);
				on_search.run(params);
			}
			Err(e) => error.set(Some(e.to_string())),
		}
	};

	view! {
		<form class="search-form" on:submit=on_submit>
			<h2>"User search for graph \"" {dataset} "\""</h2>
			<label>
				<span>"Team Size"</span>
				<input type="text" placeholder="20" bind:value=team_size />
			</label>
			<label>
				<span>"Email"</span>
				<input type="text" placeholder="example@example.com" bind:value=email />
			</label>
			<button
				type="button"
				class="advanced-toggle"
				on:click=move |_| set_advanced.update(|open| *open = !*open)
			>
				"Advanced options"
			</button>
			<Show when=move || advanced.get()>
				<label>
					<span>"Email ends with"</span>
					<input type="text" placeholder="example.com" bind:value=ends_with />
				</label>
			</Show>
			<p class="field-error">{move || error.get()}</p>
			<button type="submit" disabled=move || searching.get()>
				{move || if searching.get() { "Searching..." } else { "Search" }}
			</button>
		</form>
	}
}
