use leptos::prelude::*;

/// Dismissable error notices, newest last.
#[component]
pub fn Notices(notices: RwSignal<Vec<String>>) -> impl IntoView {
	let items = move || {
		notices
			.get()
			.into_iter()
			.enumerate()
			.map(|(idx, text)| {
				view! {
					<div class="notice" role="alert">
						<span>{text}</span>
						<button on:click=move |_| {
							notices.update(|all| {
								if idx < all.len() {
									all.remove(idx);
								}
							})
						}>"\u{00d7}"</button>
					</div>
				}
			})
			.collect_view()
	};

	view! { <div class="notices">{items}</div> }
}
