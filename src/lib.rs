//! Leptos client-side app wiring and routes.
//!
//! The explorer core (colour scale, reducer, graph builder, layout, history
//! and the session that ties them together) lives in DOM-free modules; the
//! `components` and `pages` modules render it.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod colour;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod layout;
pub mod query;
pub mod session;

// Modules
mod components;
mod pages;
mod services;

// Top-Level pages
use crate::pages::graph::GraphPage;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the dataset list, the graph explorer and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Email Sentiment Graphs" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/graph/:dataset_name") view=GraphPage />
			</Routes>
		</Router>
	}
}
