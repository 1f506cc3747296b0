use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use crate::session::GraphSession;

use super::render;
use super::state::{CLICK_SLOP, ForceGraphState};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn window_size(window: &Window) -> (f64, f64) {
	let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
	let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
	(w, h)
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas view of the session's ego-network.
///
/// Every animation frame steps the session's layout and repaints. Clicking a
/// peer activates it; dragging the background pans and the wheel zooms.
/// `revision` changes whenever a new graph replaces the old one.
#[component]
pub fn ForceGraphCanvas(
	session: Rc<RefCell<GraphSession>>,
	#[prop(into)] revision: Signal<u64>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let (cursor, set_cursor) = signal("grab");
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init, session_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), session.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("canvas has no 2d context");
				return;
			}
		};
		*state_init.borrow_mut() = Some(ForceGraphState::new(w, h));

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, session_anim, canvas_anim) = (
			state_init.clone(),
			animate_init.clone(),
			session_init.clone(),
			canvas.clone(),
		);
		let mut last_frame = js_sys::Date::now();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let now = js_sys::Date::now();
			let dt = ((now - last_frame) / 1000.0).clamp(0.0, 0.1);
			last_frame = now;

			let moved = session_anim.borrow_mut().tick(now);
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(dt);
				let session = session_anim.borrow();
				if moved && s.follow {
					if let Some(graph) = session.graph() {
						s.fit(graph);
					}
				}
				render::render(s, &session, &ctx);
			}
			// the loop ends once the canvas leaves the page
			if !canvas_anim.is_connected() {
				session_anim.borrow_mut().stop_layout();
				return;
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_rev = state.clone();
	Effect::new(move |_| {
		revision.track();
		if let Some(ref mut s) = *state_rev.borrow_mut() {
			s.reset();
		}
	});

	let state_md = state.clone();
	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			let pressed = session_md
				.borrow()
				.graph()
				.and_then(|g| s.node_at_position(g, x, y));
			s.press.node = pressed;
			s.press.start_x = x;
			s.press.start_y = y;
			if s.press.node.is_none() {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
				s.follow = false;
				set_cursor.set("grabbing");
			}
		}
	};

	let state_mm = state.clone();
	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
				return;
			}
			let session = session_mm.borrow();
			let Some(graph) = session.graph() else {
				return;
			};
			let hovered = s.node_at_position(graph, x, y);
			let clickable = hovered
				.as_deref()
				.and_then(|id| graph.node(id))
				.is_some_and(|n| n.activatable);
			set_cursor.set(if clickable { "pointer" } else { "grab" });
			s.set_hover(graph, hovered);
		}
	};

	let state_mu = state.clone();
	let session_mu = session.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let clicked = match *state_mu.borrow_mut() {
			Some(ref mut s) => {
				s.pan.active = false;
				let pressed = s.press.node.take();
				let travelled = ((x - s.press.start_x).powi(2) + (y - s.press.start_y).powi(2)).sqrt();
				pressed.filter(|_| travelled <= CLICK_SLOP)
			}
			None => None,
		};
		if cursor.get_untracked() == "grabbing" {
			set_cursor.set("grab");
		}
		if let Some(id) = clicked {
			if let Some(graph) = session_mu.borrow().graph() {
				graph.activate(&id);
			}
		}
	};

	let state_ml = state.clone();
	let session_ml = session.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pan.active = false;
			s.press.node = None;
			if let Some(graph) = session_ml.borrow().graph() {
				s.set_hover(graph, None);
			}
		}
		set_cursor.set("grab");
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
			s.follow = false;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block;"
			style:cursor=move || cursor.get()
		/>
	}
}
