use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use crate::graph::{ANCHOR_ID, EgoGraph, GraphNode};
use crate::session::GraphSession;

use super::state::{ForceGraphState, NODE_RADIUS};

const BACKGROUND: &str = "#1a1a2e";
const NODE_FILL: &str = "#2b2d42";
const ANCHOR_FILL: &str = "#3d5a80";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, session: &GraphSession, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	let Some(graph) = session.graph() else {
		return;
	};
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, session, graph, ctx);
	draw_nodes(state, graph, ctx);
	ctx.restore();
}

fn draw_edges(
	state: &ForceGraphState,
	session: &GraphSession,
	graph: &EgoGraph,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.transform.k;
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();

	for edge in &graph.edges {
		let (Some(n1), Some(n2)) = (graph.node(&edge.source), graph.node(&edge.target)) else {
			continue;
		};
		let (x1, y1, x2, y2) = (n1.position.x, n1.position.y, n2.position.x, n2.position.y);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted = has_highlight && state.is_highlighted(&n1.id) && state.is_highlighted(&n2.id);
		let alpha = match (has_highlight, is_highlighted) {
			(false, _) => 0.85,
			(true, true) => 0.85 + 0.15 * t,
			(true, false) => 0.85 - 0.6 * t,
		};
		let colour = session.edge_colour(edge);

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(&colour.to_hex());
		ctx.set_line_width(edge.stroke_width());
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();

		// sentiment pill at the midpoint, emails sent under it while highlighted
		let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
		let font = 12.0 / k.max(0.5);
		let text = format!("{}", edge.sentiment);
		ctx.set_font(&format!("{font}px sans-serif"));
		let text_width = ctx.measure_text(&text).map(|m| m.width()).unwrap_or(font * 3.0);
		let (pad_x, pad_y) = (font * 0.6, font * 0.5);
		ctx.set_fill_style_str(&colour.to_hex());
		ctx.fill_rect(
			mx - text_width / 2.0 - pad_x,
			my - font / 2.0 - pad_y,
			text_width + pad_x * 2.0,
			font + pad_y * 2.0,
		);
		ctx.set_fill_style_str("white");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(&text, mx, my);

		if is_highlighted && t > 0.01 {
			ctx.set_global_alpha(t);
			ctx.set_font(&format!("{}px sans-serif", font * 0.8));
			let _ = ctx.fill_text(
				&format!("{} emails", edge.emails_sent),
				mx,
				my + font + pad_y * 2.0,
			);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ForceGraphState, graph: &EgoGraph, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
	);

	// dimmed nodes first so highlighted ones paint on top
	for node in &graph.nodes {
		if has_highlight && state.is_highlighted(&node.id) {
			continue;
		}
		let alpha = if has_highlight { 1.0 - 0.6 * t } else { 1.0 };
		draw_node(state, node, NODE_RADIUS, alpha, ctx);
	}

	if !has_highlight {
		return;
	}

	for node in graph.nodes.iter().filter(|n| state.is_highlighted(&n.id)) {
		let is_hovered = state.is_hovered(&node.id);
		let (radius, glow_radius) = if is_hovered {
			(NODE_RADIUS * (1.0 + 0.15 * t), NODE_RADIUS * (1.4 + 0.6 * t))
		} else {
			(NODE_RADIUS * (1.0 + 0.05 * t), NODE_RADIUS * (1.2 + 0.3 * t))
		};
		let (x, y) = (node.position.x, node.position.y);

		if t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.5, x, y, glow_radius) {
				let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		draw_node(state, node, radius, 1.0, ctx);

		if is_hovered && node.activatable && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 3.0 / state.transform.k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / state.transform.k);
			ctx.stroke();
		}
	}
}

fn draw_node(
	state: &ForceGraphState,
	node: &GraphNode,
	radius: f64,
	alpha: f64,
	ctx: &CanvasRenderingContext2d,
) {
	let (x, y) = (node.position.x, node.position.y);
	ctx.set_global_alpha(alpha);
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(if node.id == ANCHOR_ID { ANCHOR_FILL } else { NODE_FILL });
	ctx.fill();
	ctx.set_stroke_style_str("rgba(255, 255, 255, 0.6)");
	ctx.set_line_width(1.0 / state.transform.k.max(0.5));
	ctx.stroke();

	ctx.set_fill_style_str("white");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font(&format!("{}px sans-serif", 11.0 / state.transform.k.max(0.5)));
	let _ = ctx.fill_text_with_max_width(&node.label, x, y, radius * 1.8);
	ctx.set_global_alpha(1.0);
}
