use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::config::Theme;
use crate::graph::ROOT_WEIGHT;
use crate::layout::{Body, Spring};

use super::state::ForceGraphState;

/// Longest label drawn in full; longer titles are cut with an ellipsis.
const MAX_LABEL_CHARS: usize = 22;

struct Palette {
	background: &'static str,
	/// `r, g, b` triple, alpha is applied per edge.
	edge: &'static str,
	root: &'static str,
	node: &'static str,
	label: &'static str,
	ring: &'static str,
}

fn palette(theme: Theme) -> Palette {
	match theme {
		Theme::Light => Palette {
			background: "#f7f7f2",
			edge: "90, 110, 140",
			root: "#e07a5f",
			node: "#81b29a",
			label: "#1d1d1f",
			ring: "0, 0, 0",
		},
		Theme::Dark => Palette {
			background: "#1a1a2e",
			edge: "100, 180, 255",
			root: "#f2a65a",
			node: "#3d5a80",
			label: "#f0f0f0",
			ring: "255, 255, 255",
		},
	}
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn short_label(title: &str) -> String {
	if title.chars().count() <= MAX_LABEL_CHARS {
		return title.to_owned();
	}
	let cut: String = title.chars().take(MAX_LABEL_CHARS - 1).collect();
	format!("{}…", cut.trim_end())
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let colors = palette(state.theme);
	ctx.set_fill_style_str(colors.background);
	ctx.fill_rect(0.0, 0.0, state.width(), state.height());

	let Some(sim) = state.engine.simulation() else {
		return;
	};
	let view = state.engine.transform();
	ctx.save();
	let _ = ctx.translate(view.x, view.y);
	let _ = ctx.scale(view.k, view.k);
	draw_edges(state, ctx, &colors, sim.bodies(), sim.springs());
	draw_nodes(state, ctx, &colors, sim.bodies());
	ctx.restore();
}

fn draw_edges(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	colors: &Palette,
	bodies: &[Body],
	springs: &[Spring],
) {
	let k = state.engine.transform().k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	for spring in springs {
		let (a, b) = (&bodies[spring.source], &bodies[spring.target]);
		if !a.is_placed() || !b.is_placed() {
			continue;
		}
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist <= a.radius() + b.radius() {
			continue;
		}

		// Highlighted edges brighten as `t` rises, the rest fade.
		let lit = state.is_highlighted(&a.id) && state.is_highlighted(&b.id);
		let (edge_alpha, arrow_alpha, width) = if lit {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};

		ctx.set_stroke_style_str(&format!("rgba({}, {})", colors.edge, edge_alpha));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(a.x + ux * a.radius(), a.y + uy * a.radius());
		ctx.line_to(
			b.x - ux * (b.radius() + arrow_size),
			b.y - uy * (b.radius() + arrow_size),
		);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba({}, {})", colors.edge, arrow_alpha));
		let (tip_x, tip_y) = (b.x - ux * b.radius(), b.y - uy * b.radius());
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, colors: &Palette, bodies: &[Body]) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.engine.transform().k,
	);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	// Dimmed bubbles first so highlighted ones sit on top.
	for body in bodies.iter().filter(|b| b.is_placed()) {
		if has_highlight && state.is_highlighted(&body.id) {
			continue;
		}
		let alpha = if has_highlight { 1.0 - 0.7 * t } else { 1.0 };
		let radius = if has_highlight {
			body.radius() * (1.0 - 0.15 * t)
		} else {
			body.radius()
		};
		ctx.set_global_alpha(alpha);
		draw_bubble(ctx, colors, body, radius, k);
		ctx.set_global_alpha(1.0);
	}

	if !has_highlight {
		return;
	}

	for body in bodies.iter().filter(|b| b.is_placed()) {
		if !state.is_highlighted(&body.id) {
			continue;
		}
		let (x, y) = (body.x, body.y);
		let hovered = state.is_hovered(&body.id);
		let (radius, glow_radius) = if hovered {
			(body.radius() * (1.0 + 0.2 * t), body.radius() * (1.3 + 0.5 * t))
		} else {
			(body.radius() * (1.0 + 0.1 * t), body.radius() * (1.1 + 0.3 * t))
		};

		if t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) {
				let alpha = if hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba({}, {})", colors.ring, alpha));
				let _ = gradient.add_color_stop(1.0, &format!("rgba({}, 0)", colors.ring));
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		draw_bubble(ctx, colors, body, radius, k);

		if hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba({}, {})", colors.ring, 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}
	}
}

fn draw_bubble(ctx: &CanvasRenderingContext2d, colors: &Palette, body: &Body, radius: f64, k: f64) {
	ctx.begin_path();
	let _ = ctx.arc(body.x, body.y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(if body.weight >= ROOT_WEIGHT { colors.root } else { colors.node });
	ctx.fill();

	// Keep labels readable when zoomed far out.
	let font_px = (11.0 / k.max(0.5)).min(radius * 0.6);
	ctx.set_fill_style_str(colors.label);
	ctx.set_font(&format!("{font_px}px sans-serif"));
	let _ = ctx.fill_text(&short_label(&body.id), body.x, body.y + radius + font_px);
}
