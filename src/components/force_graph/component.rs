use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::ev;
use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::ForceGraphState;
use crate::config::{LayoutConfig, Theme};
use crate::graph::GraphSnapshot;

const FRAME_DT: f64 = 1.0 / 60.0;

type Shared<T> = Rc<RefCell<Option<T>>>;

fn window_size() -> Option<(f64, f64)> {
	let window = web_sys::window()?;
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Pointer position relative to the canvas' top-left corner.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Force-directed bubble view of a graph snapshot.
///
/// Owns the layout engine and its frame loop. A new snapshot revision is
/// loaded on the next reactive run; `focus` centres the camera on a node id;
/// a press on a bubble without dragging is reported through `on_node_click`.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphSnapshot>,
	#[prop(into, default = Signal::stored(false))] dark: Signal<bool>,
	#[prop(into, default = Signal::stored(None))] focus: Signal<Option<String>>,
	#[prop(optional)] on_node_click: Option<Callback<String>>,
	#[prop(default = LayoutConfig::default())] config: LayoutConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<ForceGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let disposed = Arc::new(AtomicBool::new(false));

	on_cleanup({
		let disposed = disposed.clone();
		move || disposed.store(true, Ordering::Relaxed)
	});

	let (state_init, animate_init, disposed_init) = (state.clone(), animate.clone(), disposed.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();

		let (w, h) = if fullscreen {
			window_size().unwrap_or((800.0, 600.0))
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
				height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		let Some(ctx) = ctx else {
			error!("canvas has no 2d context; graph will not be drawn");
			return;
		};

		let mut initial = ForceGraphState::new(w, h, config, Theme::from_dark(dark.get_untracked()));
		initial.load(&data.get_untracked());
		*state_init.borrow_mut() = Some(initial);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			let handle = window_event_listener(ev::resize, move |_| {
				let Some((nw, nh)) = window_size() else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(s) = state_resize.borrow_mut().as_mut() {
					s.resize(nw, nh);
				}
			});
			on_cleanup(move || handle.remove());
		}

		let (state_anim, animate_inner, disposed_anim) =
			(state_init.clone(), animate_init.clone(), disposed_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if disposed_anim.load(Ordering::Relaxed) {
				if let Some(s) = state_anim.borrow_mut().as_mut() {
					s.engine.dispose();
				}
				state_anim.borrow_mut().take();
				// The closure cannot drop itself while running; release it from the task queue.
				let cell = animate_inner.clone();
				wasm_bindgen_futures::spawn_local(async move {
					cell.borrow_mut().take();
				});
				debug!("force graph frame loop stopped");
				return;
			}
			if let Some(s) = state_anim.borrow_mut().as_mut() {
				s.tick(FRAME_DT);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let (Some(cb), Some(window)) = (animate_init.borrow().as_ref(), web_sys::window()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_data = state.clone();
	Effect::new(move |_| {
		let snapshot = data.get();
		if let Some(s) = state_data.borrow_mut().as_mut() {
			s.load(&snapshot);
		}
	});

	let state_theme = state.clone();
	Effect::new(move |_| {
		let theme = Theme::from_dark(dark.get());
		if let Some(s) = state_theme.borrow_mut().as_mut() {
			s.theme = theme;
		}
	});

	let state_focus = state.clone();
	Effect::new(move |_| {
		let Some(id) = focus.get() else {
			return;
		};
		if let Some(s) = state_focus.borrow_mut().as_mut() {
			s.engine.focus_on_node(&id);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_md.borrow_mut().as_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_mm.borrow_mut().as_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let clicked = state_mu.borrow_mut().as_mut().and_then(ForceGraphState::pointer_up);
		if let (Some(id), Some(callback)) = (clicked, on_node_click) {
			callback.run(id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(s) = state_ml.borrow_mut().as_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_wh.borrow_mut().as_mut() {
			s.wheel(ev.delta_y(), x, y);
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
			style="display: block; cursor: grab;"
		/>
	}
}
