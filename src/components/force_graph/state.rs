use std::collections::HashSet;

use crate::config::{LayoutConfig, Theme};
use crate::graph::GraphSnapshot;
use crate::layout::LayoutEngine;

/// Pointer travel (screen px) below which a press on a node counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
	pub prev_node: Option<String>,
	pub prev_neighbors: HashSet<String>,
	delay_t: f64,
}

/// What the pointer is doing between mousedown and mouseup.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	Pan {
		last_x: f64,
		last_y: f64,
	},
	/// Pressed on a node; becomes a drag once the pointer leaves the slop radius.
	Press {
		id: String,
		start_x: f64,
		start_y: f64,
		dragging: bool,
	},
}

pub struct ForceGraphState {
	pub engine: LayoutEngine,
	pub gesture: Gesture,
	pub hover: HoverState,
	pub theme: Theme,
	pub flow_time: f64,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64, config: LayoutConfig, theme: Theme) -> Self {
		Self {
			engine: LayoutEngine::new(width, height, config),
			gesture: Gesture::Idle,
			hover: HoverState::default(),
			theme,
			flow_time: 0.0,
		}
	}

	pub fn width(&self) -> f64 {
		self.engine.width()
	}

	pub fn height(&self) -> f64 {
		self.engine.height()
	}

	/// Hand a new snapshot to the engine, dropping hover state that no longer applies.
	pub fn load(&mut self, snapshot: &GraphSnapshot) {
		if self.engine.load(snapshot) {
			let stale = |id: &Option<String>| {
				id.as_deref()
					.is_some_and(|id| !snapshot.nodes.iter().any(|n| n.id == id))
			};
			if stale(&self.hover.node) || stale(&self.hover.prev_node) {
				self.hover = HoverState::default();
			}
		}
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.neighbors = node.as_deref().map(|id| self.neighbors_of(id)).unwrap_or_default();
		if node.is_some() && !was_hovering {
			self.hover.delay_t = 0.0;
		}
		self.hover.node = node;
	}

	fn neighbors_of(&self, id: &str) -> HashSet<String> {
		let Some(sim) = self.engine.simulation() else {
			return HashSet::new();
		};
		let Some(idx) = sim.index_of(id) else {
			return HashSet::new();
		};
		let bodies = sim.bodies();
		sim.springs()
			.iter()
			.filter_map(|s| match (s.source == idx, s.target == idx) {
				(true, _) => Some(bodies[s.target].id.clone()),
				(_, true) => Some(bodies[s.source].id.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.is_hovered(id) || self.hover.neighbors.contains(id) || self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.prev_node.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f64) {
		self.engine.step(dt);
		self.flow_time += dt;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	// Pointer gestures, all in canvas-local screen coordinates.

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		self.gesture = match self.engine.node_at_screen(x, y) {
			Some(id) => Gesture::Press {
				id: id.to_owned(),
				start_x: x,
				start_y: y,
				dragging: false,
			},
			None => Gesture::Pan { last_x: x, last_y: y },
		};
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		match &mut self.gesture {
			Gesture::Idle => {
				let hovered = self.engine.node_at_screen(x, y).map(str::to_owned);
				self.set_hover(hovered);
			}
			Gesture::Pan { last_x, last_y } => {
				let (dx, dy) = (x - *last_x, y - *last_y);
				(*last_x, *last_y) = (x, y);
				self.engine.pan_by(dx, dy);
			}
			Gesture::Press {
				id,
				start_x,
				start_y,
				dragging,
			} => {
				if !*dragging && (x - *start_x).hypot(y - *start_y) > CLICK_SLOP {
					*dragging = self.engine.begin_drag(id);
				}
				if *dragging {
					let (wx, wy) = self.engine.screen_to_world(x, y);
					self.engine.drag_to(wx, wy);
				}
			}
		}
	}

	/// Finish the gesture. Returns the node id when it was a click rather than a drag.
	pub fn pointer_up(&mut self) -> Option<String> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Press { id, dragging: false, .. } => Some(id),
			Gesture::Press { dragging: true, .. } => {
				self.engine.end_drag();
				None
			}
			_ => None,
		}
	}

	pub fn pointer_leave(&mut self) {
		if matches!(self.gesture, Gesture::Press { dragging: true, .. }) {
			self.engine.end_drag();
		}
		self.gesture = Gesture::Idle;
		self.set_hover(None);
	}

	/// Wheel notch: zoom about the cursor.
	pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.engine.zoom_at(factor, x, y);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.engine.resize(width, height);
	}
}
