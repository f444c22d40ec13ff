use log::{debug, info};

use crate::config::LayoutConfig;
use crate::graph::GraphSnapshot;

use super::camera::{Camera, ViewTransform};
use super::simulation::Simulation;

/// Lifecycle of one layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
	/// No graph loaded yet, or the last load was empty.
	Uninitialized,
	/// Simulating and drawing a graph.
	Running,
	/// Torn down for good. Every call is a no-op from here on.
	Disposed,
}

/// Simulation plus camera, driven one frame at a time by its owner.
///
/// `step` must not be called concurrently; the owner's frame loop is the only
/// writer of layout state apart from drag gestures, which go through
/// [`LayoutEngine::begin_drag`] and friends.
#[derive(Debug)]
pub struct LayoutEngine {
	state: EngineState,
	config: LayoutConfig,
	simulation: Option<Simulation>,
	camera: Camera,
	width: f64,
	height: f64,
	loaded: Option<(u64, u64)>,
	dragging: Option<String>,
}

impl LayoutEngine {
	/// Idle engine for a viewport of the given size.
	pub fn new(width: f64, height: f64, config: LayoutConfig) -> Self {
		Self {
			state: EngineState::Uninitialized,
			camera: Camera::new(width, height, config.min_zoom, config.max_zoom),
			config,
			simulation: None,
			width,
			height,
			loaded: None,
			dragging: None,
		}
	}

	/// Where the engine is in its lifecycle.
	pub fn state(&self) -> EngineState {
		self.state
	}

	/// Whether a graph is loaded and not disposed.
	pub fn is_running(&self) -> bool {
		self.state == EngineState::Running
	}

	fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// (Re)initialise from a store snapshot.
	///
	/// Snapshots already loaded are ignored. Within the same epoch the previous
	/// coordinates are carried over by id; a new epoch starts from scratch with
	/// the camera back at the identity view. An empty snapshot tears the layout
	/// down and leaves the engine waiting for the next seed.
	/// Returns whether the layout changed.
	pub fn load(&mut self, snapshot: &GraphSnapshot) -> bool {
		if self.state == EngineState::Disposed {
			debug!("load of revision {} after dispose ignored", snapshot.revision);
			return false;
		}
		if self.loaded == Some((snapshot.revision, snapshot.epoch)) {
			return false;
		}

		let carry = self.loaded.map(|(_, epoch)| epoch) == Some(snapshot.epoch);
		if !carry || snapshot.is_empty() {
			self.camera.set_transform(ViewTransform::IDENTITY);
			self.dragging = None;
		}
		if snapshot.is_empty() {
			info!("layout cleared");
			self.simulation = None;
			self.loaded = Some((snapshot.revision, snapshot.epoch));
			self.state = EngineState::Uninitialized;
			return true;
		}

		let previous = self.simulation.as_ref().filter(|_| carry);
		let previous_len = previous.map_or(0, Simulation::len);
		let simulation = Simulation::new(snapshot, self.center(), &self.config, previous);

		let params = simulation.params();
		info!(
			"layout loaded {} nodes, {} links (distance {:.1}, charge {:.1}, carried: {carry})",
			simulation.len(),
			simulation.springs().len(),
			params.link_distance,
			params.charge_strength,
		);

		let threshold = self.config.large_graph_threshold;
		if simulation.len() > threshold && previous_len <= threshold {
			self.fit_to_view();
		}

		self.simulation = Some(simulation);
		self.loaded = Some((snapshot.revision, snapshot.epoch));
		self.state = EngineState::Running;
		true
	}

	/// One frame: a physics step and `dt` seconds of camera transition.
	/// Returns `false` when nothing ran because the engine is not running.
	pub fn step(&mut self, dt: f64) -> bool {
		if self.state != EngineState::Running {
			return false;
		}
		if let Some(sim) = self.simulation.as_mut() {
			sim.tick();
		}
		self.camera.tick(dt);
		true
	}

	/// Stop for good. Safe to call repeatedly; cancels any camera transition.
	pub fn dispose(&mut self) {
		if self.state == EngineState::Disposed {
			return;
		}
		debug!("layout engine disposed");
		self.state = EngineState::Disposed;
		self.camera.cancel();
		self.dragging = None;
	}

	/// Track a new viewport size. The centering force follows the new centre.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.camera.resize(width, height);
		let center = self.center();
		if let Some(sim) = self.simulation.as_mut() {
			sim.set_center(center);
		}
	}

	// Camera

	/// Zoom out to the configured overview scale after the settling delay.
	pub fn fit_to_view(&mut self) {
		let (cx, cy) = self.center();
		let target = ViewTransform::centered_on(cx, cy, self.config.fit_scale, self.width, self.height);
		debug!("scheduling fit-to-view at scale {}", self.config.fit_scale);
		self.camera.transition_to(
			target,
			self.config.fit_delay_secs,
			self.config.fit_duration_secs,
		);
	}

	/// Centre `id` at the focus scale. No-op when the node is unknown or unplaced.
	pub fn focus_on_node(&mut self, id: &str) -> bool {
		if self.state != EngineState::Running {
			return false;
		}
		let Some((x, y)) = self.simulation.as_ref().and_then(|s| s.position(id)) else {
			debug!("focus on {id:?} skipped: no resolved position");
			return false;
		};
		let target = ViewTransform::centered_on(x, y, self.config.focus_scale, self.width, self.height);
		self.camera
			.transition_to(target, 0.0, self.config.focus_duration_secs);
		true
	}

	/// Zoom by `factor` keeping the screen point under the cursor fixed.
	/// Cancels any running camera transition.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		if self.state != EngineState::Disposed {
			self.camera.zoom_at(factor, sx, sy);
		}
	}

	/// Pan by a screen-space delta. Cancels any running camera transition.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		if self.state != EngineState::Disposed {
			self.camera.pan_by(dx, dy);
		}
	}

	/// Current world-to-screen transform.
	pub fn transform(&self) -> ViewTransform {
		self.camera.transform()
	}

	/// The camera, for inspecting pending transitions.
	pub fn camera(&self) -> &Camera {
		&self.camera
	}

	// Drag

	/// Pin `id` where it is and reheat so the rest relaxes around it.
	pub fn begin_drag(&mut self, id: &str) -> bool {
		if self.state != EngineState::Running {
			return false;
		}
		let target = self.config.drag_alpha_target;
		let Some(sim) = self.simulation.as_mut() else {
			return false;
		};
		let Some((x, y)) = sim.position(id) else {
			return false;
		};
		sim.pin(id, x, y);
		sim.set_alpha_target(target);
		self.dragging = Some(id.to_owned());
		true
	}

	/// Move the dragged node's pin to a world coordinate.
	pub fn drag_to(&mut self, x: f64, y: f64) {
		let (Some(id), Some(sim)) = (self.dragging.as_deref(), self.simulation.as_mut()) else {
			return;
		};
		sim.pin(id, x, y);
	}

	/// Release the pin and let physics take the node back.
	pub fn end_drag(&mut self) {
		let Some(id) = self.dragging.take() else {
			return;
		};
		if let Some(sim) = self.simulation.as_mut() {
			sim.unpin(&id);
			sim.set_alpha_target(0.0);
		}
	}

	/// Id of the node currently pinned by a drag.
	pub fn dragging(&self) -> Option<&str> {
		self.dragging.as_deref()
	}

	// Queries

	/// The running simulation, if a non-empty graph is loaded.
	pub fn simulation(&self) -> Option<&Simulation> {
		self.simulation.as_ref()
	}

	/// Id of the node under a screen coordinate.
	pub fn node_at_screen(&self, sx: f64, sy: f64) -> Option<&str> {
		let sim = self.simulation.as_ref()?;
		let (wx, wy) = self.camera.transform().to_world(sx, sy);
		sim.node_at(wx, wy).map(|i| sim.bodies()[i].id.as_str())
	}

	/// Screen point under the current transform, in world coordinates.
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.camera.transform().to_world(sx, sy)
	}

	/// Viewport width in CSS pixels.
	pub fn width(&self) -> f64 {
		self.width
	}

	/// Viewport height in CSS pixels.
	pub fn height(&self) -> f64 {
		self.height
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::graph::GraphStore;

	fn einstein() -> GraphStore {
		let mut store = GraphStore::new();
		store.seed("Albert Einstein", ["Physics", "Nobel Prize", "Germany"]);
		store
	}

	fn engine() -> LayoutEngine {
		LayoutEngine::new(800.0, 600.0, LayoutConfig::default())
	}

	#[test]
	fn first_snapshot_starts_running() {
		let mut engine = engine();
		assert_eq!(engine.state(), EngineState::Uninitialized);
		assert!(!engine.step(0.016));
		assert!(engine.load(&einstein().snapshot()));
		assert_eq!(engine.state(), EngineState::Running);
		assert!(engine.step(0.016));
	}

	#[test]
	fn same_revision_is_not_reloaded() {
		let store = einstein();
		let mut engine = engine();
		assert!(engine.load(&store.snapshot()));
		assert!(!engine.load(&store.snapshot()));
	}

	#[test]
	fn expand_carries_positions_but_relabel_does_not() {
		let mut store = einstein();
		let mut engine = engine();
		engine.load(&store.snapshot());
		for _ in 0..40 {
			engine.step(0.016);
		}
		let germany = engine.simulation().unwrap().position("Germany");

		store.expand("Physics", ["Quantum Mechanics"]);
		assert!(engine.load(&store.snapshot()));
		assert_eq!(engine.simulation().unwrap().position("Germany"), germany);

		store.relabel(&HashMap::from([("Physics".to_string(), "Physique".to_string())]));
		assert!(engine.load(&store.snapshot()));
		assert_ne!(engine.simulation().unwrap().position("Germany"), germany);
		assert!(engine.simulation().unwrap().position("Physics").is_none());
	}

	#[test]
	fn dispose_is_idempotent_and_final() {
		let store = einstein();
		let mut engine = engine();
		engine.load(&store.snapshot());
		engine.focus_on_node("Physics");
		engine.dispose();
		engine.dispose();
		assert_eq!(engine.state(), EngineState::Disposed);

		let before: Vec<_> = engine
			.simulation()
			.unwrap()
			.bodies()
			.iter()
			.map(|b| (b.x, b.y))
			.collect();
		let transform = engine.transform();
		assert!(!engine.step(0.5));
		let after: Vec<_> = engine
			.simulation()
			.unwrap()
			.bodies()
			.iter()
			.map(|b| (b.x, b.y))
			.collect();
		assert_eq!(before, after);
		assert_eq!(engine.transform(), transform);
		assert!(!engine.camera().is_animating());
		assert!(!engine.load(&GraphStore::new().snapshot()));
	}

	#[test]
	fn focus_on_unknown_node_is_noop() {
		let mut engine = engine();
		engine.load(&einstein().snapshot());
		let before = engine.transform();
		assert!(!engine.focus_on_node("Unknown Title"));
		engine.step(1.0);
		assert_eq!(engine.transform(), before);
	}

	#[test]
	fn focus_centres_the_node() {
		let mut engine = engine();
		engine.load(&einstein().snapshot());
		assert!(engine.focus_on_node("Physics"));
		// The node keeps moving while the camera flies, so pin it for a stable target.
		let (x, y) = engine.simulation().unwrap().position("Physics").unwrap();
		engine.begin_drag("Physics");
		for _ in 0..100 {
			engine.step(0.016);
		}
		let t = engine.transform();
		assert!((t.k - 1.2).abs() < 1e-9);
		let (sx, sy) = t.to_screen(x, y);
		assert!((sx - 400.0).abs() < 1e-6 && (sy - 300.0).abs() < 1e-6);
	}

	#[test]
	fn large_graph_zooms_out_after_delay() {
		let titles: Vec<String> = (0..150).map(|i| format!("Article {i}")).collect();
		let mut store = GraphStore::new();
		store.seed("Root", &titles);
		let mut engine = engine();
		engine.load(&store.snapshot());
		assert!(engine.camera().is_animating());
		engine.step(0.3);
		assert_eq!(engine.transform(), ViewTransform::IDENTITY);
		for _ in 0..200 {
			engine.step(0.016);
		}
		let t = engine.transform();
		assert!((t.k - 0.2).abs() < 1e-9);
		assert!((t.x - 320.0).abs() < 1e-6 && (t.y - 240.0).abs() < 1e-6);
	}

	#[test]
	fn small_graph_keeps_camera_still() {
		let mut engine = engine();
		engine.load(&einstein().snapshot());
		assert!(!engine.camera().is_animating());
	}

	fn articles(range: std::ops::Range<usize>) -> Vec<String> {
		range.map(|i| format!("Article {i}")).collect()
	}

	#[test]
	fn clear_cancels_pending_fit_and_reseed_starts_unzoomed() {
		let mut store = GraphStore::new();
		store.seed("Root", articles(0..150));
		let mut engine = engine();
		engine.load(&store.snapshot());
		engine.step(0.1);
		assert!(engine.camera().is_animating());

		store.clear();
		assert!(engine.load(&store.snapshot()));
		assert_eq!(engine.state(), EngineState::Uninitialized);
		assert!(engine.simulation().is_none());
		assert!(!engine.camera().is_animating());
		for _ in 0..200 {
			assert!(!engine.step(0.016));
		}
		assert_eq!(engine.transform(), ViewTransform::IDENTITY);

		store.seed("Albert Einstein", ["Physics", "Germany"]);
		assert!(engine.load(&store.snapshot()));
		assert_eq!(engine.state(), EngineState::Running);
		assert!(!engine.camera().is_animating());
		assert_eq!(engine.transform().k, 1.0);
	}

	#[test]
	fn relabel_resets_the_view() {
		let mut store = einstein();
		let mut engine = engine();
		engine.load(&store.snapshot());
		engine.zoom_at(2.0, 100.0, 100.0);
		assert_ne!(engine.transform(), ViewTransform::IDENTITY);

		store.relabel(&HashMap::from([("Physics".to_string(), "Physique".to_string())]));
		engine.load(&store.snapshot());
		assert_eq!(engine.transform(), ViewTransform::IDENTITY);
	}

	#[test]
	fn expansion_past_threshold_fits_once() {
		let mut store = GraphStore::new();
		store.seed("Root", articles(0..90));
		let mut engine = engine();
		engine.load(&store.snapshot());
		assert!(!engine.camera().is_animating());

		store.expand("Article 0", articles(90..110));
		assert!(store.graph().len() > 100);
		engine.load(&store.snapshot());
		assert!(engine.camera().is_animating());
		for _ in 0..200 {
			engine.step(0.016);
		}
		assert!(!engine.camera().is_animating());
		assert!((engine.transform().k - 0.2).abs() < 1e-9);

		// Already above the threshold: a further expansion leaves the camera alone.
		engine.zoom_at(2.0, 400.0, 300.0);
		let zoomed = engine.transform();
		store.expand("Article 1", articles(110..115));
		engine.load(&store.snapshot());
		assert!(!engine.camera().is_animating());
		assert_eq!(engine.transform(), zoomed);
	}

	#[test]
	fn drag_pins_then_releases() {
		let mut engine = engine();
		engine.load(&einstein().snapshot());
		assert!(engine.begin_drag("Germany"));
		engine.drag_to(-200.0, -200.0);
		engine.step(0.016);
		assert_eq!(engine.simulation().unwrap().position("Germany"), Some((-200.0, -200.0)));
		engine.end_drag();
		assert!(engine.dragging().is_none());
		assert!(engine.simulation().unwrap().body("Germany").unwrap().pin.is_none());
		assert!(!engine.begin_drag("Unknown Title"));
	}
}
