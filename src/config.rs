//! Tuning knobs for the layout engine and the article provider.
//!
//! Graph-size dependent physics constants are not here, see
//! [`crate::layout::PhysicsParams`].

/// Simulation cooling and camera behaviour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Alpha below which the layout counts as settled.
	pub alpha_min: f64,
	/// Fraction of the gap to the alpha target closed each tick.
	pub alpha_decay: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	/// Share of the centroid offset corrected each tick.
	pub center_strength: f64,
	/// Alpha of a freshly seeded or relabeled layout.
	pub initial_alpha: f64,
	/// Alpha after an expansion that kept existing coordinates.
	pub reheat_alpha: f64,
	/// Alpha target held while a node is dragged.
	pub drag_alpha_target: f64,
	/// Lower zoom limit for wheel and transitions.
	pub min_zoom: f64,
	/// Upper zoom limit.
	pub max_zoom: f64,
	/// Node count above which the camera zooms out on its own.
	pub large_graph_threshold: usize,
	/// Scale the auto-fit zooms out to.
	pub fit_scale: f64,
	/// Wait before the auto-fit starts.
	pub fit_delay_secs: f64,
	/// Length of the auto-fit transition.
	pub fit_duration_secs: f64,
	/// Scale of a focus-on-node transition.
	pub focus_scale: f64,
	/// Length of a focus-on-node transition.
	pub focus_duration_secs: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			alpha_min: 0.001,
			// 300 ticks from 1.0 down to alpha_min
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			center_strength: 0.1,
			initial_alpha: 1.0,
			reheat_alpha: 0.5,
			drag_alpha_target: 0.3,
			min_zoom: 0.05,
			max_zoom: 4.0,
			large_graph_threshold: 100,
			fit_scale: 0.2,
			fit_delay_secs: 0.5,
			fit_duration_secs: 2.0,
			focus_scale: 1.2,
			focus_duration_secs: 1.0,
		}
	}
}

/// Where and how the article provider talks to the wiki.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
	/// Registered domain; articles live on `<lang>.<domain>`.
	pub domain: String,
	/// Titles per translation request, capped by the API at 50.
	pub batch_size: usize,
	/// Continuation pages followed when listing outgoing links.
	pub max_link_pages: usize,
}

impl Default for ProviderConfig {
	fn default() -> Self {
		Self {
			domain: "wikipedia.org".into(),
			batch_size: 50,
			max_link_pages: 20,
		}
	}
}

/// Presentation colours; has no effect on physics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
	/// Light background, dark text.
	#[default]
	Light,
	/// Dark background, light text.
	Dark,
}

impl Theme {
	/// Theme for a dark-mode flag.
	pub fn from_dark(dark: bool) -> Self {
		if dark { Self::Dark } else { Self::Light }
	}

	/// Whether this is [`Theme::Dark`].
	pub fn is_dark(self) -> bool {
		self == Self::Dark
	}
}
