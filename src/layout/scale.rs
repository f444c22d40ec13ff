//! Physics constants derived from graph size.
//!
//! These are recomputed from the node count every time the simulation is
//! (re)initialised and never mutated in between.

/// Shortest and longest rest length of a link.
pub const LINK_DISTANCE_RANGE: (f64, f64) = (100.0, 600.0);
/// Strongest and weakest many-body charge (negative repels).
pub const CHARGE_RANGE: (f64, f64) = (-2000.0, -300.0);
/// Minimum centre-to-centre half distance enforced between bubbles.
pub const COLLISION_RADIUS: f64 = 40.0;
/// Relaxation passes of the collision constraint per tick.
pub const COLLISION_ITERATIONS: usize = 2;

/// Link rest length for a graph of `n` nodes: `clamp(100 + 0.8n, 100, 600)`.
pub fn link_distance(n: usize) -> f64 {
	(100.0 + 0.8 * n as f64).clamp(LINK_DISTANCE_RANGE.0, LINK_DISTANCE_RANGE.1)
}

/// Many-body strength for a graph of `n` nodes: `clamp(-300 - 3n, -2000, -300)`.
pub fn charge_strength(n: usize) -> f64 {
	(-300.0 - 3.0 * n as f64).clamp(CHARGE_RANGE.0, CHARGE_RANGE.1)
}

/// Full parameter set for one simulation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
	/// Rest length of every link.
	pub link_distance: f64,
	/// Many-body strength, negative.
	pub charge_strength: f64,
	/// See [`COLLISION_RADIUS`].
	pub collision_radius: f64,
	/// See [`COLLISION_ITERATIONS`].
	pub collision_iterations: usize,
}

impl PhysicsParams {
	/// Parameters for a graph of `n` nodes.
	pub fn for_node_count(n: usize) -> Self {
		Self {
			link_distance: link_distance(n),
			charge_strength: charge_strength(n),
			collision_radius: COLLISION_RADIUS,
			collision_iterations: COLLISION_ITERATIONS,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn small_graphs_use_lower_bounds() {
		let p = PhysicsParams::for_node_count(0);
		assert_eq!(p.link_distance, 100.0);
		assert_eq!(p.charge_strength, -300.0);
		assert_eq!(p.collision_radius, 40.0);
		assert!(p.collision_iterations >= 2);
	}

	#[test]
	fn mid_sized_graphs_scale_linearly() {
		assert!((link_distance(100) - 180.0).abs() < 1e-9);
		assert!((charge_strength(100) - -600.0).abs() < 1e-9);
	}

	#[test]
	fn large_graphs_are_clamped() {
		assert_eq!(link_distance(625), 600.0);
		assert_eq!(link_distance(10_000), 600.0);
		assert_eq!(charge_strength(567), -2000.0);
		assert_eq!(charge_strength(100_000), -2000.0);
	}

	#[test]
	fn bounds_hold_for_any_count() {
		for n in (0..5000).step_by(7) {
			let p = PhysicsParams::for_node_count(n);
			assert!((100.0..=600.0).contains(&p.link_distance), "n={n}");
			assert!((-2000.0..=-300.0).contains(&p.charge_strength), "n={n}");
		}
	}
}
