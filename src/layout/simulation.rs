use std::collections::HashMap;
use std::f64::consts::PI;

use crate::config::LayoutConfig;
use crate::graph::GraphSnapshot;

use super::forces::{self, Jiggle};
use super::scale::PhysicsParams;

/// Seed for the coincident-node jiggle so runs are reproducible.
const JIGGLE_SEED: u64 = 0x5eed;
/// Spacing of the phyllotaxis spiral new nodes start on.
const INITIAL_RADIUS: f64 = 10.0;

/// Drawn bubble radius for a node weight.
///
/// Collision keeps centres at least twice the collision radius (80) apart.
/// Only the root has weight 2, so two bubbles never need more than 42 + 30.
pub fn bubble_radius(weight: u8) -> f64 {
	18.0 + 12.0 * weight.min(2) as f64
}

/// One simulated node. Owned by the simulation arena, never by the graph store.
#[derive(Clone, Debug)]
pub struct Body {
	/// Graph node id.
	pub id: String,
	/// Node weight, sets the bubble size.
	pub weight: u8,
	/// World x; NaN until placed.
	pub x: f64,
	/// World y; NaN until placed.
	pub y: f64,
	/// Velocity carried into the next tick.
	pub vx: f64,
	/// See `vx`.
	pub vy: f64,
	/// Fixed coordinate while the user drags this node.
	pub pin: Option<(f64, f64)>,
}

impl Body {
	/// Unplaced body at rest.
	pub fn new(id: impl Into<String>, weight: u8) -> Self {
		Self {
			id: id.into(),
			weight,
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			pin: None,
		}
	}

	/// Drawn and hit-tested radius.
	pub fn radius(&self) -> f64 {
		bubble_radius(self.weight)
	}

	/// Whether both coordinates are finite.
	pub fn is_placed(&self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

/// A link resolved to arena indices, valid for one simulation only.
#[derive(Clone, Copy, Debug)]
pub struct Spring {
	/// Index of the linking body.
	pub source: usize,
	/// Index of the linked body.
	pub target: usize,
	/// `1 / min(degree)` of the two ends.
	pub strength: f64,
	/// Share of the correction applied to the target; the source takes the rest.
	pub bias: f64,
}

/// Working copy of one graph snapshot with positions and velocities.
#[derive(Clone, Debug)]
pub struct Simulation {
	bodies: Vec<Body>,
	index: HashMap<String, usize>,
	springs: Vec<Spring>,
	params: PhysicsParams,
	config: LayoutConfig,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	jiggle: Jiggle,
}

impl Simulation {
	/// Build the arena for `snapshot`.
	///
	/// When `previous` is given, bodies whose id already existed keep their
	/// coordinate, velocity and pin. Everything else starts on a spiral around
	/// `center`.
	pub fn new(
		snapshot: &GraphSnapshot,
		center: (f64, f64),
		config: &LayoutConfig,
		previous: Option<&Simulation>,
	) -> Self {
		let mut bodies = Vec::with_capacity(snapshot.nodes.len());
		let mut index = HashMap::with_capacity(snapshot.nodes.len());
		for node in &snapshot.nodes {
			if index.contains_key(&node.id) {
				continue;
			}
			let mut body = Body::new(node.id.clone(), node.weight);
			if let Some(old) = previous.and_then(|p| p.body(&node.id)) {
				if old.is_placed() {
					body.x = old.x;
					body.y = old.y;
					body.vx = old.vx;
					body.vy = old.vy;
					body.pin = old.pin;
				}
			}
			index.insert(node.id.clone(), bodies.len());
			bodies.push(body);
		}

		let angle_step = PI * (3.0 - 5.0_f64.sqrt());
		for (i, body) in bodies.iter_mut().enumerate() {
			if body.is_placed() {
				continue;
			}
			let (radius, angle) = (INITIAL_RADIUS * (0.5 + i as f64).sqrt(), i as f64 * angle_step);
			body.x = center.0 + radius * angle.cos();
			body.y = center.1 + radius * angle.sin();
		}

		let resolved: Vec<(usize, usize)> = snapshot
			.links
			.iter()
			.filter_map(|l| Some((*index.get(&l.source)?, *index.get(&l.target)?)))
			.filter(|(s, t)| s != t)
			.collect();
		let mut degree = vec![0usize; bodies.len()];
		for &(s, t) in &resolved {
			degree[s] += 1;
			degree[t] += 1;
		}
		let springs = resolved
			.into_iter()
			.map(|(s, t)| Spring {
				source: s,
				target: t,
				strength: 1.0 / degree[s].min(degree[t]) as f64,
				bias: degree[s] as f64 / (degree[s] + degree[t]) as f64,
			})
			.collect();

		let alpha = if previous.is_some() {
			config.reheat_alpha
		} else {
			config.initial_alpha
		};

		Self {
			params: PhysicsParams::for_node_count(bodies.len()),
			bodies,
			index,
			springs,
			config: *config,
			center,
			alpha,
			alpha_target: 0.0,
			jiggle: Jiggle::new(JIGGLE_SEED),
		}
	}

	/// Advance one step. Returns `false` once the layout has cooled down.
	pub fn tick(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		let (params, alpha) = (self.params, self.alpha);
		forces::apply_links(
			&mut self.bodies,
			&self.springs,
			params.link_distance,
			alpha,
			&mut self.jiggle,
		);
		forces::apply_many_body(&mut self.bodies, params.charge_strength, alpha, &mut self.jiggle);
		forces::apply_center(&mut self.bodies, self.center, self.config.center_strength);
		forces::apply_collide(
			&mut self.bodies,
			params.collision_radius,
			params.collision_iterations,
			&mut self.jiggle,
		);

		let keep = 1.0 - self.config.velocity_decay;
		for body in &mut self.bodies {
			match body.pin {
				Some((px, py)) => {
					body.x = px;
					body.y = py;
					body.vx = 0.0;
					body.vy = 0.0;
				}
				None => {
					body.vx *= keep;
					body.vy *= keep;
					body.x += body.vx;
					body.y += body.vy;
				}
			}
		}
		true
	}

	/// Cooled below `alpha_min` with nothing holding it warm.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
	}

	/// Current temperature.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Temperature alpha decays towards.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Size-derived constants this run was built with.
	pub fn params(&self) -> PhysicsParams {
		self.params
	}

	/// World point the centering force pulls towards.
	pub fn set_center(&mut self, center: (f64, f64)) {
		self.center = center;
	}

	/// Fix `id` at the given world coordinate. Returns `false` for unknown ids.
	pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
		match self.body_mut(id) {
			Some(body) => {
				body.pin = Some((x, y));
				true
			}
			None => false,
		}
	}

	/// Hand `id` back to the forces.
	pub fn unpin(&mut self, id: &str) {
		if let Some(body) = self.body_mut(id) {
			body.pin = None;
		}
	}

	/// Resolved world coordinate of `id`, if it has one.
	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		self.body(id)
			.filter(|b| b.is_placed())
			.map(|b| (b.x, b.y))
	}

	/// Topmost body under a world coordinate.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		self.bodies.iter().rposition(|b| {
			let (dx, dy) = (b.x - x, b.y - y);
			dx * dx + dy * dy <= b.radius() * b.radius()
		})
	}

	/// Arena index of a node id.
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Body for a node id.
	pub fn body(&self, id: &str) -> Option<&Body> {
		self.index.get(id).map(|&i| &self.bodies[i])
	}

	fn body_mut(&mut self, id: &str) -> Option<&mut Body> {
		self.index.get(id).copied().map(|i| &mut self.bodies[i])
	}

	/// Bodies in snapshot order.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// One spring per graph link.
	pub fn springs(&self) -> &[Spring] {
		&self.springs
	}

	/// Number of bodies.
	pub fn len(&self) -> usize {
		self.bodies.len()
	}

	/// Whether there are no bodies.
	pub fn is_empty(&self) -> bool {
		self.bodies.is_empty()
	}
}
