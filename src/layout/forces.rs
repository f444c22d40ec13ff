//! The four forces, applied to the simulation arena in place.
//!
//! Link, many-body and collision forces write into velocities; centering
//! shifts positions directly.

use super::simulation::{Body, Spring};

/// Squared distance below which many-body falloff stops growing.
const DISTANCE_MIN2: f64 = 1.0;

/// Deterministic tiny perturbation for coincident nodes.
#[derive(Clone, Debug)]
pub struct Jiggle(u64);

impl Jiggle {
	const A: u64 = 1_664_525;
	const C: u64 = 1_013_904_223;
	const M: u64 = 4_294_967_296;

	/// Sequence starting from `seed`.
	pub fn new(seed: u64) -> Self {
		Self(seed % Self::M)
	}

	/// Next offset, within `±5e-7`.
	pub fn next(&mut self) -> f64 {
		self.0 = (Self::A * self.0 + Self::C) % Self::M;
		(self.0 as f64 / Self::M as f64 - 0.5) * 1e-6
	}
}

/// Pull every linked pair towards `distance`, split by endpoint degree.
pub fn apply_links(
	bodies: &mut [Body],
	springs: &[Spring],
	distance: f64,
	alpha: f64,
	jiggle: &mut Jiggle,
) {
	for spring in springs {
		let (s, t) = (&bodies[spring.source], &bodies[spring.target]);
		let mut dx = t.x + t.vx - s.x - s.vx;
		let mut dy = t.y + t.vy - s.y - s.vy;
		if dx == 0.0 {
			dx = jiggle.next();
		}
		if dy == 0.0 {
			dy = jiggle.next();
		}
		let len = (dx * dx + dy * dy).sqrt();
		let l = (len - distance) / len * alpha * spring.strength;
		let (fx, fy) = (dx * l, dy * l);

		let target = &mut bodies[spring.target];
		target.vx -= fx * spring.bias;
		target.vy -= fy * spring.bias;
		let source = &mut bodies[spring.source];
		source.vx += fx * (1.0 - spring.bias);
		source.vy += fy * (1.0 - spring.bias);
	}
}

/// Pairwise charge with inverse distance falloff. Negative strength repels.
pub fn apply_many_body(bodies: &mut [Body], strength: f64, alpha: f64, jiggle: &mut Jiggle) {
	let n = bodies.len();
	for i in 0..n {
		for j in (i + 1)..n {
			let mut dx = bodies[j].x - bodies[i].x;
			let mut dy = bodies[j].y - bodies[i].y;
			if dx == 0.0 {
				dx = jiggle.next();
			}
			if dy == 0.0 {
				dy = jiggle.next();
			}
			let mut l = dx * dx + dy * dy;
			if l < DISTANCE_MIN2 {
				l = (DISTANCE_MIN2 * l).sqrt();
			}
			let w = strength * alpha / l;
			bodies[i].vx += dx * w;
			bodies[i].vy += dy * w;
			bodies[j].vx -= dx * w;
			bodies[j].vy -= dy * w;
		}
	}
}

/// Move the whole cluster a fraction of the way so its centroid sits on `center`.
pub fn apply_center(bodies: &mut [Body], center: (f64, f64), strength: f64) {
	if bodies.is_empty() {
		return;
	}
	let n = bodies.len() as f64;
	let (sx, sy) = bodies
		.iter()
		.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
	let (shift_x, shift_y) = (
		(sx / n - center.0) * strength,
		(sy / n - center.1) * strength,
	);
	for body in bodies.iter_mut() {
		body.x -= shift_x;
		body.y -= shift_y;
	}
}

/// Push apart any two bubbles whose predicted centres are closer than `2 * radius`.
pub fn apply_collide(bodies: &mut [Body], radius: f64, iterations: usize, jiggle: &mut Jiggle) {
	let n = bodies.len();
	let r = radius * 2.0;
	for _ in 0..iterations {
		for i in 0..n {
			let (xi, yi) = (bodies[i].x + bodies[i].vx, bodies[i].y + bodies[i].vy);
			for j in (i + 1)..n {
				let mut dx = xi - bodies[j].x - bodies[j].vx;
				let mut dy = yi - bodies[j].y - bodies[j].vy;
				let mut l = dx * dx + dy * dy;
				if l >= r * r {
					continue;
				}
				if dx == 0.0 {
					dx = jiggle.next();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = jiggle.next();
					l += dy * dy;
				}
				let l = l.sqrt();
				let push = (r - l) / l;
				// Equal radii: each side takes half the correction.
				let (px, py) = (dx * push * 0.5, dy * push * 0.5);
				bodies[i].vx += px;
				bodies[i].vy += py;
				bodies[j].vx -= px;
				bodies[j].vy -= py;
			}
		}
	}
}
