//! Pan/zoom transform with cancellable timed transitions.
//!
//! The transform maps world to screen as `screen = world * k + (x, y)` and is
//! applied to the rendered layer only; node coordinates never change.

/// Translate + uniform scale applied to the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal offset in screen pixels.
	pub x: f64,
	/// Vertical offset in screen pixels.
	pub y: f64,
	/// Zoom factor.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	/// No pan, scale 1.
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	/// Transform that shows world point `(wx, wy)` in the middle of a `width` x `height` view.
	pub fn centered_on(wx: f64, wy: f64, k: f64, width: f64, height: f64) -> Self {
		Self {
			x: width / 2.0 - wx * k,
			y: height / 2.0 - wy * k,
			k,
		}
	}

	/// Screen point to world point.
	pub fn to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// World point to screen point.
	pub fn to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
		(wx * self.k + self.x, wy * self.k + self.y)
	}

	/// Interpolate the world point under the view centre linearly and the
	/// scale geometrically, so the move reads as one smooth fly-to.
	pub fn interpolate(&self, to: &Self, t: f64, width: f64, height: f64) -> Self {
		let (fx, fy) = self.to_world(width / 2.0, height / 2.0);
		let (tx, ty) = to.to_world(width / 2.0, height / 2.0);
		let k = self.k * (to.k / self.k).powf(t);
		Self::centered_on(fx + (tx - fx) * t, fy + (ty - fy) * t, k, width, height)
	}
}

/// Cubic ease-in-out on `t` in `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// One pending camera move. `from` is captured when the delay runs out so a
/// move scheduled ahead of time starts from wherever the camera then is.
#[derive(Clone, Debug)]
struct Tween {
	from: Option<ViewTransform>,
	to: ViewTransform,
	delay: f64,
	duration: f64,
	elapsed: f64,
}

/// The live view transform and at most one pending transition.
#[derive(Clone, Debug)]
pub struct Camera {
	transform: ViewTransform,
	tween: Option<Tween>,
	min_zoom: f64,
	max_zoom: f64,
	width: f64,
	height: f64,
}

impl Camera {
	/// Identity view clamped to `min_zoom..=max_zoom`.
	pub fn new(width: f64, height: f64, min_zoom: f64, max_zoom: f64) -> Self {
		Self {
			transform: ViewTransform::IDENTITY,
			tween: None,
			min_zoom,
			max_zoom,
			width,
			height,
		}
	}

	/// Transform to draw with this frame.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Whether a transition is waiting or running.
	pub fn is_animating(&self) -> bool {
		self.tween.is_some()
	}

	/// Viewport size used to centre transitions.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn clamp_zoom(&self, k: f64) -> f64 {
		k.clamp(self.min_zoom, self.max_zoom)
	}

	/// Replace any in-flight move with a new one.
	pub fn transition_to(&mut self, to: ViewTransform, delay: f64, duration: f64) {
		let to = ViewTransform {
			k: self.clamp_zoom(to.k),
			..to
		};
		self.tween = Some(Tween {
			from: None,
			to,
			delay: delay.max(0.0),
			duration: duration.max(0.0),
			elapsed: 0.0,
		});
	}

	/// Drop the in-flight move, keeping the last committed transform.
	pub fn cancel(&mut self) {
		self.tween = None;
	}

	/// Advance the in-flight move by `dt` seconds and commit the result.
	pub fn tick(&mut self, dt: f64) {
		let Some(tween) = self.tween.as_mut() else {
			return;
		};
		tween.elapsed += dt;
		if tween.elapsed < tween.delay {
			return;
		}
		let from = *tween.from.get_or_insert(self.transform);
		let t = if tween.duration <= 0.0 {
			1.0
		} else {
			((tween.elapsed - tween.delay) / tween.duration).min(1.0)
		};
		if t >= 1.0 {
			self.transform = tween.to;
			self.tween = None;
		} else {
			let eased = ease_in_out_cubic(t);
			self.transform = from.interpolate(&tween.to, eased, self.width, self.height);
		}
	}

	/// Scale by `factor` around a screen point, interrupting any transition.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		self.cancel();
		let t = self.transform;
		let k = self.clamp_zoom(t.k * factor);
		let ratio = k / t.k;
		self.transform = ViewTransform {
			x: sx - (sx - t.x) * ratio,
			y: sy - (sy - t.y) * ratio,
			k,
		};
	}

	/// Translate by a screen-space delta, interrupting any transition.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.cancel();
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Jump straight to `transform`, zoom clamped. Cancels any transition.
	pub fn set_transform(&mut self, transform: ViewTransform) {
		self.cancel();
		self.transform = ViewTransform {
			k: self.clamp_zoom(transform.k),
			..transform
		};
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn camera() -> Camera {
		Camera::new(800.0, 600.0, 0.05, 4.0)
	}

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-6
	}

	#[test]
	fn zoom_is_clamped() {
		let mut cam = camera();
		for _ in 0..100 {
			cam.zoom_at(1.5, 400.0, 300.0);
		}
		assert_eq!(cam.transform().k, 4.0);
		for _ in 0..200 {
			cam.zoom_at(0.5, 400.0, 300.0);
		}
		assert_eq!(cam.transform().k, 0.05);
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut cam = camera();
		cam.pan_by(30.0, -20.0);
		let before = cam.transform().to_world(250.0, 120.0);
		cam.zoom_at(1.7, 250.0, 120.0);
		let after = cam.transform().to_world(250.0, 120.0);
		assert!(close(before.0, after.0) && close(before.1, after.1));
	}

	#[test]
	fn transition_lands_on_target() {
		let mut cam = camera();
		let target = ViewTransform::centered_on(100.0, 50.0, 1.2, 800.0, 600.0);
		cam.transition_to(target, 0.0, 1.0);
		for _ in 0..30 {
			cam.tick(0.016);
		}
		assert!(cam.is_animating());
		assert_ne!(cam.transform(), ViewTransform::IDENTITY);
		for _ in 0..100 {
			cam.tick(0.016);
		}
		assert!(!cam.is_animating());
		assert_eq!(cam.transform(), target);
	}

	#[test]
	fn delay_holds_the_camera_still() {
		let mut cam = camera();
		cam.transition_to(ViewTransform::centered_on(400.0, 300.0, 0.2, 800.0, 600.0), 0.5, 2.0);
		cam.tick(0.4);
		assert_eq!(cam.transform(), ViewTransform::IDENTITY);
		cam.tick(0.2);
		assert_ne!(cam.transform(), ViewTransform::IDENTITY);
	}

	#[test]
	fn cancel_keeps_last_committed_transform() {
		let mut cam = camera();
		let target = ViewTransform::centered_on(0.0, 0.0, 3.0, 800.0, 600.0);
		cam.transition_to(target, 0.0, 1.0);
		cam.tick(0.3);
		let midway = cam.transform();
		cam.cancel();
		cam.tick(5.0);
		assert_eq!(cam.transform(), midway);
		assert_ne!(cam.transform(), target);
	}

	#[test]
	fn user_pan_interrupts_transition() {
		let mut cam = camera();
		cam.transition_to(ViewTransform::centered_on(0.0, 0.0, 2.0, 800.0, 600.0), 0.0, 1.0);
		cam.pan_by(10.0, 0.0);
		assert!(!cam.is_animating());
		assert_eq!(cam.transform().x, 10.0);
	}

	#[test]
	fn interpolation_endpoints_match() {
		let a = ViewTransform::IDENTITY;
		let b = ViewTransform::centered_on(120.0, -40.0, 2.5, 800.0, 600.0);
		let start = a.interpolate(&b, 0.0, 800.0, 600.0);
		let end = a.interpolate(&b, 1.0, 800.0, 600.0);
		assert!(close(start.x, a.x) && close(start.y, a.y) && close(start.k, a.k));
		assert!(close(end.x, b.x) && close(end.y, b.y) && close(end.k, b.k));
	}
}
