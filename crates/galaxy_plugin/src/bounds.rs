//! Double-precision axis-aligned box for sector volumes.

use glam::DVec3;

/// Axis-aligned box in Tm.
///
/// Sector bounds, mask field extents and interest sphere tests all go
/// through this type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DAabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl DAabb3 {
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.cmpge(self.min).all() && point.cmple(self.max).all()
	}

	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// Volume in Tm^3.
	#[inline]
	pub fn volume(&self) -> f64 {
		let size = self.size();
		size.x * size.y * size.z
	}

	/// Point at normalized coordinates `t` (0 = min, 1 = max per axis).
	#[inline]
	pub fn lerp(&self, t: DVec3) -> DVec3 {
		self.min + self.size() * t
	}

	/// Normalized coordinates of `point`. Outside the box they leave `[0, 1]`.
	#[inline]
	pub fn inverse_lerp(&self, point: DVec3) -> DVec3 {
		(point - self.min) / self.size()
	}

	/// Squared distance from `point` to the closest point of the box. Zero
	/// inside.
	#[inline]
	pub fn distance_squared_to(&self, point: DVec3) -> f64 {
		point.clamp(self.min, self.max).distance_squared(point)
	}

	/// Sphere test used for interest volumes. Touching counts.
	#[inline]
	pub fn intersects_sphere(&self, center: DVec3, radius: f64) -> bool {
		self.distance_squared_to(center) <= radius * radius
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn unit_box() -> DAabb3 {
		DAabb3::new(DVec3::ZERO, DVec3::splat(10.0))
	}

	#[test]
	fn test_contains_point_inclusive() {
		let aabb = unit_box();
		assert!(aabb.contains_point(DVec3::ZERO));
		assert!(aabb.contains_point(DVec3::splat(10.0)));
		assert!(!aabb.contains_point(DVec3::new(10.01, 5.0, 5.0)));
	}

	#[test]
	fn test_volume_and_center() {
		let aabb = DAabb3::new(DVec3::new(-1.0, 0.0, 2.0), DVec3::new(1.0, 3.0, 6.0));
		assert_eq!(aabb.volume(), 24.0);
		assert_eq!(aabb.center(), DVec3::new(0.0, 1.5, 4.0));
	}

	#[test]
	fn test_lerp_inverse() {
		let aabb = DAabb3::new(DVec3::splat(-4.0), DVec3::splat(4.0));
		let p = aabb.lerp(DVec3::new(0.25, 0.5, 1.0));
		assert_eq!(p, DVec3::new(-2.0, 0.0, 4.0));
		assert_eq!(aabb.inverse_lerp(p), DVec3::new(0.25, 0.5, 1.0));
	}

	#[test]
	fn test_sphere_inside_and_outside() {
		let aabb = unit_box();
		assert!(aabb.intersects_sphere(DVec3::splat(5.0), 0.1));
		assert!(aabb.intersects_sphere(DVec3::new(12.0, 5.0, 5.0), 2.5));
		assert!(!aabb.intersects_sphere(DVec3::new(12.0, 5.0, 5.0), 1.5));
	}

	#[test]
	fn test_sphere_touching_counts() {
		// Corner distance is exactly 3 from (12, 12, 11) -> (10, 10, 10).
		let aabb = unit_box();
		assert!(aabb.intersects_sphere(DVec3::new(12.0, 12.0, 11.0), 3.0));
		assert!(!aabb.intersects_sphere(DVec3::new(12.0, 12.0, 11.0), 2.99));
	}
}
