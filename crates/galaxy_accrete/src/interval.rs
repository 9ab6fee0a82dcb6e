//! Closed scalar interval used for radial extents (au) and mass ranges.

/// Closed interval `[lower, higher]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Interval {
  pub lower: f64,
  pub higher: f64,
}

impl Interval {
  pub const ZERO: Self = Self::new(0.0, 0.0);

  #[inline]
  pub const fn new(lower: f64, higher: f64) -> Self {
    Self { lower, higher }
  }

  #[inline]
  pub fn size(&self) -> f64 {
    self.higher - self.lower
  }

  /// True when the interval has no extent.
  #[inline]
  pub fn is_empty(&self) -> bool {
    !(self.lower < self.higher)
  }

  /// Overlap test. Intervals that only touch at an endpoint do not intersect.
  #[inline]
  pub fn intersects(&self, other: &Interval) -> bool {
    self.lower < other.higher && other.lower < self.higher
  }

  /// True when `other` lies entirely within `self` (endpoints inclusive).
  #[inline]
  pub fn contains(&self, other: &Interval) -> bool {
    self.lower <= other.lower && other.higher <= self.higher
  }

  #[inline]
  pub fn contains_value(&self, value: f64) -> bool {
    self.lower <= value && value <= self.higher
  }

  /// Overlapping part of both intervals, or [`Interval::ZERO`] when disjoint.
  pub fn intersection(&self, other: &Interval) -> Interval {
    let lower = self.lower.max(other.lower);
    let higher = self.higher.min(other.higher);
    if lower < higher {
      Interval::new(lower, higher)
    } else {
      Interval::ZERO
    }
  }

  /// Linear interpolation from `lower` (t = 0) to `higher` (t = 1).
  #[inline]
  pub fn lerp(&self, t: f64) -> f64 {
    self.lower + (self.higher - self.lower) * t
  }

  #[inline]
  pub fn scaled(&self, factor: f64) -> Interval {
    Interval::new(self.lower * factor, self.higher * factor)
  }
}
