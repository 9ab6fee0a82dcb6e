//! Orbital shapes and analytic (Keplerian) positions.
//!
//! Positions are a closed-form function of time: mean anomaly advances
//! linearly, Kepler's equation is solved with a few Newton steps, and the
//! result is rotated into the parent's frame. There is no integration and no
//! body-body interaction.
//!
//! ```text
//!            +Y (orbit normal before inclination)
//!             |
//!             |     . periapsis at +X
//!             +-----*------> +X
//!            /
//!          +Z
//! ```

use std::f64::consts::TAU;

use glam::{DQuat, DVec3};

use crate::units::{GRAVITATIONAL_CONSTANT, KG_PER_YG, M_PER_TM};

/// Size and elongation of an orbit. Units are whatever the caller uses for
/// `semi_major` (au inside the disc simulation, Tm in the body tree).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitalShape {
  pub eccentricity: f64,
  pub semi_major: f64,
}

impl OrbitalShape {
  #[inline]
  pub const fn new(eccentricity: f64, semi_major: f64) -> Self {
    Self {
      eccentricity,
      semi_major,
    }
  }

  /// Closest approach to the focus.
  #[inline]
  pub fn periapsis(&self) -> f64 {
    self.semi_major * (1.0 - self.eccentricity)
  }

  /// Farthest distance from the focus.
  #[inline]
  pub fn apoapsis(&self) -> f64 {
    self.semi_major * (1.0 + self.eccentricity)
  }

  #[inline]
  pub fn with_semi_major_scaled(&self, factor: f64) -> Self {
    Self::new(self.eccentricity, self.semi_major * factor)
  }
}

/// A full orbit in Tm around a parent body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
  pub shape: OrbitalShape,
  /// Tilt of the orbital plane, radians.
  pub inclination: f64,
  /// Rotation of the ascending node around the parent's up axis, radians.
  pub ascending_node: f64,
  /// Rotation of periapsis within the orbital plane, radians.
  pub argument_of_periapsis: f64,
  /// Mean anomaly at time zero, radians.
  pub phase: f64,
}

impl Orbit {
  pub fn new(shape: OrbitalShape) -> Self {
    Self {
      shape,
      inclination: 0.0,
      ascending_node: 0.0,
      argument_of_periapsis: 0.0,
      phase: 0.0,
    }
  }

  /// Orbital period in seconds around a parent of `parent_mass_yg`.
  ///
  /// Returns infinity for a massless parent so the body stays at its phase.
  pub fn period_s(&self, parent_mass_yg: f64) -> f64 {
    let mu = GRAVITATIONAL_CONSTANT * parent_mass_yg * KG_PER_YG;
    if mu <= 0.0 {
      return f64::INFINITY;
    }
    let a_m = self.shape.semi_major * M_PER_TM;
    TAU * (a_m * a_m * a_m / mu).sqrt()
  }

  /// Offset from the parent in Tm at `time_s`.
  pub fn offset_at(&self, time_s: f64, parent_mass_yg: f64) -> DVec3 {
    let period = self.period_s(parent_mass_yg);
    let mean_anomaly = if period.is_finite() && period > 0.0 {
      (self.phase + TAU * (time_s / period)).rem_euclid(TAU)
    } else {
      self.phase
    };

    let e = self.shape.eccentricity.clamp(0.0, 0.999);
    let eccentric_anomaly = solve_kepler(mean_anomaly, e);

    let a = self.shape.semi_major;
    let x = a * (eccentric_anomaly.cos() - e);
    let z = a * (1.0 - e * e).sqrt() * eccentric_anomaly.sin();

    self.rotation() * DVec3::new(x, 0.0, z)
  }

  /// Rotation from the canonical XZ plane into the parent's frame.
  #[inline]
  pub fn rotation(&self) -> DQuat {
    DQuat::from_rotation_y(self.ascending_node)
      * DQuat::from_rotation_x(self.inclination)
      * DQuat::from_rotation_y(self.argument_of_periapsis)
  }
}

/// Solve `E - e sin E = M` for the eccentric anomaly.
fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
  let mut e_anom = if eccentricity > 0.8 {
    std::f64::consts::PI
  } else {
    mean_anomaly
  };
  for _ in 0..12 {
    let f = e_anom - eccentricity * e_anom.sin() - mean_anomaly;
    let df = 1.0 - eccentricity * e_anom.cos();
    let step = f / df;
    e_anom -= step;
    if step.abs() < 1e-12 {
      break;
    }
  }
  e_anom
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::units::YG_PER_MSOL;

  #[test]
  fn test_periapsis_and_apoapsis() {
    let shape = OrbitalShape::new(0.5, 2.0);
    assert_eq!(shape.periapsis(), 1.0);
    assert_eq!(shape.apoapsis(), 3.0);
  }

  /// Circular orbit keeps a constant distance from the parent.
  #[test]
  fn test_circular_orbit_radius_is_constant() {
    let orbit = Orbit::new(OrbitalShape::new(0.0, 150.0));
    for step in 0..16 {
      let t = step as f64 * 1.0e6;
      let r = orbit.offset_at(t, YG_PER_MSOL).length();
      assert!((r - 150.0).abs() < 1e-6, "radius drifted to {}", r);
    }
  }

  /// One au around one solar mass takes roughly a year.
  #[test]
  fn test_earth_period() {
    let orbit = Orbit::new(OrbitalShape::new(0.0, 149.598));
    let years = orbit.period_s(YG_PER_MSOL) / 3.156e7;
    assert!((years - 1.0).abs() < 0.01, "period was {} years", years);
  }

  /// Eccentric orbits start at periapsis when phase is zero.
  #[test]
  fn test_eccentric_orbit_starts_at_periapsis() {
    let orbit = Orbit::new(OrbitalShape::new(0.3, 10.0));
    let r = orbit.offset_at(0.0, YG_PER_MSOL).length();
    assert!((r - 7.0).abs() < 1e-9);
  }
}
