//! Initial mass function.
//!
//! Star counts come from the analytic power law; mass draws come from a
//! tabulated inverse CDF so other IMF shapes can be dropped in without an
//! analytic inverse.

use galaxy_accrete::Interval;

/// `dN/dm ∝ m^alpha`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImfPowerLaw {
  pub alpha: f64,
}

impl ImfPowerLaw {
  /// Salpeter's slope.
  pub const SALPETER: Self = Self { alpha: -2.35 };

  pub const fn new(alpha: f64) -> Self {
    Self { alpha }
  }

  /// Unnormalized density at `mass_msol`.
  #[inline]
  pub fn evaluate(&self, mass_msol: f64) -> f64 {
    mass_msol.powf(self.alpha)
  }

  /// Number of stars in `mass_range` (Msol) carrying a total of
  /// `total_mass_in_range` Msol.
  pub fn total_number_of_stars(&self, total_mass_in_range: f64, mass_range: Interval) -> f64 {
    let a = self.alpha;
    let r1 = mass_range.higher.powf(a + 1.0) - mass_range.lower.powf(a + 1.0);
    let r2 = mass_range.higher.powf(a + 2.0) - mass_range.lower.powf(a + 2.0);
    total_mass_in_range * (r1 / r2) * ((a + 2.0) / (a + 1.0))
  }

  /// Fraction of the mass in `full` that falls inside `band`.
  pub fn mass_fraction(&self, band: Interval, full: Interval) -> f64 {
    let a2 = self.alpha + 2.0;
    let integral = |r: Interval| r.higher.powf(a2) - r.lower.powf(a2);
    let whole = integral(full);
    if whole == 0.0 {
      return 0.0;
    }
    (integral(band.intersection(&full)) / whole).clamp(0.0, 1.0)
  }

  /// Analytic inverse-CDF draw in `mass_range` for the uniform `u` in
  /// `[0, 1)`.
  pub fn sample_mass(&self, mass_range: Interval, u: f64) -> f64 {
    let a1 = self.alpha + 1.0;
    let factor = (mass_range.higher / mass_range.lower).powf(a1) - 1.0;
    mass_range.lower * (1.0 + factor * u).powf(1.0 / a1)
  }
}

/// Monotone piecewise-linear table `x -> y`.
#[derive(Clone, Debug)]
pub struct InterpolatedTable {
  xs: Vec<f64>,
  ys: Vec<f64>,
}

impl InterpolatedTable {
  /// `xs` must be sorted ascending and the same length as `ys`.
  pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert!(xs.windows(2).all(|w| w[0] <= w[1]));
    Self { xs, ys }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.xs.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.xs.is_empty()
  }

  /// Interpolated `y` at `x`, clamped to the end values outside the table.
  pub fn lerp(&self, x: f64) -> f64 {
    let n = self.xs.len();
    if n == 0 {
      return 0.0;
    }
    if x <= self.xs[0] {
      return self.ys[0];
    }
    if x >= self.xs[n - 1] {
      return self.ys[n - 1];
    }
    let hi = self.xs.partition_point(|&v| v <= x).min(n - 1);
    let lo = hi - 1;
    let span = self.xs[hi] - self.xs[lo];
    if span <= 0.0 {
      return self.ys[hi];
    }
    let t = (x - self.xs[lo]) / span;
    self.ys[lo] + t * (self.ys[hi] - self.ys[lo])
  }

  /// Swap the axes. Only valid for monotone tables.
  pub fn inverted(&self) -> Self {
    Self {
      xs: self.ys.clone(),
      ys: self.xs.clone(),
    }
  }
}

/// Inverse-CDF sampler built from an IMF density.
#[derive(Clone, Debug)]
pub struct ImfSampler {
  /// mass (Msol) -> cumulative probability.
  cdf: InterpolatedTable,
  /// cumulative probability -> mass (Msol).
  inverse: InterpolatedTable,
}

impl ImfSampler {
  /// Tabulate `imf` over `range` with `resolution` log-spaced points. The
  /// CDF is integrated with the trapezoid rule and normalized to `[0, 1]`.
  pub fn new(imf: &ImfPowerLaw, range: Interval, resolution: usize) -> Self {
    let resolution = resolution.max(2);
    let log_lo = range.lower.ln();
    let log_hi = range.higher.ln();

    let mut masses = Vec::with_capacity(resolution);
    for i in 0..resolution {
      let t = i as f64 / (resolution - 1) as f64;
      masses.push((log_lo + t * (log_hi - log_lo)).exp());
    }
    // Pin the ends so the table covers the range exactly.
    masses[0] = range.lower;
    masses[resolution - 1] = range.higher;

    let mut cdf = Vec::with_capacity(resolution);
    let mut acc = 0.0;
    cdf.push(0.0);
    for w in masses.windows(2) {
      acc += 0.5 * (imf.evaluate(w[0]) + imf.evaluate(w[1])) * (w[1] - w[0]);
      cdf.push(acc);
    }
    if acc > 0.0 {
      for c in &mut cdf {
        *c /= acc;
      }
    }

    let cdf = InterpolatedTable::new(masses, cdf);
    let inverse = cdf.inverted();
    Self { cdf, inverse }
  }

  /// Mass in Msol for the uniform draw `u`, restricted to `band`.
  pub fn sample_in(&self, band: Interval, u: f64) -> f64 {
    let lo = self.cdf.lerp(band.lower);
    let hi = self.cdf.lerp(band.higher);
    let target = lo + u * (hi - lo);
    self.inverse.lerp(target).clamp(band.lower, band.higher)
  }
}
