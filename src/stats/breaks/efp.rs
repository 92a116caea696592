//! Empirical fluctuation processes of OLS or recursive residuals.
use super::design::Ar1Design;
use crate::error::Error;
use crate::error::Result;
use crate::error::check_alpha;
use crate::stats::limits::SimulationConfig;
use crate::stats::limits::brownian_bridge_sup_p_value;
use crate::stats::limits::brownian_motion_linear_boundary_p_value;
use crate::stats::limits::critical_value_for;
use crate::stats::limits::simulate;
use crate::stats::limits::to_bridge;
use crate::stats::regression::ols;
use crate::stats::regression::recursive_residuals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluctuationType {
  OlsCusum,
  RecCusum,
  OlsMosum,
  RecMosum,
}

impl FluctuationType {
  pub fn label(self) -> &'static str {
    match self {
      FluctuationType::OlsCusum => "OLS-based CUSUM",
      FluctuationType::RecCusum => "Recursive CUSUM",
      FluctuationType::OlsMosum => "OLS-based MOSUM",
      FluctuationType::RecMosum => "Recursive MOSUM",
    }
  }

  fn is_recursive(self) -> bool {
    matches!(self, FluctuationType::RecCusum | FluctuationType::RecMosum)
  }
}

#[derive(Debug, Clone, Copy)]
pub struct FluctuationConfig {
  pub kind: FluctuationType,
  /// MOSUM window as a fraction of the residual sample.
  pub bandwidth: f64,
  pub alpha: f64,
  /// Used for the MOSUM limiting law only.
  pub simulation: SimulationConfig,
}

impl Default for FluctuationConfig {
  fn default() -> Self {
    Self {
      kind: FluctuationType::OlsCusum,
      bandwidth: 0.15,
      alpha: 0.05,
      simulation: SimulationConfig::default(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct FluctuationTest {
  pub kind: FluctuationType,
  /// Sample fraction of each path point.
  pub index: Vec<f64>,
  /// `YYYY-MM` of the last observation entering each path point.
  pub labels: Vec<String>,
  pub path: Vec<f64>,
  /// Upper boundary; the lower boundary is its negative.
  pub boundary: Vec<f64>,
  pub statistic: f64,
  pub p_value: f64,
  pub critical_value: f64,
  pub alpha: f64,
  /// Whether `|path|` leaves the boundary anywhere.
  pub crosses_boundary: bool,
}

impl FluctuationTest {
  pub fn reject_stability(&self) -> bool {
    self.p_value < self.alpha
  }
}

/// Fluctuation test of parameter constancy in `y_t ~ 1 + y_{t-1}`.
pub fn fluctuation_test(design: &Ar1Design, cfg: FluctuationConfig) -> Result<FluctuationTest> {
  check_alpha(cfg.alpha)?;
  if !(cfg.bandwidth > 0.0 && cfg.bandwidth < 1.0) {
    return Err(Error::InvalidParameter(format!(
      "MOSUM bandwidth must be in (0, 1), got {}",
      cfg.bandwidth
    )));
  }

  let n = design.len();
  let k = Ar1Design::K;
  if n < 2 * k + 2 {
    return Err(Error::insufficient(2 * k + 2, n, "fluctuation test"));
  }

  let (residuals, offset, sigma) = if design.is_degenerate() {
    tracing::warn!("fluctuation test: degenerate design, reporting a flat process");
    let m = if cfg.kind.is_recursive() { n - k } else { n };
    (vec![0.0; m], if cfg.kind.is_recursive() { k } else { 0 }, 1.0)
  } else if cfg.kind.is_recursive() {
    let rec = recursive_residuals(design.value(), &design.regressors())?;
    let w = rec.residuals;
    if w.len() < 2 {
      return Err(Error::insufficient(rec.start + 2, n, "recursive residuals"));
    }
    let m = w.len() as f64;
    let mean = w.iter().sum::<f64>() / m;
    let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (m - 1.0);
    (w, rec.start, var.sqrt())
  } else {
    let fit = ols(design.value(), &design.regressors())?;
    let sigma = fit.sigma2.sqrt();
    (fit.residuals, 0, sigma)
  };

  if !(sigma > 0.0 && sigma.is_finite()) {
    return Err(Error::NumericalDegeneracy(
      "fluctuation test: residual standard deviation is zero".into(),
    ));
  }

  let m = residuals.len();
  let scale = sigma * (m as f64).sqrt();

  match cfg.kind {
    FluctuationType::OlsCusum | FluctuationType::RecCusum => {
      let mut path = Vec::with_capacity(m + 1);
      let mut acc = 0.0;
      path.push(0.0);
      for e in &residuals {
        acc += e;
        path.push(acc / scale);
      }

      let frac: Vec<f64> = (0..=m).map(|j| j as f64 / m as f64).collect();
      let (statistic, p_value, critical_value, boundary) = if cfg.kind == FluctuationType::OlsCusum {
        let statistic = path.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let cv = critical_value_for(brownian_bridge_sup_p_value, cfg.alpha, 0.3, 5.0)?;
        (
          statistic,
          brownian_bridge_sup_p_value(statistic),
          cv,
          vec![cv; m + 1],
        )
      } else {
        let statistic = path
          .iter()
          .zip(&frac)
          .fold(0.0f64, |acc, (v, t)| acc.max(v.abs() / (1.0 + 2.0 * t)));
        let cv = critical_value_for(brownian_motion_linear_boundary_p_value, cfg.alpha, 0.1, 5.0)?;
        (
          statistic,
          brownian_motion_linear_boundary_p_value(statistic),
          cv,
          frac.iter().map(|t| cv * (1.0 + 2.0 * t)).collect(),
        )
      };

      Ok(finish(
        design,
        cfg,
        path,
        boundary,
        (0..=m).map(|j| offset + j).collect(),
        statistic,
        p_value,
        critical_value,
      ))
    }
    FluctuationType::OlsMosum | FluctuationType::RecMosum => {
      let nh = ((m as f64) * cfg.bandwidth).floor() as usize;
      if nh == 0 || nh >= m {
        return Err(Error::insufficient(
          (1.0 / cfg.bandwidth).ceil() as usize,
          m,
          "MOSUM window",
        ));
      }

      let mut prefix = Vec::with_capacity(m + 1);
      prefix.push(0.0);
      for e in &residuals {
        prefix.push(prefix.last().copied().unwrap_or(0.0) + e);
      }
      let path: Vec<f64> = (0..=m - nh)
        .map(|j| (prefix[j + nh] - prefix[j]) / scale)
        .collect();
      let statistic = path.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));

      let bridge = cfg.kind == FluctuationType::OlsMosum;
      let width = cfg.bandwidth;
      let [law] = simulate(cfg.simulation, 1, |paths| {
        let w = if bridge {
          to_bridge(&paths[0])
        } else {
          paths[0].clone()
        };
        let grid = w.len() - 1;
        let gh = ((grid as f64) * width).round().max(1.0) as usize;
        let sup = (0..=grid - gh).fold(0.0f64, |acc, i| acc.max((w[i + gh] - w[i]).abs()));
        [sup]
      })?;
      let critical_value = law.critical_value(cfg.alpha);
      let p_value = if statistic > 0.0 { law.p_value(statistic) } else { 1.0 };

      let len = path.len();
      Ok(finish(
        design,
        cfg,
        path,
        vec![critical_value; len],
        (0..len).map(|j| offset + j + nh).collect(),
        statistic,
        p_value,
        critical_value,
      ))
    }
  }
}

#[allow(clippy::too_many_arguments)]
fn finish(
  design: &Ar1Design,
  cfg: FluctuationConfig,
  path: Vec<f64>,
  boundary: Vec<f64>,
  consumed: Vec<usize>,
  statistic: f64,
  p_value: f64,
  critical_value: f64,
) -> FluctuationTest {
  let n = design.len() as f64;
  let crosses_boundary = path.iter().zip(&boundary).any(|(p, b)| p.abs() > *b);
  tracing::debug!(
    kind = cfg.kind.label(),
    statistic,
    p_value,
    crosses_boundary,
    "fluctuation test"
  );
  FluctuationTest {
    kind: cfg.kind,
    index: consumed.iter().map(|c| *c as f64 / n).collect(),
    labels: consumed.iter().map(|c| design.consumed_label(*c)).collect(),
    path,
    boundary,
    statistic,
    p_value,
    critical_value,
    alpha: cfg.alpha,
    crosses_boundary,
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;

  use super::*;
  use crate::stats::testing::level_shift;
  use crate::stats::testing::simulate_ar1;

  fn design(y: &[f64]) -> Ar1Design {
    Ar1Design::from_values(y, NaiveDate::from_ymd_opt(1996, 1, 1).unwrap()).unwrap()
  }

  fn quick(kind: FluctuationType) -> FluctuationConfig {
    FluctuationConfig {
      kind,
      simulation: SimulationConfig {
        replications: 500,
        grid: 200,
        seed: 3,
      },
      ..FluctuationConfig::default()
    }
  }

  #[test]
  fn ols_cusum_path_is_tied_down() {
    let d = design(&simulate_ar1(0.5, 200, 1));
    let res = fluctuation_test(&d, quick(FluctuationType::OlsCusum)).unwrap();
    assert_eq!(res.path.len(), d.len() + 1);
    assert_abs_diff_eq!(res.path[0], 0.0);
    assert_abs_diff_eq!(*res.path.last().unwrap(), 0.0, epsilon = 1e-8);
    assert_abs_diff_eq!(res.critical_value, 1.358, epsilon = 2e-3);
    assert_eq!(res.labels[0], "1996-01");
  }

  #[test]
  fn permanent_level_shift_is_detected_by_cusum() {
    let d = design(&level_shift(200, 100, 0.0, 2.0, 1.0, 4));
    for kind in [FluctuationType::OlsCusum, FluctuationType::RecCusum] {
      let res = fluctuation_test(&d, quick(kind)).unwrap();
      assert!(res.reject_stability(), "{kind:?} missed the shift: p = {}", res.p_value);
      assert!(res.crosses_boundary, "{kind:?} stayed within its boundary");
    }
  }

  #[test]
  fn temporary_level_shift_is_detected_by_mosum() {
    let y: Vec<f64> = level_shift(200, 0, 0.0, 0.0, 1.0, 5)
      .into_iter()
      .enumerate()
      .map(|(t, e)| if (90..130).contains(&t) { e + 3.0 } else { e })
      .collect();
    let d = design(&y);
    for kind in [FluctuationType::OlsMosum, FluctuationType::RecMosum] {
      let res = fluctuation_test(&d, quick(kind)).unwrap();
      assert!(res.reject_stability(), "{kind:?} missed the bump: p = {}", res.p_value);
      assert!(res.crosses_boundary, "{kind:?} stayed within its boundary");
    }
  }

  #[test]
  fn stable_ar1_stays_inside_ols_cusum_boundary_mostly() {
    let crossings = (0..20)
      .filter(|seed| {
        let d = design(&simulate_ar1(0.4, 240, 60 + *seed));
        fluctuation_test(&d, quick(FluctuationType::OlsCusum))
          .unwrap()
          .crosses_boundary
      })
      .count();
    assert!(crossings <= 5, "{crossings} of 20 stable series crossed");
  }

  #[test]
  fn constant_series_gives_flat_process() {
    let d = design(&[0.8; 60]);
    for kind in [FluctuationType::OlsCusum, FluctuationType::RecCusum] {
      let res = fluctuation_test(&d, quick(kind)).unwrap();
      assert_eq!(res.statistic, 0.0);
      assert_eq!(res.p_value, 1.0);
      assert!(!res.crosses_boundary);
    }
  }

  #[test]
  fn repeated_opening_value_starts_the_recursion_later() {
    let mut y = simulate_ar1(0.5, 120, 3);
    y[1] = y[0];
    let d = design(&y);
    for kind in [FluctuationType::RecCusum, FluctuationType::RecMosum] {
      let res = fluctuation_test(&d, quick(kind)).unwrap();
      assert!(res.statistic.is_finite());
      assert!((0.0..=1.0).contains(&res.p_value));
    }
    let res = fluctuation_test(&d, quick(FluctuationType::RecCusum)).unwrap();
    assert_eq!(res.path.len(), d.len() - 2);
    assert_eq!(res.labels[0], d.consumed_label(3));
  }

  #[test]
  fn rec_cusum_boundary_widens() {
    let d = design(&simulate_ar1(0.2, 150, 2));
    let res = fluctuation_test(&d, quick(FluctuationType::RecCusum)).unwrap();
    assert_abs_diff_eq!(res.boundary[0], res.critical_value, epsilon = 1e-12);
    assert_abs_diff_eq!(*res.boundary.last().unwrap(), 3.0 * res.critical_value, epsilon = 1e-12);
    assert_eq!(res.path.len(), d.len() - 1);
  }
}
