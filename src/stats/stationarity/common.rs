use crate::error::Error;
use crate::error::Result;
use crate::stats::limits::norm_cdf;
use crate::stats::regression::OlsResult;
use crate::stats::regression::aic_from_sse;
use crate::stats::regression::bic_from_sse;
use crate::stats::regression::ols;

/// Smallest sample any unit-root or stationarity test accepts.
pub const MIN_OBS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeterministicTerm {
  /// No deterministic terms (`type = "none"`).
  None,
  /// Intercept (`type = "drift"` / `model = "constant"`).
  Constant,
  /// Intercept and linear trend (`type = "trend"`).
  ConstantTrend,
}

impl DeterministicTerm {
  pub fn label(self) -> &'static str {
    match self {
      DeterministicTerm::None => "none",
      DeterministicTerm::Constant => "drift",
      DeterministicTerm::ConstantTrend => "trend",
    }
  }

  fn n_terms(self) -> usize {
    match self {
      DeterministicTerm::None => 0,
      DeterministicTerm::Constant => 1,
      DeterministicTerm::ConstantTrend => 2,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagSelection {
  Fixed(usize),
  Aic,
  Bic,
  TStat,
}

/// Truncation lag of the Bartlett long-run variance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthRule {
  /// `⌊4 (n/100)^{1/4}⌋`
  Short,
  /// `⌊12 (n/100)^{1/4}⌋`
  Long,
  Fixed(usize),
}

impl BandwidthRule {
  pub fn lags(self, n: usize) -> usize {
    match self {
      BandwidthRule::Short => power_rule(4.0, n),
      BandwidthRule::Long => power_rule(12.0, n),
      BandwidthRule::Fixed(l) => l,
    }
  }
}

fn power_rule(scale: f64, n: usize) -> usize {
  if n <= 1 {
    return 0;
  }
  (scale * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
  pub one_percent: f64,
  pub five_percent: f64,
  pub ten_percent: f64,
}

impl CriticalValues {
  pub fn value_at(self, alpha: f64) -> f64 {
    if alpha <= 0.01 {
      self.one_percent
    } else if alpha <= 0.05 {
      self.five_percent
    } else {
      self.ten_percent
    }
  }

  pub fn table(self) -> Vec<(String, f64)> {
    vec![
      ("1%".into(), self.one_percent),
      ("5%".into(), self.five_percent),
      ("10%".into(), self.ten_percent),
    ]
  }
}

#[derive(Debug, Clone)]
pub struct AdfFit {
  pub lag: usize,
  pub statistic: f64,
  pub gamma: f64,
  pub std_err_gamma: f64,
  pub nobs: usize,
  pub residuals: Vec<f64>,
  pub sigma2: f64,
}

pub fn validate_series(y: &[f64], min_n: usize, context: &str) -> Result<()> {
  if y.len() < min_n {
    return Err(Error::insufficient(min_n, y.len(), context));
  }
  if let Some(i) = y.iter().position(|v| !v.is_finite()) {
    return Err(Error::InvalidParameter(format!(
      "{context}: observation {i} is not finite"
    )));
  }
  Ok(())
}

/// True when the series shows no variation beyond rounding noise.
pub fn has_degenerate_variation(y: &[f64]) -> bool {
  let Some(&first) = y.first() else {
    return true;
  };
  let scale = y
    .iter()
    .fold(0.0f64, |acc, v| acc.max(v.abs()))
    .max(f64::MIN_POSITIVE);
  y.iter().all(|v| (v - first).abs() <= 1e-12 * scale)
}

/// Lags must satisfy `3 * lags <= n`.
pub fn check_lag_budget(n: usize, lags: usize, context: &str) -> Result<()> {
  if 3 * lags > n {
    return Err(Error::insufficient(3 * lags, n, context));
  }
  Ok(())
}

pub fn difference(y: &[f64]) -> Vec<f64> {
  y.windows(2).map(|w| w[1] - w[0]).collect()
}

pub fn schwert_max_lags(n: usize) -> usize {
  BandwidthRule::Long.lags(n)
}

pub fn adf_critical_values(det: DeterministicTerm) -> CriticalValues {
  match det {
    DeterministicTerm::None => CriticalValues {
      one_percent: -2.58,
      five_percent: -1.95,
      ten_percent: -1.62,
    },
    DeterministicTerm::Constant => CriticalValues {
      one_percent: -3.43,
      five_percent: -2.86,
      ten_percent: -2.57,
    },
    DeterministicTerm::ConstantTrend => CriticalValues {
      one_percent: -3.96,
      five_percent: -3.41,
      ten_percent: -3.13,
    },
  }
}

/// MacKinnon (1994) response-surface p-value of a Dickey-Fuller tau statistic.
pub fn mackinnon_p_value(statistic: f64, det: DeterministicTerm) -> f64 {
  // (tau_star, tau_min, tau_max, small-p coefficients, large-p coefficients)
  let (tau_star, tau_min, tau_max, small, large): (f64, f64, f64, [f64; 3], [f64; 4]) = match det {
    DeterministicTerm::None => (
      -1.04,
      -19.04,
      f64::INFINITY,
      [0.6344, 1.2378, 3.2496],
      [0.4797, 9.3557, -0.6999, 3.3066],
    ),
    DeterministicTerm::Constant => (
      -1.61,
      -18.83,
      2.74,
      [2.1659, 1.4412, 3.8269],
      [1.7339, 9.3202, -1.2745, -1.0368],
    ),
    DeterministicTerm::ConstantTrend => (
      -2.89,
      -16.18,
      0.7,
      [3.2512, 1.6047, 4.9588],
      [2.5261, 6.1654, -3.7956, -6.0285],
    ),
  };

  if statistic.is_nan() {
    return f64::NAN;
  }
  if statistic > tau_max {
    return 1.0;
  }
  if statistic < tau_min {
    return 0.0;
  }

  let z = if statistic <= tau_star {
    let scale = [1.0, 1.0, 1e-2];
    polyval(&small, &scale, statistic)
  } else {
    let scale = [1.0, 1e-1, 1e-1, 1e-2];
    polyval(&large, &scale, statistic)
  };
  norm_cdf(z).clamp(0.0, 1.0)
}

fn polyval(coef: &[f64], scale: &[f64], x: f64) -> f64 {
  coef
    .iter()
    .zip(scale)
    .rev()
    .fold(0.0, |acc, (c, s)| acc * x + c * s)
}

/// ADF regression on observations `start..` of the differenced series.
///
/// `start` must be at least `lags`; a larger `start` fixes a common sample across lag orders.
fn build_adf_design(
  y: &[f64],
  lags: usize,
  start: usize,
  det: DeterministicTerm,
) -> Result<(Vec<f64>, Vec<Vec<f64>>, usize)> {
  let dy = difference(y);
  let n_dy = dy.len();
  let start = start.max(lags);
  let k = det.n_terms() + 1 + lags;
  if n_dy <= start + k {
    return Err(Error::insufficient(
      start + k + 2,
      y.len(),
      format!("ADF regression with {lags} lags"),
    ));
  }

  let mut lhs = Vec::with_capacity(n_dy - start);
  let mut rhs = Vec::with_capacity(n_dy - start);

  for t in start..n_dy {
    lhs.push(dy[t]);

    let mut row = Vec::with_capacity(k);
    match det {
      DeterministicTerm::None => {}
      DeterministicTerm::Constant => row.push(1.0),
      DeterministicTerm::ConstantTrend => {
        row.push(1.0);
        row.push((t + 1) as f64);
      }
    }

    // y_{t-1} term in ADF regression, with dy-index t corresponding to original time t+1.
    row.push(y[t]);

    for i in 1..=lags {
      row.push(dy[t - i]);
    }

    rhs.push(row);
  }

  Ok((lhs, rhs, det.n_terms()))
}

fn adf_from_ols(fit: OlsResult, lags: usize, gamma_index: usize) -> AdfFit {
  let gamma = fit.beta[gamma_index];
  let se = fit.std_err[gamma_index];
  let statistic = if se > 0.0 { gamma / se } else { f64::NAN };

  AdfFit {
    lag: lags,
    statistic,
    gamma,
    std_err_gamma: se,
    nobs: fit.nobs,
    residuals: fit.residuals,
    sigma2: fit.sigma2,
  }
}

pub fn fit_adf(y: &[f64], lags: usize, det: DeterministicTerm) -> Result<AdfFit> {
  let (lhs, rhs, gamma_index) = build_adf_design(y, lags, lags, det)?;
  let fit = ols(&lhs, &rhs)?;
  Ok(adf_from_ols(fit, lags, gamma_index))
}

/// Pick the augmentation order; every candidate is fitted on the sample left by `max_lags`.
pub fn choose_lag_for_adf(
  y: &[f64],
  det: DeterministicTerm,
  lag_selection: LagSelection,
  max_lags: usize,
) -> Result<usize> {
  if let LagSelection::Fixed(p) = lag_selection {
    return Ok(p);
  }

  let mut best_lag = 0usize;
  let mut best_score = f64::INFINITY;
  let mut t_last_by_lag = Vec::with_capacity(max_lags + 1);

  for lag in 0..=max_lags {
    let (lhs, rhs, _gamma_idx) = build_adf_design(y, lag, max_lags, det)?;
    let fit = ols(&lhs, &rhs)?;

    let ic = match lag_selection {
      LagSelection::Aic => aic_from_sse(fit.sse, fit.nobs, fit.k),
      LagSelection::Bic => bic_from_sse(fit.sse, fit.nobs, fit.k),
      LagSelection::Fixed(_) | LagSelection::TStat => 0.0,
    };
    let t_last = if lag > 0 { fit.t_stat(fit.k - 1) } else { 0.0 };

    tracing::debug!(lag, ic, t_last, "ADF lag candidate");

    if ic < best_score {
      best_score = ic;
      best_lag = lag;
    }
    t_last_by_lag.push(t_last);
  }

  if lag_selection == LagSelection::TStat {
    for lag in (0..=max_lags).rev() {
      if lag == 0 || t_last_by_lag[lag].abs() >= 1.644_853_626_951_472_2 {
        return Ok(lag);
      }
    }
    return Ok(0);
  }

  Ok(best_lag)
}

pub fn newey_west_long_run_variance(u: &[f64], lags: usize) -> f64 {
  if u.is_empty() {
    return 0.0;
  }
  let n = u.len();
  let n_f = n as f64;

  let gamma0 = u.iter().map(|v| v * v).sum::<f64>() / n_f;
  let mut lr_var = gamma0;

  for j in 1..=lags {
    if j >= n {
      break;
    }
    let weight = 1.0 - (j as f64) / (lags as f64 + 1.0);
    let mut cov = 0.0;
    for t in j..n {
      cov += u[t] * u[t - j];
    }
    cov /= n_f;
    lr_var += 2.0 * weight * cov;
  }

  if lr_var <= 0.0 || !lr_var.is_finite() {
    gamma0.max(1e-300)
  } else {
    lr_var
  }
}

pub fn regress_on_deterministics(y: &[f64], include_trend: bool) -> Result<OlsResult> {
  let n = y.len();
  let x: Vec<Vec<f64>> = (0..n)
    .map(|t| {
      if include_trend {
        vec![1.0, (t + 1) as f64]
      } else {
        vec![1.0]
      }
    })
    .collect();
  ols(y, &x)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn bandwidth_rules_match_truncation_formulas() {
    assert_eq!(BandwidthRule::Short.lags(276), 5);
    assert_eq!(BandwidthRule::Long.lags(276), 15);
    assert_eq!(BandwidthRule::Fixed(3).lags(276), 3);
    assert_eq!(schwert_max_lags(100), 12);
  }

  #[test]
  fn mackinnon_p_values_hit_the_five_percent_critical_values() {
    for det in [
      DeterministicTerm::None,
      DeterministicTerm::Constant,
      DeterministicTerm::ConstantTrend,
    ] {
      let cv = adf_critical_values(det).five_percent;
      assert_abs_diff_eq!(mackinnon_p_value(cv, det), 0.05, epsilon = 0.005);
    }
  }

  #[test]
  fn mackinnon_p_value_is_monotone() {
    let det = DeterministicTerm::Constant;
    let mut prev = 0.0;
    for i in 0..80 {
      let stat = -8.0 + 0.125 * i as f64;
      let p = mackinnon_p_value(stat, det);
      assert!(p + 0.02 >= prev, "p-value decreased at {stat}: {prev} -> {p}");
      prev = p;
    }
    assert_eq!(mackinnon_p_value(5.0, det), 1.0);
    assert_eq!(mackinnon_p_value(-40.0, det), 0.0);
  }

  #[test]
  fn degenerate_variation_detection() {
    assert!(has_degenerate_variation(&[2.5; 30]));
    assert!(has_degenerate_variation(&[0.0; 30]));
    assert!(!has_degenerate_variation(&[1.0, 1.0, 1.0 + 1e-6]));
  }

  #[test]
  fn lag_budget() {
    assert!(check_lag_budget(30, 10, "ADF").is_ok());
    assert!(matches!(
      check_lag_budget(29, 10, "ADF"),
      Err(Error::InsufficientData { .. })
    ));
  }

  #[test]
  fn common_sample_is_shared_across_lags() {
    let y: Vec<f64> = (0..60).map(|t| ((t * 7) % 11) as f64).collect();
    let (lhs0, rhs0, _) = build_adf_design(&y, 0, 4, DeterministicTerm::Constant).unwrap();
    let (lhs4, rhs4, _) = build_adf_design(&y, 4, 4, DeterministicTerm::Constant).unwrap();
    assert_eq!(lhs0.len(), lhs4.len());
    assert_eq!(lhs0, lhs4);
    assert_eq!(rhs0[0].len(), 2);
    assert_eq!(rhs4[0].len(), 6);
  }
}
