use super::common::CriticalValues;
use super::common::DeterministicTerm;
use super::common::LagSelection;
use super::common::MIN_OBS;
use super::common::adf_critical_values;
use super::common::check_lag_budget;
use super::common::choose_lag_for_adf;
use super::common::fit_adf;
use super::common::has_degenerate_variation;
use super::common::mackinnon_p_value;
use super::common::schwert_max_lags;
use super::common::validate_series;
use crate::error::Result;
use crate::error::check_alpha;

/// Configuration for the Augmented Dickey-Fuller unit-root test.
#[derive(Debug, Clone, Copy)]
pub struct ADFConfig {
  /// Deterministic terms included in the test regression.
  pub deterministic: DeterministicTerm,
  /// Lag-order selection strategy.
  pub lag_selection: LagSelection,
  /// Maximum lag considered by automatic lag selection.
  pub max_lags: Option<usize>,
  /// Significance level used to compute `reject_unit_root`.
  pub alpha: f64,
}

impl Default for ADFConfig {
  fn default() -> Self {
    Self {
      deterministic: DeterministicTerm::Constant,
      lag_selection: LagSelection::Aic,
      max_lags: None,
      alpha: 0.05,
    }
  }
}

/// Result of the Augmented Dickey-Fuller test.
#[derive(Debug, Clone, Copy)]
pub struct ADFResult {
  /// ADF t-statistic for the lagged level coefficient.
  pub statistic: f64,
  /// MacKinnon approximate p-value.
  pub p_value: f64,
  /// Selected lag order.
  pub used_lags: usize,
  /// Number of regression observations used by the fitted model.
  pub nobs: usize,
  pub deterministic: DeterministicTerm,
  /// Critical values at 1%, 5%, 10% levels.
  pub critical_values: CriticalValues,
  /// Whether the null (unit root) is rejected at `alpha`.
  pub reject_unit_root: bool,
}

/// Augmented Dickey-Fuller unit-root test.
///
/// Fails with `InsufficientData` when the sample is shorter than 20 or the lag
/// budget exceeds a third of the sample.
pub fn adf_test(y: &[f64], cfg: ADFConfig) -> Result<ADFResult> {
  validate_series(y, MIN_OBS, "ADF test")?;
  check_alpha(cfg.alpha)?;

  let max_lags = cfg.max_lags.unwrap_or_else(|| schwert_max_lags(y.len()));
  let lag_budget = match cfg.lag_selection {
    LagSelection::Fixed(p) => p,
    _ => max_lags,
  };
  check_lag_budget(y.len(), lag_budget, "ADF lag order")?;

  let critical_values = adf_critical_values(cfg.deterministic);

  if has_degenerate_variation(y) {
    tracing::warn!("ADF: series has no variation, reporting a null statistic");
    return Ok(ADFResult {
      statistic: 0.0,
      p_value: 1.0,
      used_lags: 0,
      nobs: y.len() - 1,
      deterministic: cfg.deterministic,
      critical_values,
      reject_unit_root: false,
    });
  }

  let used_lags = choose_lag_for_adf(y, cfg.deterministic, cfg.lag_selection, max_lags)?;
  let fit = fit_adf(y, used_lags, cfg.deterministic)?;
  let p_value = mackinnon_p_value(fit.statistic, cfg.deterministic);
  let reject_unit_root = fit.statistic < critical_values.value_at(cfg.alpha);

  tracing::debug!(
    deterministic = cfg.deterministic.label(),
    used_lags,
    statistic = fit.statistic,
    "ADF fitted"
  );

  Ok(ADFResult {
    statistic: fit.statistic,
    p_value,
    used_lags,
    nobs: fit.nobs,
    deterministic: cfg.deterministic,
    critical_values,
    reject_unit_root,
  })
}

#[cfg(test)]
mod tests {
  use super::ADFConfig;
  use super::adf_test;
  use crate::error::Error;
  use crate::stats::stationarity::common::DeterministicTerm;
  use crate::stats::stationarity::common::LagSelection;
  use crate::stats::testing::gaussian_noise;
  use crate::stats::testing::simulate_ar1;
  use crate::stats::testing::simulate_random_walk;

  #[test]
  fn adf_rejects_stationary_ar1() {
    let x = simulate_ar1(0.7, 600, 11);
    let cfg = ADFConfig {
      deterministic: DeterministicTerm::Constant,
      lag_selection: LagSelection::Fixed(4),
      ..ADFConfig::default()
    };
    let res = adf_test(&x, cfg).unwrap();
    assert!(
      res.reject_unit_root,
      "expected unit-root rejection, got {res:?}"
    );
    assert!(res.p_value < 0.01);
  }

  #[test]
  fn adf_rarely_rejects_random_walks() {
    let cfg = ADFConfig {
      deterministic: DeterministicTerm::None,
      lag_selection: LagSelection::Bic,
      max_lags: Some(10),
      ..ADFConfig::default()
    };
    let rejections = (0..20)
      .filter(|seed| adf_test(&simulate_random_walk(276, *seed), cfg).unwrap().reject_unit_root)
      .count();
    assert!(rejections <= 5, "{rejections} of 20 random walks rejected");
  }

  #[test]
  fn bic_picks_up_serially_correlated_differences() {
    let e = gaussian_noise(500, 1.0, 3);
    let mut dy = vec![0.0; 500];
    for t in 1..500 {
      dy[t] = 0.6 * dy[t - 1] + e[t];
    }
    let y: Vec<f64> = dy
      .iter()
      .scan(0.0, |acc, d| {
        *acc += d;
        Some(*acc)
      })
      .collect();
    let cfg = ADFConfig {
      deterministic: DeterministicTerm::Constant,
      lag_selection: LagSelection::Bic,
      max_lags: Some(8),
      ..ADFConfig::default()
    };
    let res = adf_test(&y, cfg).unwrap();
    assert!(res.used_lags >= 1, "BIC ignored the AR structure: {res:?}");
  }

  #[test]
  fn constant_series_is_not_a_failure() {
    for det in [
      DeterministicTerm::None,
      DeterministicTerm::Constant,
      DeterministicTerm::ConstantTrend,
    ] {
      let cfg = ADFConfig {
        deterministic: det,
        lag_selection: LagSelection::Bic,
        max_lags: Some(10),
        ..ADFConfig::default()
      };
      let res = adf_test(&[0.42; 120], cfg).unwrap();
      assert!(!res.reject_unit_root);
      assert_eq!(res.p_value, 1.0);
    }
  }

  #[test]
  fn lag_budget_larger_than_a_third_of_the_sample_fails() {
    let x = simulate_ar1(0.5, 25, 1);
    let cfg = ADFConfig {
      lag_selection: LagSelection::Bic,
      max_lags: Some(10),
      ..ADFConfig::default()
    };
    assert!(matches!(
      adf_test(&x, cfg),
      Err(Error::InsufficientData { .. })
    ));
    assert!(matches!(
      adf_test(&x[..15], ADFConfig::default()),
      Err(Error::InsufficientData { .. })
    ));
  }
}
