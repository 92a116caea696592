use super::common::BandwidthRule;
use super::common::CriticalValues;
use super::common::DeterministicTerm;
use super::common::MIN_OBS;
use super::common::adf_critical_values;
use super::common::check_lag_budget;
use super::common::fit_adf;
use super::common::has_degenerate_variation;
use super::common::mackinnon_p_value;
use super::common::newey_west_long_run_variance;
use super::common::validate_series;
use crate::error::Error;
use crate::error::Result;
use crate::error::check_alpha;

/// Phillips-Perron test statistic variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PPTestType {
  /// Z-tau (t-ratio style) statistic.
  Tau,
  /// Z-rho statistic.
  Rho,
}

/// Configuration for the Phillips-Perron unit-root test.
#[derive(Debug, Clone, Copy)]
pub struct PhillipsPerronConfig {
  /// Deterministic terms in the test regression (`Constant` or `ConstantTrend`).
  pub deterministic: DeterministicTerm,
  /// PP statistic type.
  pub test_type: PPTestType,
  /// Newey-West truncation lag.
  pub bandwidth: BandwidthRule,
  /// Significance level for decision output (used for `Tau`).
  pub alpha: f64,
}

impl Default for PhillipsPerronConfig {
  fn default() -> Self {
    Self {
      deterministic: DeterministicTerm::Constant,
      test_type: PPTestType::Tau,
      bandwidth: BandwidthRule::Long,
      alpha: 0.05,
    }
  }
}

/// Result of the Phillips-Perron unit-root test.
#[derive(Debug, Clone, Copy)]
pub struct PhillipsPerronResult {
  /// PP statistic value.
  pub statistic: f64,
  /// Newey-West lag length used.
  pub used_lags: usize,
  /// Variant of the PP statistic.
  pub test_type: PPTestType,
  pub deterministic: DeterministicTerm,
  /// Critical values (available for `Tau` output).
  pub critical_values: Option<CriticalValues>,
  /// MacKinnon p-value (available for `Tau` output).
  pub p_value: Option<f64>,
  /// Unit-root rejection decision (available for `Tau` output).
  pub reject_unit_root: Option<bool>,
}

/// Phillips-Perron unit-root test.
pub fn phillips_perron_test(y: &[f64], cfg: PhillipsPerronConfig) -> Result<PhillipsPerronResult> {
  validate_series(y, MIN_OBS, "Phillips-Perron test")?;
  check_alpha(cfg.alpha)?;
  if cfg.deterministic == DeterministicTerm::None {
    return Err(Error::InvalidParameter(
      "Phillips-Perron requires a constant or constant+trend model".into(),
    ));
  }

  let used_lags = cfg.bandwidth.lags(y.len());
  check_lag_budget(y.len(), used_lags, "Phillips-Perron bandwidth")?;

  let tau_outputs = |statistic: f64| match cfg.test_type {
    PPTestType::Tau => {
      let cvals = adf_critical_values(cfg.deterministic);
      (
        Some(cvals),
        Some(mackinnon_p_value(statistic, cfg.deterministic)),
        Some(statistic < cvals.value_at(cfg.alpha)),
      )
    }
    PPTestType::Rho => (None, None, None),
  };

  if has_degenerate_variation(y) {
    tracing::warn!("Phillips-Perron: series has no variation, reporting a null statistic");
    let (critical_values, p_value, reject_unit_root) = tau_outputs(0.0);
    return Ok(PhillipsPerronResult {
      statistic: 0.0,
      used_lags,
      test_type: cfg.test_type,
      deterministic: cfg.deterministic,
      critical_values,
      p_value: p_value.map(|_| 1.0),
      reject_unit_root,
    });
  }

  let fit = fit_adf(y, 0, cfg.deterministic)?;
  let u = fit.residuals;
  let nobs = u.len();
  let n_f = nobs as f64;

  let s2 = u.iter().map(|v| v * v).sum::<f64>() / n_f;
  if !(s2 > 0.0) {
    return Err(Error::NumericalDegeneracy(
      "Phillips-Perron: Dickey-Fuller regression has zero residual variance".into(),
    ));
  }
  let s = s2.sqrt();
  let gamma0 = s2;

  let lam2 = newey_west_long_run_variance(&u, used_lags);
  let lam = lam2.sqrt();

  // In the ADF parameterization, gamma = rho - 1.
  let rho = 1.0 + fit.gamma;

  let statistic = match cfg.test_type {
    PPTestType::Rho => n_f * (rho - 1.0) - 0.5 * ((n_f * n_f * fit.std_err_gamma.powi(2) / s2) * (lam2 - s2)),
    PPTestType::Tau => {
      let se = fit.std_err_gamma;
      (gamma0 / lam2).sqrt() * ((rho - 1.0) / se) - 0.5 * ((lam2 - s2) / lam) * (n_f * se / s)
    }
  };

  let (critical_values, p_value, reject_unit_root) = tau_outputs(statistic);

  Ok(PhillipsPerronResult {
    statistic,
    used_lags,
    test_type: cfg.test_type,
    deterministic: cfg.deterministic,
    critical_values,
    p_value,
    reject_unit_root,
  })
}
