use super::common::BandwidthRule;
use super::common::MIN_OBS;
use super::common::check_lag_budget;
use super::common::has_degenerate_variation;
use super::common::newey_west_long_run_variance;
use super::common::regress_on_deterministics;
use super::common::validate_series;
use crate::error::Result;
use crate::error::check_alpha;

/// Deterministic component of the KPSS null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KPSSTrend {
  /// Stationary around a constant mean (`mu`).
  Level,
  /// Trend-stationary around a linear trend (`tau`).
  Trend,
}

impl KPSSTrend {
  pub fn label(self) -> &'static str {
    match self {
      KPSSTrend::Level => "mu",
      KPSSTrend::Trend => "tau",
    }
  }
}

/// KPSS critical values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KPSSCriticalValues {
  pub one_percent: f64,
  pub two_point_five_percent: f64,
  pub five_percent: f64,
  pub ten_percent: f64,
}

impl KPSSCriticalValues {
  fn value_at(self, alpha: f64) -> f64 {
    if alpha <= 0.01 {
      self.one_percent
    } else if alpha <= 0.025 {
      self.two_point_five_percent
    } else if alpha <= 0.05 {
      self.five_percent
    } else {
      self.ten_percent
    }
  }

  pub fn table(self) -> Vec<(String, f64)> {
    vec![
      ("10%".into(), self.ten_percent),
      ("5%".into(), self.five_percent),
      ("2.5%".into(), self.two_point_five_percent),
      ("1%".into(), self.one_percent),
    ]
  }

  /// Linear interpolation on the table, clipped to `[0.01, 0.10]`.
  fn p_value(self, statistic: f64) -> f64 {
    let knots = [
      (self.ten_percent, 0.10),
      (self.five_percent, 0.05),
      (self.two_point_five_percent, 0.025),
      (self.one_percent, 0.01),
    ];
    if statistic <= knots[0].0 {
      return 0.10;
    }
    for w in knots.windows(2) {
      let (s0, p0) = w[0];
      let (s1, p1) = w[1];
      if statistic <= s1 {
        return p0 + (statistic - s0) * (p1 - p0) / (s1 - s0);
      }
    }
    0.01
  }
}

/// Configuration for the KPSS stationarity test.
#[derive(Debug, Clone, Copy)]
pub struct KPSSConfig {
  /// Deterministic component under the null.
  pub trend: KPSSTrend,
  /// Newey-West truncation lag.
  pub bandwidth: BandwidthRule,
  /// Significance level used to compute `reject_stationarity`.
  pub alpha: f64,
}

impl Default for KPSSConfig {
  fn default() -> Self {
    Self {
      trend: KPSSTrend::Level,
      bandwidth: BandwidthRule::Short,
      alpha: 0.05,
    }
  }
}

/// Result of the KPSS stationarity test.
#[derive(Debug, Clone, Copy)]
pub struct KPSSResult {
  /// KPSS LM statistic.
  pub statistic: f64,
  /// Table-interpolated p-value, clipped to `[0.01, 0.10]`.
  pub p_value: f64,
  /// Newey-West lag length used.
  pub used_lags: usize,
  pub trend: KPSSTrend,
  /// Critical values for this trend choice.
  pub critical_values: KPSSCriticalValues,
  /// Whether the null (stationarity) is rejected at `alpha`.
  pub reject_stationarity: bool,
}

fn kpss_critical_values(trend: KPSSTrend) -> KPSSCriticalValues {
  match trend {
    KPSSTrend::Level => KPSSCriticalValues {
      one_percent: 0.739,
      two_point_five_percent: 0.574,
      five_percent: 0.463,
      ten_percent: 0.347,
    },
    KPSSTrend::Trend => KPSSCriticalValues {
      one_percent: 0.216,
      two_point_five_percent: 0.176,
      five_percent: 0.146,
      ten_percent: 0.119,
    },
  }
}

/// KPSS stationarity test.
pub fn kpss_test(y: &[f64], cfg: KPSSConfig) -> Result<KPSSResult> {
  validate_series(y, MIN_OBS, "KPSS test")?;
  check_alpha(cfg.alpha)?;

  let n = y.len();
  let used_lags = cfg.bandwidth.lags(n);
  check_lag_budget(n, used_lags, "KPSS bandwidth")?;
  let critical_values = kpss_critical_values(cfg.trend);

  if has_degenerate_variation(y) {
    tracing::warn!("KPSS: series has no variation, reporting a null statistic");
    return Ok(KPSSResult {
      statistic: 0.0,
      p_value: 0.10,
      used_lags,
      trend: cfg.trend,
      critical_values,
      reject_stationarity: false,
    });
  }

  let include_trend = matches!(cfg.trend, KPSSTrend::Trend);
  let reg = regress_on_deterministics(y, include_trend)?;
  let resid = reg.residuals;
  let n_f = resid.len() as f64;

  let mut cum = 0.0;
  let mut eta = 0.0;
  for u in &resid {
    cum += *u;
    eta += cum * cum;
  }
  eta /= n_f * n_f;

  let long_run_var = newey_west_long_run_variance(&resid, used_lags);
  let statistic = eta / long_run_var;
  let reject_stationarity = statistic > critical_values.value_at(cfg.alpha);

  Ok(KPSSResult {
    statistic,
    p_value: critical_values.p_value(statistic),
    used_lags,
    trend: cfg.trend,
    critical_values,
    reject_stationarity,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::KPSSConfig;
  use super::KPSSTrend;
  use super::kpss_critical_values;
  use super::kpss_test;
  use crate::stats::testing::simulate_ar1;
  use crate::stats::testing::simulate_random_walk;

  #[test]
  fn kpss_rarely_rejects_stationary_ar1() {
    let rejections = (0..20)
      .filter(|seed| {
        kpss_test(&simulate_ar1(0.5, 500, 40 + *seed), KPSSConfig::default())
          .unwrap()
          .reject_stationarity
      })
      .count();
    assert!(rejections <= 6, "{rejections} of 20 stationary series rejected");
  }

  #[test]
  fn kpss_rejects_stationarity_for_random_walk() {
    let x = simulate_random_walk(1000, 9);
    let res = kpss_test(&x, KPSSConfig::default()).unwrap();
    assert!(
      res.reject_stationarity,
      "expected rejection for random walk, got {res:?}"
    );
    assert_eq!(res.p_value, 0.01);
  }

  #[test]
  fn trend_null_accepts_a_noisy_trend() {
    let noise = simulate_ar1(0.0, 300, 21);
    let y: Vec<f64> = noise
      .iter()
      .enumerate()
      .map(|(t, e)| 0.05 * t as f64 + e)
      .collect();
    let cfg = KPSSConfig {
      trend: KPSSTrend::Trend,
      ..KPSSConfig::default()
    };
    let res = kpss_test(&y, cfg).unwrap();
    assert!(res.statistic < 0.216, "trend-stationary series gave {res:?}");
  }

  #[test]
  fn p_value_interpolates_between_table_entries() {
    let cv = kpss_critical_values(KPSSTrend::Trend);
    assert_abs_diff_eq!(cv.p_value(0.146), 0.05, epsilon = 1e-12);
    assert_abs_diff_eq!(cv.p_value(0.1325), 0.075, epsilon = 1e-12);
    assert_eq!(cv.p_value(0.01), 0.10);
    assert_eq!(cv.p_value(2.0), 0.01);
  }

  #[test]
  fn constant_series_is_stationary() {
    let cfg = KPSSConfig {
      trend: KPSSTrend::Trend,
      ..KPSSConfig::default()
    };
    let res = kpss_test(&[1.5; 80], cfg).unwrap();
    assert!(!res.reject_stationarity);
    assert_eq!(res.statistic, 0.0);
  }
}
