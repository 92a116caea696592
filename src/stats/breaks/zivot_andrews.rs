//! # Zivot-Andrews
//!
//! $$
//! \Delta y_t = \mu + \beta t + \theta DU_t(\lambda) + \gamma DT_t(\lambda)
//!   + (\alpha - 1) y_{t-1} + \sum_{j=1}^{p} c_j \Delta y_{t-j} + e_t
//! $$
//!
//! Unit-root null against trend stationarity with one break at an unknown date;
//! the statistic is the smallest `t(α̂ - 1)` across candidate dates.
use crate::error::Error;
use crate::error::Result;
use crate::error::check_alpha;
use crate::series::MonthlySeries;
use crate::stats::regression::ols;
use crate::stats::stationarity::common::CriticalValues;
use crate::stats::stationarity::common::MIN_OBS;
use crate::stats::stationarity::common::check_lag_budget;
use crate::stats::stationarity::common::difference;
use crate::stats::stationarity::common::has_degenerate_variation;
use crate::stats::stationarity::common::validate_series;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZAModel {
  /// Break in the intercept.
  Intercept,
  /// Break in the trend slope.
  Trend,
  Both,
}

impl ZAModel {
  pub fn label(self) -> &'static str {
    match self {
      ZAModel::Intercept => "intercept",
      ZAModel::Trend => "trend",
      ZAModel::Both => "both",
    }
  }

  fn critical_values(self) -> CriticalValues {
    match self {
      ZAModel::Intercept => CriticalValues {
        one_percent: -5.34,
        five_percent: -4.80,
        ten_percent: -4.58,
      },
      ZAModel::Trend => CriticalValues {
        one_percent: -4.93,
        five_percent: -4.42,
        ten_percent: -4.11,
      },
      ZAModel::Both => CriticalValues {
        one_percent: -5.57,
        five_percent: -5.08,
        ten_percent: -4.82,
      },
    }
  }

  fn level_dummy(self) -> bool {
    matches!(self, ZAModel::Intercept | ZAModel::Both)
  }

  fn trend_dummy(self) -> bool {
    matches!(self, ZAModel::Trend | ZAModel::Both)
  }
}

#[derive(Debug, Clone, Copy)]
pub struct ZivotAndrewsConfig {
  pub model: ZAModel,
  /// Number of lagged differences.
  pub lags: usize,
  /// Fraction of the sample excluded from each end of the break search.
  pub trim: f64,
  pub alpha: f64,
}

impl Default for ZivotAndrewsConfig {
  fn default() -> Self {
    Self {
      model: ZAModel::Both,
      lags: 5,
      trim: 0.15,
      alpha: 0.05,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ZivotAndrewsResult {
  /// Minimum of the statistic path.
  pub statistic: f64,
  /// Series index of the last observation before the break.
  pub break_index: usize,
  pub break_label: String,
  pub model: ZAModel,
  pub used_lags: usize,
  pub nobs: usize,
  pub critical_values: CriticalValues,
  pub reject_unit_root: bool,
  /// Candidate break indices and the statistic at each.
  pub candidates: Vec<usize>,
  pub labels: Vec<String>,
  pub path: Vec<f64>,
}

struct ZaRegression<'a> {
  y: &'a [f64],
  dy: Vec<f64>,
  lags: usize,
  model: ZAModel,
}

impl ZaRegression<'_> {
  /// Observations `t = lags + 1 ..= n - 1`.
  fn rows(&self) -> std::ops::RangeInclusive<usize> {
    self.lags + 1..=self.y.len() - 1
  }

  fn n_regressors(&self) -> usize {
    3 + usize::from(self.model.level_dummy()) + usize::from(self.model.trend_dummy()) + self.lags
  }

  /// `t` statistic of the lagged level with the last pre-break observation at `tb`.
  fn statistic(&self, tb: usize) -> Result<f64> {
    let resp: Vec<f64> = self.rows().map(|t| self.dy[t - 1]).collect();
    let design: Vec<Vec<f64>> = self
      .rows()
      .map(|t| {
        let after = t > tb;
        let mut row = Vec::with_capacity(self.n_regressors());
        row.push(1.0);
        row.push((t + 1) as f64);
        if self.model.level_dummy() {
          row.push(if after { 1.0 } else { 0.0 });
        }
        if self.model.trend_dummy() {
          row.push(if after { (t - tb) as f64 } else { 0.0 });
        }
        row.push(self.y[t - 1]);
        for j in 1..=self.lags {
          row.push(self.dy[t - 1 - j]);
        }
        row
      })
      .collect();
    let gamma_idx = self.n_regressors() - self.lags - 1;
    let fit = ols(&resp, &design)?;
    Ok(fit.t_stat(gamma_idx))
  }
}

/// Zivot-Andrews unit-root test with one endogenous break.
///
/// Fails with `InsufficientData` when the trimmed candidate range is empty
/// or the sample cannot carry the lagged differences.
pub fn zivot_andrews_test(series: &MonthlySeries, cfg: ZivotAndrewsConfig) -> Result<ZivotAndrewsResult> {
  let y = series.values();
  validate_series(y, MIN_OBS, "Zivot-Andrews test")?;
  check_alpha(cfg.alpha)?;
  if !(cfg.trim > 0.0 && cfg.trim < 0.5) {
    return Err(Error::InvalidParameter(format!(
      "trimming fraction must be in (0, 0.5), got {}",
      cfg.trim
    )));
  }
  let n = y.len();
  check_lag_budget(n, cfg.lags, "Zivot-Andrews lag order")?;
  if has_degenerate_variation(y) {
    return Err(Error::NumericalDegeneracy(
      "Zivot-Andrews: series has no variation".into(),
    ));
  }

  let reg = ZaRegression {
    y,
    dy: difference(y),
    lags: cfg.lags,
    model: cfg.model,
  };
  let nobs = reg.rows().count();
  if nobs <= reg.n_regressors() + 1 {
    return Err(Error::insufficient(
      reg.n_regressors() + cfg.lags + 3,
      n,
      "Zivot-Andrews regression",
    ));
  }

  // the break must leave at least two regression rows on either side
  let lo = ((cfg.trim * n as f64).round() as usize).max(cfg.lags + 2);
  let hi = (((1.0 - cfg.trim) * n as f64).round() as usize).min(n - 3);
  if lo > hi {
    return Err(Error::insufficient(
      2 * (cfg.lags + 3),
      n,
      "Zivot-Andrews trimmed break range",
    ));
  }

  let candidates: Vec<usize> = (lo..=hi).collect();
  let path = candidates
    .iter()
    .map(|&tb| reg.statistic(tb))
    .collect::<Result<Vec<f64>>>()?;

  let (arg, statistic) = path
    .iter()
    .enumerate()
    .fold((0usize, f64::INFINITY), |(ai, av), (i, v)| if *v < av { (i, *v) } else { (ai, av) });
  let break_index = candidates[arg];
  let critical_values = cfg.model.critical_values();

  tracing::debug!(
    statistic,
    break_index,
    candidates = candidates.len(),
    model = cfg.model.label(),
    "Zivot-Andrews scan"
  );

  Ok(ZivotAndrewsResult {
    statistic,
    break_index,
    break_label: series.label(break_index),
    model: cfg.model,
    used_lags: cfg.lags,
    nobs,
    critical_values,
    reject_unit_root: statistic < critical_values.value_at(cfg.alpha),
    labels: candidates.iter().map(|&i| series.label(i)).collect(),
    candidates,
    path,
  })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::stats::testing::gaussian_noise;
  use crate::stats::testing::simulate_ar1;
  use crate::stats::testing::simulate_random_walk;

  fn monthly(y: Vec<f64>) -> MonthlySeries {
    MonthlySeries::new(y, NaiveDate::from_ymd_opt(1996, 1, 1).unwrap()).unwrap()
  }

  #[test]
  fn random_walks_rarely_reject() {
    let cfg = ZivotAndrewsConfig::default();
    assert_eq!((cfg.model, cfg.lags), (ZAModel::Both, 5));
    let rejections = (0..40)
      .filter(|seed| {
        zivot_andrews_test(&monthly(simulate_random_walk(120, 300 + *seed)), cfg)
          .unwrap()
          .reject_unit_root
      })
      .count();
    assert!(rejections <= 10, "{rejections} of 40 random walks rejected");
  }

  #[test]
  fn shifted_stationary_series_is_located() {
    let noise = simulate_ar1(0.5, 140, 77);
    let y: Vec<f64> = noise
      .iter()
      .enumerate()
      .map(|(t, e)| if t < 70 { *e } else { 5.0 + e })
      .collect();
    let res = zivot_andrews_test(&monthly(y), ZivotAndrewsConfig::default()).unwrap();

    assert!(res.reject_unit_root, "{:?}", (res.statistic, res.critical_values));
    assert!(
      (res.break_index as i64 - 69).abs() <= 3,
      "break at {} ({})",
      res.break_index,
      res.break_label
    );
    assert_eq!(res.path.len(), res.candidates.len());
    assert!(res.path.iter().all(|v| *v >= res.statistic));
  }

  #[test]
  fn candidate_range_respects_trimming() {
    let res = zivot_andrews_test(&monthly(simulate_random_walk(200, 4)), ZivotAndrewsConfig::default()).unwrap();
    assert_eq!(res.candidates.first().copied(), Some(30));
    assert_eq!(res.candidates.last().copied(), Some(170));
    assert_eq!(res.labels[0], "1998-07");
    assert_eq!(res.used_lags, 5);
    assert_eq!(res.nobs, 194);
  }

  #[test]
  fn models_have_their_own_tables() {
    let y = simulate_random_walk(150, 8);
    for model in [ZAModel::Intercept, ZAModel::Trend, ZAModel::Both] {
      let cfg = ZivotAndrewsConfig {
        model,
        ..ZivotAndrewsConfig::default()
      };
      let res = zivot_andrews_test(&monthly(y.clone()), cfg).unwrap();
      assert_eq!(res.critical_values, model.critical_values());
      assert!(res.statistic.is_finite());
    }
  }

  #[test]
  fn short_or_constant_samples_fail() {
    let cfg = ZivotAndrewsConfig::default();
    assert!(matches!(
      zivot_andrews_test(&monthly(gaussian_noise(12, 1.0, 1)), cfg),
      Err(Error::InsufficientData { .. })
    ));
    assert!(matches!(
      zivot_andrews_test(&monthly(vec![0.4; 60]), cfg),
      Err(Error::NumericalDegeneracy(_))
    ));
    let cfg = ZivotAndrewsConfig { lags: 9, ..cfg };
    assert!(matches!(
      zivot_andrews_test(&monthly(gaussian_noise(25, 1.0, 1)), cfg),
      Err(Error::InsufficientData { .. })
    ));
  }
}
