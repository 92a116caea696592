//! # Multiple breakpoints
//!
//! $$
//! \min_{T_1 < \dots < T_m} \sum_{j=0}^{m} \mathrm{RSS}(T_j + 1, T_{j+1}),\qquad
//! T_{j+1} - T_j \ge h
//! $$
//!
//! Dynamic programming over a triangular table of segment RSS (Bai & Perron, 2003).
//! Model choice is reported two ways, by BIC and by RSS reduction, and left to the caller.
use super::design::Ar1Design;
use crate::error::Error;
use crate::error::Result;
use crate::stats::limits::argmax_quantile;
use crate::stats::regression::LeastSquaresFit;
use crate::stats::regression::least_squares;
use crate::stats::regression::ols;
use crate::stats::regression::prefix_sse;

#[derive(Debug, Clone, Copy)]
pub struct BreakpointConfig {
  /// Minimum segment size as a fraction of the sample.
  pub trim: f64,
  /// Upper bound on the number of breaks; `None` allows as many as the trimming admits.
  pub max_breaks: Option<usize>,
  /// Relative RSS drop each added break must deliver for the RSS choice.
  pub min_rss_reduction: f64,
  /// Coverage of the break-date confidence intervals.
  pub level: f64,
}

impl Default for BreakpointConfig {
  fn default() -> Self {
    Self {
      trim: 0.15,
      max_breaks: None,
      min_rss_reduction: 0.05,
      level: 0.95,
    }
  }
}

/// Optimal partition for a given number of breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakModel {
  pub breaks: usize,
  /// Last design row of every regime but the final one.
  pub break_rows: Vec<usize>,
  pub rss: f64,
  pub log_lik: f64,
  pub bic: f64,
}

#[derive(Debug, Clone)]
pub struct BreakpointSearch {
  design: Ar1Design,
  /// Minimum segment size in rows.
  pub h: usize,
  pub models: Vec<BreakModel>,
  pub min_rss_reduction: f64,
  level: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakDate {
  pub row: usize,
  /// Series index of the last observation of the earlier regime.
  pub index: usize,
  pub label: String,
  pub lower_index: usize,
  pub upper_index: usize,
  pub lower_label: String,
  pub upper_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
  pub first_index: usize,
  pub last_index: usize,
  pub first_label: String,
  pub last_label: String,
  /// `[intercept, ar(1)]`
  pub coefficients: Vec<f64>,
  pub sigma2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointFit {
  pub breaks: Vec<BreakDate>,
  pub segments: Vec<Segment>,
  pub level: f64,
}

/// Triangular table: `rss[i][len - h]` is the RSS of rows `i..i + len`.
struct SegmentTable {
  h: usize,
  rss: Vec<Vec<f64>>,
}

impl SegmentTable {
  fn build(design: &Ar1Design, h: usize) -> Result<Self> {
    let n = design.len();
    let x = design.regressors();
    let y = design.value();

    // rounding noise of an exact fit counts as zero RSS
    let mean = y.iter().sum::<f64>() / n as f64;
    let floor = 1e-12 * y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();

    let mut rss = Vec::with_capacity(n - h + 1);
    for i in 0..=n - h {
      let sse = prefix_sse(&y[i..], &x[i..])?;
      rss.push(sse[h..].iter().map(|v| if *v <= floor { 0.0 } else { *v }).collect());
    }
    Ok(Self { h, rss })
  }

  /// RSS of rows `first..=last`.
  fn get(&self, first: usize, last: usize) -> f64 {
    self.rss[first][last + 1 - first - self.h]
  }
}

/// Segment OLS; a regime whose lag never moves gets the minimum-norm solution.
fn segment_fit(y: &[f64], x: &[Vec<f64>]) -> Result<LeastSquaresFit> {
  match ols(y, x) {
    Ok(fit) => Ok(LeastSquaresFit {
      beta: fit.beta,
      sse: fit.sse,
      rank: fit.k,
    }),
    Err(Error::NumericalDegeneracy(_)) => {
      tracing::debug!(rows = y.len(), "breakpoints: rank-deficient segment");
      least_squares(y, x)
    }
    Err(e) => Err(e),
  }
}

fn log_likelihood(rss: f64, n: usize) -> f64 {
  let n = n as f64;
  -0.5 * n * (rss.ln() + 1.0 - n.ln() + (2.0 * std::f64::consts::PI).ln())
}

/// Search every break count `0..=M` for `y_t ~ 1 + y_{t-1}`.
pub fn breakpoints(design: &Ar1Design, cfg: BreakpointConfig) -> Result<BreakpointSearch> {
  if !(cfg.trim > 0.0 && cfg.trim < 0.5) {
    return Err(Error::InvalidParameter(format!(
      "minimum segment fraction must be in (0, 0.5), got {}",
      cfg.trim
    )));
  }
  if !(cfg.level > 0.0 && cfg.level < 1.0) {
    return Err(Error::InvalidParameter(format!(
      "confidence level must be in (0, 1), got {}",
      cfg.level
    )));
  }

  let n = design.len();
  let k = Ar1Design::K;
  let h = (cfg.trim * n as f64).floor() as usize;
  if h <= k {
    return Err(Error::insufficient(
      ((k + 1) as f64 / cfg.trim).ceil() as usize,
      n,
      "breakpoint minimum segment size",
    ));
  }
  if design.is_degenerate() {
    return Err(Error::NumericalDegeneracy(
      "breakpoint search: series has no variation".into(),
    ));
  }

  let admissible = n / h - 1;
  let max_breaks = cfg.max_breaks.map_or(admissible, |m| m.min(admissible));
  if cfg.max_breaks.is_some_and(|m| m > admissible) {
    tracing::debug!(
      requested = cfg.max_breaks,
      admissible,
      "breakpoints: capping the number of breaks"
    );
  }

  let table = SegmentTable::build(design, h)?;

  // best[m][j]: minimal RSS of rows 0..=j split by m breaks; arg holds the last break.
  let mut best: Vec<Vec<f64>> = vec![vec![f64::INFINITY; n]; max_breaks + 1];
  let mut arg: Vec<Vec<usize>> = vec![vec![0; n]; max_breaks + 1];
  for j in h - 1..n {
    best[0][j] = table.get(0, j);
  }
  for m in 1..=max_breaks {
    for j in (m + 1) * h - 1..n {
      for b in m * h - 1..=j - h {
        let cand = best[m - 1][b] + table.get(b + 1, j);
        if cand < best[m][j] {
          best[m][j] = cand;
          arg[m][j] = b;
        }
      }
    }
  }

  let mut models = Vec::with_capacity(max_breaks + 1);
  for m in 0..=max_breaks {
    let mut break_rows = Vec::with_capacity(m);
    let mut j = n - 1;
    for level in (1..=m).rev() {
      let b = arg[level][j];
      break_rows.push(b);
      j = b;
    }
    break_rows.reverse();

    let rss = best[m][n - 1];
    let log_lik = log_likelihood(rss, n);
    let df = ((k + 1) * (m + 1)) as f64;
    let bic = -2.0 * log_lik + df * (n as f64).ln();
    tracing::debug!(breaks = m, rss, bic, ?break_rows, "breakpoint model");
    models.push(BreakModel {
      breaks: m,
      break_rows,
      rss,
      log_lik,
      bic,
    });
  }

  Ok(BreakpointSearch {
    design: design.clone(),
    h,
    models,
    min_rss_reduction: cfg.min_rss_reduction,
    level: cfg.level,
  })
}

impl BreakpointSearch {
  pub fn max_breaks(&self) -> usize {
    self.models.len() - 1
  }

  pub fn model(&self, m: usize) -> Option<&BreakModel> {
    self.models.get(m)
  }

  /// `YYYY-MM` of the last observation before each break of the `m`-break model.
  pub fn break_labels(&self, m: usize) -> Vec<String> {
    self
      .model(m)
      .map(|model| model.break_rows.iter().map(|&r| self.design.label(r)).collect())
      .unwrap_or_default()
  }

  /// Number of breaks minimising BIC.
  pub fn bic_choice(&self) -> usize {
    self
      .models
      .iter()
      .min_by(|a, b| a.bic.total_cmp(&b.bic))
      .map_or(0, |m| m.breaks)
  }

  /// Largest `m` for which every break up to `m` cut RSS by `min_rss_reduction` or more.
  pub fn rss_choice(&self) -> usize {
    let mut chosen = 0;
    for w in self.models.windows(2) {
      let (prev, next) = (&w[0], &w[1]);
      let drop = if prev.rss > 0.0 {
        (prev.rss - next.rss) / prev.rss
      } else {
        0.0
      };
      if drop < self.min_rss_reduction {
        break;
      }
      chosen = next.breaks;
    }
    chosen
  }

  /// Relative RSS drop delivered by the `m`-th break, for `m = 1..=M`.
  pub fn rss_reductions(&self) -> Vec<f64> {
    self
      .models
      .windows(2)
      .map(|w| {
        if w[0].rss > 0.0 {
          (w[0].rss - w[1].rss) / w[0].rss
        } else {
          0.0
        }
      })
      .collect()
  }

  /// Dates, confidence intervals and segment coefficients for `m` breaks.
  pub fn fit(&self, m: usize) -> Result<BreakpointFit> {
    let model = self.model(m).ok_or_else(|| {
      Error::InvalidParameter(format!(
        "{m} breaks requested but the search covers at most {}",
        self.max_breaks()
      ))
    })?;
    let design = &self.design;
    let n = design.len();
    let x = design.regressors();
    let y = design.value();

    let mut bounds = Vec::with_capacity(m + 1);
    let mut first = 0;
    for &b in &model.break_rows {
      bounds.push((first, b));
      first = b + 1;
    }
    bounds.push((first, n - 1));

    let mut fits = Vec::with_capacity(bounds.len());
    for &(a, b) in &bounds {
      fits.push(segment_fit(&y[a..=b], &x[a..=b])?);
    }

    let segments = bounds
      .iter()
      .zip(&fits)
      .map(|(&(a, b), fit)| Segment {
        first_index: design.series_index(a),
        last_index: design.series_index(b),
        first_label: design.label(a),
        last_label: design.label(b),
        coefficients: fit.beta.clone(),
        sigma2: fit.sse / (b + 1 - a - Ar1Design::K) as f64,
      })
      .collect();

    let q = argmax_quantile(1.0 - (1.0 - self.level) / 2.0)?;
    let mut breaks = Vec::with_capacity(m);
    for (j, &row) in model.break_rows.iter().enumerate() {
      let (a, _) = bounds[j];
      let (_, c) = bounds[j + 1];
      let sse = fits[j].sse + fits[j + 1].sse;
      let width = self.interval_half_width((a, c), &fits[j].beta, &fits[j + 1].beta, sse, q);
      let lower_row = row.saturating_sub(width).max(a);
      let upper_row = (row + width).min(c);
      breaks.push(BreakDate {
        row,
        index: design.series_index(row),
        label: design.label(row),
        lower_index: design.series_index(lower_row),
        upper_index: design.series_index(upper_row),
        lower_label: design.label(lower_row),
        upper_label: design.label(upper_row),
      });
    }

    Ok(BreakpointFit {
      breaks,
      segments,
      level: self.level,
    })
  }

  /// `q σ² / (δ' Q δ)` rows, rounded up, with `Q` and `σ²` pooled over the two adjacent regimes.
  fn interval_half_width(&self, (a, c): (usize, usize), beta1: &[f64], beta2: &[f64], sse: f64, q: f64) -> usize {
    let k = Ar1Design::K;
    let lag = &self.design.lag()[a..=c];
    let len = lag.len() as f64;
    let sigma2 = sse / (len - 2.0 * k as f64);

    let d0 = beta2[0] - beta1[0];
    let d1 = beta2[1] - beta1[1];
    let mean_lag = lag.iter().sum::<f64>() / len;
    let mean_lag2 = lag.iter().map(|v| v * v).sum::<f64>() / len;
    let quad = d0 * d0 + 2.0 * d0 * d1 * mean_lag + d1 * d1 * mean_lag2;

    if quad.is_nan() || quad <= 0.0 || !sigma2.is_finite() {
      return c - a;
    }
    let width = (q * sigma2 / quad).ceil();
    if width.is_finite() {
      (width as usize).min(c - a)
    } else {
      c - a
    }
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

  #[test]
  fn segment_table_matches_direct_ols() {
    let d = design(&simulate_ar1(0.5, 80, 2));
    let table = SegmentTable::build(&d, 11).unwrap();
    let x = d.regressors();
    let y = d.value();
    for (a, b) in [(0, 10), (5, 40), (30, 78)] {
      let direct = ols(&y[a..=b], &x[a..=b]).unwrap().sse;
      assert_abs_diff_eq!(table.get(a, b), direct, epsilon = 1e-8);
    }
  }

  #[test]
  fn single_level_jump_is_recovered() {
    // last low observation at series index 99
    let y = level_shift(200, 100, 1.0, 6.0, 0.1, 31);
    let d = design(&y);
    let search = breakpoints(
      &d,
      BreakpointConfig {
        max_breaks: Some(4),
        ..BreakpointConfig::default()
      },
    )
    .unwrap();

    assert_eq!(search.bic_choice(), 1);
    let fit = search.fit(1).unwrap();
    let brk = &fit.breaks[0];
    assert!((brk.index as i64 - 99).abs() <= 1, "break at {}", brk.index);
    assert!(brk.lower_index <= brk.index && brk.index <= brk.upper_index);

    assert_eq!(fit.segments.len(), 2);
    assert_abs_diff_eq!(fit.segments[1].coefficients[0], 6.0, epsilon = 0.5);
    assert_eq!(fit.segments[0].first_index, 1);
    assert_eq!(fit.segments[1].last_index, 199);
  }

  #[test]
  fn noise_free_level_jump_is_recovered() {
    let y: Vec<f64> = (0..200).map(|t| if t < 100 { 1.0 } else { 6.0 }).collect();
    let d = design(&y);
    let search = breakpoints(
      &d,
      BreakpointConfig {
        max_breaks: Some(4),
        ..BreakpointConfig::default()
      },
    )
    .unwrap();

    assert!(search.models[0].rss > 0.0);
    assert_eq!(search.models[1].rss, 0.0);
    assert_eq!(search.bic_choice(), 1);
    assert_eq!(search.rss_choice(), 1);
    assert_eq!(search.break_labels(1), vec![d.label(98)]);

    let fit = search.fit(1).unwrap();
    assert_eq!(fit.breaks[0].index, 99);
    assert_eq!(fit.segments.len(), 2);
    let low = &fit.segments[0];
    assert_abs_diff_eq!(low.coefficients[0] + low.coefficients[1], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(low.sigma2, 0.0, epsilon = 1e-12);
  }

  #[test]
  fn rss_is_monotone_in_the_number_of_breaks() {
    let d = design(&simulate_ar1(0.7, 150, 5));
    let search = breakpoints(&d, BreakpointConfig::default()).unwrap();
    assert_eq!(search.h, 22);
    assert_eq!(search.max_breaks(), 5);
    // a partition into at most three regimes always has a segment long enough to split
    for w in search.models.windows(2).take(3) {
      assert!(w[1].rss <= w[0].rss + 1e-9);
    }
    for model in &search.models {
      assert_eq!(model.break_rows.len(), model.breaks);
      let mut prev: Option<usize> = None;
      for &b in &model.break_rows {
        let gap = b as i64 - prev.map_or(-1, |p| p as i64);
        assert!(gap >= search.h as i64, "segment shorter than h in {model:?}");
        prev = Some(b);
      }
      assert!(d.len() - 1 - prev.unwrap_or(0) >= search.h || model.breaks == 0);
    }
  }

  #[test]
  fn rss_choice_is_independent_of_bic() {
    let d = design(&level_shift(160, 80, 0.0, 4.0, 0.5, 12));
    let mut search = breakpoints(&d, BreakpointConfig::default()).unwrap();
    let reductions = search.rss_reductions();
    assert_eq!(reductions.len(), search.max_breaks());
    assert!(reductions[0] > 0.3, "{reductions:?}");
    assert!(search.rss_choice() >= 1);

    search.min_rss_reduction = 0.99;
    assert_eq!(search.rss_choice(), 0);
    assert_eq!(search.bic_choice(), 1);
  }

  #[test]
  fn zero_break_fit_is_full_sample_ols() {
    let d = design(&simulate_ar1(0.4, 90, 6));
    let search = breakpoints(&d, BreakpointConfig::default()).unwrap();
    let fit = search.fit(0).unwrap();
    assert!(fit.breaks.is_empty());
    let full = ols(d.value(), &d.regressors()).unwrap();
    assert_abs_diff_eq!(fit.segments[0].coefficients[1], full.beta[1], epsilon = 1e-10);
    assert!(search.fit(search.max_breaks() + 1).is_err());
  }

  #[test]
  fn short_sample_cannot_be_segmented() {
    let d = design(&simulate_ar1(0.4, 15, 6));
    assert!(matches!(
      breakpoints(&d, BreakpointConfig::default()),
      Err(Error::InsufficientData { .. })
    ));
  }
}
