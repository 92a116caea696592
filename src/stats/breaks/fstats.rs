//! Chow-type F statistics over every admissible split point.
use super::design::Ar1Design;
use crate::error::Error;
use crate::error::Result;
use crate::error::check_alpha;
use crate::stats::limits::SimulatedLaw;
use crate::stats::limits::SimulationConfig;
use crate::stats::limits::simulate;
use crate::stats::limits::to_bridge;
use crate::stats::regression::prefix_sse;

#[derive(Debug, Clone, Copy)]
pub struct FStatsConfig {
  /// Fraction trimmed from each end of the sample.
  pub trim: f64,
  pub alpha: f64,
  pub simulation: SimulationConfig,
}

impl Default for FStatsConfig {
  fn default() -> Self {
    Self {
      trim: 0.15,
      alpha: 0.05,
      simulation: SimulationConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FAggregate {
  pub statistic: f64,
  pub p_value: f64,
  pub critical_value: f64,
}

#[derive(Debug, Clone)]
pub struct FStatsTest {
  /// Last design row of the first regime for each candidate split.
  pub candidates: Vec<usize>,
  pub labels: Vec<String>,
  pub f_path: Vec<f64>,
  pub sup_f: FAggregate,
  pub ave_f: FAggregate,
  pub exp_f: FAggregate,
  /// Design row maximising F.
  pub break_row: usize,
  /// Series index of the last observation before the estimated break.
  pub break_index: usize,
  pub break_label: String,
  pub trim: f64,
  pub alpha: f64,
}

impl FStatsTest {
  pub fn reject_stability(&self) -> bool {
    self.sup_f.p_value < self.alpha
  }
}

fn log_mean_exp_half(values: &[f64]) -> f64 {
  let max = values.iter().fold(f64::NEG_INFINITY, |m, v| m.max(*v));
  if !max.is_finite() {
    return 0.0;
  }
  let sum = values.iter().map(|v| ((v - max) / 2.0).exp()).sum::<f64>();
  max / 2.0 + (sum / values.len() as f64).ln()
}

/// F statistics for a single break in `y_t ~ 1 + y_{t-1}` with sup, ave and exp aggregates.
pub fn f_statistics(design: &Ar1Design, cfg: FStatsConfig) -> Result<FStatsTest> {
  check_alpha(cfg.alpha)?;
  if !(cfg.trim > 0.0 && cfg.trim < 0.5) {
    return Err(Error::InvalidParameter(format!(
      "trimming fraction must be in (0, 0.5), got {}",
      cfg.trim
    )));
  }

  let n = design.len();
  let k = Ar1Design::K;
  let n0 = ((cfg.trim * n as f64).floor() as usize).max(k + 1);
  // first regime holds `i` rows, i in n0..=n-n0
  if n < 2 * n0 + 1 {
    return Err(Error::insufficient(2 * n0 + 1, n, "F statistics trimming"));
  }
  let sizes: Vec<usize> = (n0..=n - n0).collect();

  let f_path = if design.is_degenerate() {
    tracing::warn!("F statistics: degenerate design, reporting zero statistics");
    vec![0.0; sizes.len()]
  } else {
    let x = design.regressors();
    let y = design.value();
    let forward = prefix_sse(y, &x)?;
    let y_rev: Vec<f64> = y.iter().rev().copied().collect();
    let x_rev: Vec<Vec<f64>> = x.iter().rev().cloned().collect();
    let backward = prefix_sse(&y_rev, &x_rev)?;
    let rss = forward[n];

    sizes
      .iter()
      .map(|&i| {
        let split = forward[i] + backward[n - i];
        if split > 0.0 {
          ((rss - split) / (split / (n - 2 * k) as f64)).max(0.0)
        } else {
          0.0
        }
      })
      .collect()
  };

  let (arg, sup) = f_path
    .iter()
    .enumerate()
    .fold((0usize, f64::NEG_INFINITY), |(ai, av), (i, v)| if *v > av { (i, *v) } else { (ai, av) });
  let ave = f_path.iter().sum::<f64>() / f_path.len() as f64;
  let exp = log_mean_exp_half(&f_path);

  let pi0 = n0 as f64 / n as f64;
  let [sup_law, ave_law, exp_law] = simulate(cfg.simulation, k, |paths| {
    let bridges: Vec<Vec<f64>> = paths.iter().map(|p| to_bridge(p)).collect();
    let grid = bridges[0].len() - 1;
    let lo = ((pi0 * grid as f64).ceil() as usize).max(1);
    let hi = (grid - lo).max(lo);
    let q: Vec<f64> = (lo..=hi)
      .map(|i| {
        let s = i as f64 / grid as f64;
        bridges.iter().map(|b| b[i] * b[i]).sum::<f64>() / (s * (1.0 - s))
      })
      .collect();
    let sup = q.iter().fold(0.0f64, |m, v| m.max(*v));
    let ave = q.iter().sum::<f64>() / q.len() as f64;
    [sup, ave, log_mean_exp_half(&q)]
  })?;

  let aggregate = |law: &SimulatedLaw, statistic: f64| FAggregate {
    statistic,
    p_value: if statistic > 0.0 { law.p_value(statistic) } else { 1.0 },
    critical_value: law.critical_value(cfg.alpha),
  };

  let break_row = sizes[arg] - 1;
  let res = FStatsTest {
    labels: sizes.iter().map(|i| design.label(i - 1)).collect(),
    candidates: sizes.iter().map(|i| i - 1).collect(),
    sup_f: aggregate(&sup_law, sup),
    ave_f: aggregate(&ave_law, ave),
    exp_f: aggregate(&exp_law, exp),
    f_path,
    break_row,
    break_index: design.series_index(break_row),
    break_label: design.label(break_row),
    trim: cfg.trim,
    alpha: cfg.alpha,
  };
  tracing::debug!(
    sup_f = res.sup_f.statistic,
    p_value = res.sup_f.p_value,
    break_label = %res.break_label,
    "F statistics"
  );
  Ok(res)
}
