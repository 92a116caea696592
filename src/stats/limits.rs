//! # Limiting distributions
//!
//! $$
//! W(s),\quad B(s) = W(s) - sW(1),\quad
//! V(s) = W(s) - \tfrac{|s|}{2}
//! $$
//!
//! Closed forms where they exist, seeded Monte Carlo over a discretised
//! Brownian motion where they do not.
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::StandardNormal;
use roots::SimpleConvergency;
use roots::find_root_brent;
use statrs::function::erf::erfc;

use crate::error::Error;
use crate::error::Result;

pub fn norm_cdf(x: f64) -> f64 {
  0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// `P(sup |B(s)| > x)` for a Brownian bridge (Kolmogorov series).
pub fn brownian_bridge_sup_p_value(x: f64) -> f64 {
  if x <= 0.2 {
    return 1.0;
  }
  let mut p = 0.0;
  for j in 1..=100 {
    let jf = j as f64;
    let term = (-2.0 * jf * jf * x * x).exp();
    p += if j % 2 == 1 { term } else { -term };
    if term < 1e-16 {
      break;
    }
  }
  (2.0 * p).clamp(0.0, 1.0)
}

/// `P(sup |W(t)| / (1 + 2t) > x)` for standard Brownian motion on `[0, 1]`.
pub fn brownian_motion_linear_boundary_p_value(x: f64) -> f64 {
  if x <= 0.0 {
    return 1.0;
  }
  let p = 2.0 * (1.0 - norm_cdf(3.0 * x) + (-4.0 * x * x).exp() * norm_cdf(x));
  p.clamp(0.0, 1.0)
}

/// Invert a decreasing p-value function on `[lo, hi]`.
pub fn critical_value_for<F: Fn(f64) -> f64>(p_value: F, alpha: f64, lo: f64, hi: f64) -> Result<f64> {
  let mut convergency = SimpleConvergency {
    eps: 1e-10_f64,
    max_iter: 200,
  };
  find_root_brent(lo, hi, |x| p_value(x) - alpha, &mut convergency)
    .map_err(|e| Error::NumericalDegeneracy(format!("critical value search failed: {e}")))
}

/// Distribution function of `argmax_s V(s)` for the symmetric two-sided case (Bai, 1997).
pub fn argmax_cdf(x: f64) -> f64 {
  if x < 0.0 {
    return 1.0 - argmax_cdf(-x);
  }
  let sx = x.sqrt();
  let tail = {
    let phi = norm_cdf(-1.5 * sx);
    if phi > 0.0 {
      (x + phi.ln()).exp()
    } else {
      0.0
    }
  };
  let g = 1.0 + (x / (2.0 * std::f64::consts::PI)).sqrt() * (-x / 8.0).exp()
    - 0.5 * (x + 5.0) * norm_cdf(-0.5 * sx)
    + 1.5 * tail;
  g.clamp(0.0, 1.0)
}

/// Quantile of [`argmax_cdf`] at probability `p` in `(0.5, 1)`.
pub fn argmax_quantile(p: f64) -> Result<f64> {
  if !(p > 0.5 && p < 1.0) {
    return Err(Error::InvalidParameter(format!(
      "argmax quantile probability must be in (0.5, 1), got {p}"
    )));
  }
  let mut convergency = SimpleConvergency {
    eps: 1e-10_f64,
    max_iter: 200,
  };
  find_root_brent(0.0, 500.0, |x| argmax_cdf(x) - p, &mut convergency)
    .map_err(|e| Error::NumericalDegeneracy(format!("argmax quantile search failed: {e}")))
}

/// Monte Carlo settings for limiting distributions without a closed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
  pub replications: usize,
  /// Number of steps discretising `[0, 1]`.
  pub grid: usize,
  pub seed: u64,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      replications: 2000,
      grid: 500,
      seed: 19_960_101,
    }
  }
}

/// Sorted draws from a simulated limiting law.
#[derive(Debug, Clone)]
pub struct SimulatedLaw {
  draws: Vec<f64>,
}

impl SimulatedLaw {
  fn from_draws(mut draws: Vec<f64>) -> Self {
    draws.sort_by(|a, b| a.total_cmp(b));
    Self { draws }
  }

  /// Share of draws at or above `statistic`.
  pub fn p_value(&self, statistic: f64) -> f64 {
    if self.draws.is_empty() {
      return f64::NAN;
    }
    let below = self.draws.partition_point(|d| *d < statistic);
    (self.draws.len() - below) as f64 / self.draws.len() as f64
  }

  /// Upper `alpha` quantile.
  pub fn critical_value(&self, alpha: f64) -> f64 {
    if self.draws.is_empty() {
      return f64::NAN;
    }
    let n = self.draws.len();
    let idx = (((1.0 - alpha) * n as f64).ceil() as usize).clamp(1, n) - 1;
    self.draws[idx]
  }
}

/// Simulate `S` functionals of a `dims`-dimensional standard Brownian motion.
///
/// Each path has `grid + 1` points with `W(0) = 0`.
pub fn simulate<const S: usize, F>(cfg: SimulationConfig, dims: usize, mut functional: F) -> Result<[SimulatedLaw; S]>
where
  F: FnMut(&[Vec<f64>]) -> [f64; S],
{
  if cfg.replications == 0 || cfg.grid < 10 || dims == 0 {
    return Err(Error::InvalidParameter(format!(
      "simulation needs replications > 0, grid >= 10 and dims > 0, got {cfg:?} with {dims} dims"
    )));
  }

  let mut rng = StdRng::seed_from_u64(cfg.seed);
  let step_sd = (1.0 / cfg.grid as f64).sqrt();
  let mut paths = vec![vec![0.0; cfg.grid + 1]; dims];
  let mut draws: [Vec<f64>; S] = std::array::from_fn(|_| Vec::with_capacity(cfg.replications));

  for _ in 0..cfg.replications {
    for path in paths.iter_mut() {
      for i in 1..=cfg.grid {
        let z: f64 = StandardNormal.sample(&mut rng);
        path[i] = path[i - 1] + step_sd * z;
      }
    }
    let stats = functional(&paths);
    for (d, s) in draws.iter_mut().zip(stats) {
      d.push(s);
    }
  }

  Ok(draws.map(SimulatedLaw::from_draws))
}

/// Tie a bridge to zero at both ends: `B(s) = W(s) - s W(1)`.
pub fn to_bridge(path: &[f64]) -> Vec<f64> {
  let grid = path.len() - 1;
  let end = path[grid];
  path
    .iter()
    .enumerate()
    .map(|(i, w)| w - (i as f64 / grid as f64) * end)
    .collect()
}
