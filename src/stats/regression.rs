//! # Linear regression
//!
//! $$
//! \hat\beta = (X^\top X)^{-1}X^\top y,\qquad
//! w_t = \frac{y_t - x_t^\top \hat\beta_{t-1}}{\sqrt{1 + x_t^\top (X_{t-1}^\top X_{t-1})^{-1} x_t}}
//! $$
//!
use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::Error;
use crate::error::Result;

/// Reciprocal condition bound of the column-equilibrated design below which it is treated as singular.
const RCOND_TOL: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct OlsResult {
  pub beta: Vec<f64>,
  pub std_err: Vec<f64>,
  pub residuals: Vec<f64>,
  pub sse: f64,
  pub sigma2: f64,
  pub nobs: usize,
  pub k: usize,
}

impl OlsResult {
  pub fn t_stat(&self, idx: usize) -> f64 {
    let se = self.std_err[idx];
    if se > 0.0 {
      self.beta[idx] / se
    } else {
      0.0
    }
  }
}

fn design_matrix(y: &[f64], x: &[Vec<f64>]) -> Result<(DMatrix<f64>, usize, usize)> {
  if y.is_empty() {
    return Err(Error::insufficient(1, 0, "OLS response"));
  }
  if y.len() != x.len() {
    return Err(Error::InvalidParameter(format!(
      "OLS response has {} rows but design has {}",
      y.len(),
      x.len()
    )));
  }
  let n = y.len();
  let k = x[0].len();
  if k == 0 {
    return Err(Error::InvalidParameter(
      "OLS requires at least one regressor".into(),
    ));
  }
  if x.iter().any(|row| row.len() != k) {
    return Err(Error::InvalidParameter(
      "OLS design matrix must be rectangular".into(),
    ));
  }
  if n <= k {
    return Err(Error::insufficient(
      k + 1,
      n,
      format!("OLS with {k} regressors"),
    ));
  }

  let mut flat_x = Vec::with_capacity(n * k);
  for row in x {
    flat_x.extend_from_slice(row);
  }
  Ok((DMatrix::from_row_slice(n, k, &flat_x), n, k))
}

/// Ordinary least squares with classical standard errors.
///
/// Columns are equilibrated before inversion so the singularity check is scale free.
pub fn ols(y: &[f64], x: &[Vec<f64>]) -> Result<OlsResult> {
  let (x_mat, n, k) = design_matrix(y, x)?;
  let y_vec = DVector::from_row_slice(y);

  let norms: Vec<f64> = (0..k).map(|j| x_mat.column(j).norm()).collect();
  if let Some(j) = norms.iter().position(|&c| c <= 0.0 || !c.is_finite()) {
    return Err(Error::NumericalDegeneracy(format!(
      "regressor {j} has no variation in an OLS design of {n} rows"
    )));
  }

  let mut scaled = x_mat.clone();
  for (j, &c) in norms.iter().enumerate() {
    scaled.column_mut(j).scale_mut(1.0 / c);
  }

  let sv = scaled.clone().svd(false, false).singular_values;
  let sv_max = sv.max();
  let sv_min = sv.min();
  if !(sv_min > RCOND_TOL * sv_max) {
    return Err(Error::NumericalDegeneracy(format!(
      "singular OLS design ({n} x {k}, reciprocal condition {:.3e})",
      if sv_max > 0.0 { sv_min / sv_max } else { 0.0 }
    )));
  }

  let xtx = scaled.transpose() * &scaled;
  let Some(xtx_inv) = xtx.try_inverse() else {
    return Err(Error::NumericalDegeneracy(format!(
      "OLS normal equations are not invertible ({n} x {k})"
    )));
  };

  let beta_scaled = &xtx_inv * scaled.transpose() * &y_vec;
  let fitted = &scaled * &beta_scaled;
  let residuals_vec = y_vec - fitted;

  let residuals: Vec<f64> = residuals_vec.iter().copied().collect();
  let sse = residuals.iter().map(|u| u * u).sum::<f64>();
  let dof = (n - k) as f64;
  let sigma2 = (sse / dof).max(0.0);

  let mut beta = vec![0.0; k];
  let mut std_err = vec![0.0; k];
  for i in 0..k {
    beta[i] = beta_scaled[i] / norms[i];
    std_err[i] = (xtx_inv[(i, i)] * sigma2).max(0.0).sqrt() / norms[i];
  }

  Ok(OlsResult {
    beta,
    std_err,
    residuals,
    sse,
    sigma2,
    nobs: n,
    k,
  })
}

/// Minimum-norm least-squares fit; rank-deficient designs are accepted.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
  pub beta: Vec<f64>,
  pub sse: f64,
  pub rank: usize,
}

/// Least squares through the SVD of the column-equilibrated design.
///
/// Singular values below the `RCOND_TOL` bound are dropped, giving the minimum-norm solution.
pub fn least_squares(y: &[f64], x: &[Vec<f64>]) -> Result<LeastSquaresFit> {
  let (x_mat, _, k) = design_matrix(y, x)?;
  let y_vec = DVector::from_row_slice(y);

  let norms: Vec<f64> = (0..k)
    .map(|j| x_mat.column(j).norm())
    .map(|c| if c > 0.0 && c.is_finite() { c } else { 1.0 })
    .collect();
  let mut scaled = x_mat;
  for (j, &c) in norms.iter().enumerate() {
    scaled.column_mut(j).scale_mut(1.0 / c);
  }

  let svd = scaled.clone().svd(true, true);
  let eps = RCOND_TOL * svd.singular_values.max();
  let rank = svd.rank(eps);
  let beta_scaled = svd
    .solve(&y_vec, eps)
    .map_err(|e| Error::NumericalDegeneracy(format!("least squares: {e}")))?;
  let sse = (y_vec - &scaled * &beta_scaled).norm_squared();

  Ok(LeastSquaresFit {
    beta: (0..k).map(|i| beta_scaled[i] / norms[i]).collect(),
    sse,
    rank,
  })
}

fn has_full_rank(x: &DMatrix<f64>) -> bool {
  let mut scaled = x.clone();
  for j in 0..x.ncols() {
    let c = x.column(j).norm();
    if !(c > 0.0 && c.is_finite()) {
      return false;
    }
    scaled.column_mut(j).scale_mut(1.0 / c);
  }
  let sv = scaled.svd(false, false).singular_values;
  sv.min() > RCOND_TOL * sv.max()
}

#[derive(Debug, Clone)]
pub struct RecursiveResiduals {
  /// Rows in the initial fit: the shortest prefix with full column rank.
  pub start: usize,
  /// SSE of OLS on the first `start` rows.
  pub head_sse: f64,
  /// `w_start, .., w_{n-1}`.
  pub residuals: Vec<f64>,
}

/// Recursive residuals of an expanding-window OLS fit.
///
/// The recursion starts at the first prefix whose design has full rank, so repeated
/// leading rows only delay it.
pub fn recursive_residuals(y: &[f64], x: &[Vec<f64>]) -> Result<RecursiveResiduals> {
  let (x_mat, n, k) = design_matrix(y, x)?;

  let Some(start) = (k..=n).find(|&r| has_full_rank(&x_mat.rows(0, r).into_owned())) else {
    return Err(Error::NumericalDegeneracy(format!(
      "recursive residuals: design of {n} rows never reaches full rank"
    )));
  };

  let head = x_mat.rows(0, start).into_owned();
  let Some(mut p) = (head.transpose() * &head).try_inverse() else {
    return Err(Error::NumericalDegeneracy(
      "recursive residuals: initial block is singular".into(),
    ));
  };
  let y_head = DVector::from_row_slice(&y[..start]);
  let mut beta = &p * head.transpose() * &y_head;
  let head_sse = (y_head - &head * &beta).norm_squared();

  let mut out = Vec::with_capacity(n - start);
  for t in start..n {
    let xt = x_mat.row(t).transpose();
    let px = &p * &xt;
    let f = 1.0 + xt.dot(&px);
    if !(f.is_finite() && f > 0.0) {
      return Err(Error::NumericalDegeneracy(format!(
        "recursive residuals: non-positive prediction variance at row {t}"
      )));
    }
    let err = y[t] - xt.dot(&beta);
    out.push(err / f.sqrt());

    beta += &px * (err / f);
    p -= (&px * px.transpose()) / f;
  }

  Ok(RecursiveResiduals {
    start,
    head_sse,
    residuals: out,
  })
}

/// SSE of OLS on the first `i` rows, for `i = 0..=n` (zero while `i <= k`).
///
/// Prefixes without full rank are solved by minimum-norm least squares.
pub fn prefix_sse(y: &[f64], x: &[Vec<f64>]) -> Result<Vec<f64>> {
  let n = y.len();
  let k = x.first().map_or(0, Vec::len);
  let mut out = vec![0.0; n + 1];
  match recursive_residuals(y, x) {
    Ok(rec) => {
      for i in k + 1..rec.start {
        out[i] = least_squares(&y[..i], &x[..i])?.sse;
      }
      out[rec.start] = rec.head_sse;
      for (j, w) in rec.residuals.iter().enumerate() {
        let i = rec.start + j + 1;
        out[i] = out[i - 1] + w * w;
      }
    }
    Err(Error::NumericalDegeneracy(_)) => {
      for i in k + 1..=n {
        out[i] = least_squares(&y[..i], &x[..i])?.sse;
      }
    }
    Err(e) => return Err(e),
  }
  Ok(out)
}

pub fn aic_from_sse(sse: f64, nobs: usize, k: usize) -> f64 {
  let n = nobs as f64;
  n * (sse / n).ln() + 2.0 * k as f64
}

pub fn bic_from_sse(sse: f64, nobs: usize, k: usize) -> f64 {
  let n = nobs as f64;
  n * (sse / n).ln() + (k as f64) * n.ln()
}
