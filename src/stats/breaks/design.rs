use chrono::NaiveDate;

use crate::error::Error;
use crate::error::Result;
use crate::series::MonthlySeries;
use crate::series::add_months;
use crate::series::month_label;
use crate::stats::stationarity::common::has_degenerate_variation;

/// `y_t ~ 1 + y_{t-1}`: the lagged pair behind every break test.
///
/// Row `i` pairs `value[i] = y[i + 1]` with `lag[i] = y[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ar1Design {
  value: Vec<f64>,
  lag: Vec<f64>,
  series_start: NaiveDate,
}

impl Ar1Design {
  /// Number of regressors (intercept and lag).
  pub const K: usize = 2;

  pub fn from_series(series: &MonthlySeries) -> Result<Self> {
    Self::from_values(series.values(), series.start())
  }

  pub fn from_values(y: &[f64], series_start: NaiveDate) -> Result<Self> {
    if y.len() <= 1 {
      return Err(Error::insufficient(2, y.len(), "AR(1) design"));
    }
    Ok(Self {
      value: y[1..].to_vec(),
      lag: y[..y.len() - 1].to_vec(),
      series_start,
    })
  }

  pub fn len(&self) -> usize {
    self.value.len()
  }

  pub fn is_empty(&self) -> bool {
    self.value.is_empty()
  }

  pub fn value(&self) -> &[f64] {
    &self.value
  }

  pub fn lag(&self) -> &[f64] {
    &self.lag
  }

  /// Design rows `[1, y_{t-1}]`.
  pub fn regressors(&self) -> Vec<Vec<f64>> {
    self.lag.iter().map(|l| vec![1.0, *l]).collect()
  }

  /// Position of row `i` in the original series.
  pub fn series_index(&self, row: usize) -> usize {
    row + 1
  }

  pub fn timestamp(&self, row: usize) -> NaiveDate {
    add_months(self.series_start, self.series_index(row))
  }

  pub fn label(&self, row: usize) -> String {
    month_label(self.timestamp(row))
  }

  /// Label of the last observation once `consumed` rows have entered a sum.
  ///
  /// Zero consumed rows maps to the first series observation.
  pub fn consumed_label(&self, consumed: usize) -> String {
    month_label(add_months(self.series_start, consumed))
  }

  /// True when the response has no variation, which leaves the regression unidentified.
  pub fn is_degenerate(&self) -> bool {
    has_degenerate_variation(&self.value) && has_degenerate_variation(&self.lag)
  }
}
