//! # Monthly series
//!
//! $$
//! \{y_i\}_{i=0}^{N-1},\qquad \tau(i) = t_0 + i\ \text{months}
//! $$
//!
//! A univariate series observed at a fixed monthly frequency with no gaps.
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use chrono::Datelike;
use chrono::Months;
use chrono::NaiveDate;

use crate::error::Error;
use crate::error::Result;

/// Observations per year.
pub const MONTHLY: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
  values: Vec<f64>,
  start: NaiveDate,
}

impl MonthlySeries {
  /// Build a series from in-memory values. `start` is normalised to the first of its month.
  pub fn new(values: Vec<f64>, start: NaiveDate) -> Result<Self> {
    if values.is_empty() {
      return Err(Error::insufficient(1, 0, "monthly series"));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
      return Err(Error::InvalidParameter(format!(
        "series value at index {i} is not finite"
      )));
    }
    let start = first_of_month(start);
    Ok(Self { values, start })
  }

  /// Read a whitespace-delimited table with one header line and one numeric column.
  ///
  /// Rows may carry a leading label; the last field of each row is taken as the value.
  pub fn from_table_file<P: AsRef<Path>>(path: P, start: NaiveDate) -> Result<Self> {
    let path = path.as_ref();
    let format_err = |line: Option<usize>, reason: String| Error::DataFormat {
      path: path.to_path_buf(),
      line,
      reason,
    };

    let file = File::open(path).map_err(|e| format_err(None, format!("cannot open file: {e}")))?;
    let reader = BufReader::new(file);

    let mut values = Vec::new();
    let mut saw_header = false;
    for (idx, line) in reader.lines().enumerate() {
      let line_no = idx + 1;
      let line = line.map_err(|e| format_err(Some(line_no), format!("cannot read line: {e}")))?;
      let trimmed = line.trim();
      if trimmed.is_empty() {
        continue;
      }
      if !saw_header {
        saw_header = true;
        continue;
      }

      let Some(field) = trimmed.split_whitespace().last() else {
        continue;
      };
      let field = field.trim_matches('"');
      let value: f64 = field
        .parse()
        .map_err(|_| format_err(Some(line_no), format!("value '{field}' is not numeric")))?;
      if !value.is_finite() {
        return Err(format_err(
          Some(line_no),
          format!("value '{field}' is not finite"),
        ));
      }
      values.push(value);
    }

    if values.is_empty() {
      return Err(format_err(None, "table contains no data rows".into()));
    }

    tracing::debug!(path = %path.display(), rows = values.len(), "loaded monthly table");
    Self::new(values, start)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn values(&self) -> &[f64] {
    &self.values
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  pub fn frequency(&self) -> usize {
    MONTHLY
  }

  /// Date of observation `i` (first day of the month).
  pub fn timestamp(&self, i: usize) -> NaiveDate {
    add_months(self.start, i)
  }

  pub fn last_timestamp(&self) -> NaiveDate {
    self.timestamp(self.len() - 1)
  }

  /// `YYYY-MM` label of observation `i`.
  pub fn label(&self, i: usize) -> String {
    month_label(self.timestamp(i))
  }

  pub fn labels(&self) -> Vec<String> {
    (0..self.len()).map(|i| self.label(i)).collect()
  }
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

pub(crate) fn add_months(date: NaiveDate, months: usize) -> NaiveDate {
  u32::try_from(months)
    .ok()
    .and_then(|m| date.checked_add_months(Months::new(m)))
    .unwrap_or(NaiveDate::MAX)
}

pub fn month_label(date: NaiveDate) -> String {
  date.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  fn jan_1996() -> NaiveDate {
    NaiveDate::from_ymd_opt(1996, 1, 1).unwrap()
  }

  fn write_table(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn last_timestamp_is_start_plus_n_minus_one_months() {
    let mut contents = String::from("illiq\n");
    for i in 0..276 {
      contents.push_str(&format!("{}\n", 0.5 + i as f64 * 0.01));
    }
    let file = write_table(&contents);
    let series = MonthlySeries::from_table_file(file.path(), jan_1996()).unwrap();

    assert_eq!(series.len(), 276);
    assert_eq!(series.frequency(), 12);
    assert_eq!(
      series.last_timestamp(),
      NaiveDate::from_ymd_opt(2018, 12, 1).unwrap()
    );
    assert_eq!(series.label(0), "1996-01");
    assert_eq!(series.label(13), "1997-02");
  }

  #[test]
  fn row_labels_are_ignored() {
    let file = write_table("\"x\"\n\"1\" 0.25\n\"2\" 0.5\n\n\"3\" 1e-1\n");
    let series = MonthlySeries::from_table_file(file.path(), jan_1996()).unwrap();
    assert_eq!(series.values(), &[0.25, 0.5, 0.1]);
  }

  #[test]
  fn non_numeric_value_reports_line() {
    let file = write_table("illiq\n1.0\nabc\n");
    let err = MonthlySeries::from_table_file(file.path(), jan_1996()).unwrap_err();
    match err {
      Error::DataFormat { line, .. } => assert_eq!(line, Some(3)),
      other => panic!("unexpected error {other:?}"),
    }
  }

  #[test]
  fn header_only_table_is_rejected() {
    let file = write_table("illiq\n");
    let err = MonthlySeries::from_table_file(file.path(), jan_1996()).unwrap_err();
    assert!(matches!(err, Error::DataFormat { line: None, .. }));
  }

  #[test]
  fn missing_file_is_a_data_format_error() {
    let err = MonthlySeries::from_table_file("/nonexistent/belgium.txt", jan_1996()).unwrap_err();
    assert!(matches!(err, Error::DataFormat { .. }));
  }

  #[test]
  fn start_is_normalised_to_first_of_month() {
    let series =
      MonthlySeries::new(vec![1.0, 2.0], NaiveDate::from_ymd_opt(2001, 7, 19).unwrap()).unwrap();
    assert_eq!(series.start(), NaiveDate::from_ymd_opt(2001, 7, 1).unwrap());
    assert_eq!(series.label(1), "2001-08");
  }
}
