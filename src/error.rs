//! # Errors
//!
//! $$
//! \text{run} = s_1 \circ s_2 \circ \dots \circ s_n,\quad s_i \in \text{Result}
//! $$
//!
//! Every failure is fatal to the run; callers propagate with `?`.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  /// The input table is missing, unreadable or malformed.
  #[error("data format error in {}{}: {reason}", path.display(), line.map(|l| format!(" (line {l})")).unwrap_or_default())]
  DataFormat {
    path: PathBuf,
    line: Option<usize>,
    reason: String,
  },

  /// The sample is too short for the requested lag or trimming parameters.
  #[error("insufficient data for {context}: need at least {needed} observations, got {got}")]
  InsufficientData {
    needed: usize,
    got: usize,
    context: String,
  },

  /// A regression design is singular or a variance estimate collapsed.
  #[error("numerical degeneracy: {0}")]
  NumericalDegeneracy(String),

  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  /// A reporter could not render its output.
  #[error("report error: {0}")]
  Report(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl Error {
  pub(crate) fn insufficient(needed: usize, got: usize, context: impl Into<String>) -> Self {
    Error::InsufficientData {
      needed,
      got,
      context: context.into(),
    }
  }
}

pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
  if alpha > 0.0 && alpha < 1.0 {
    Ok(())
  } else {
    Err(Error::InvalidParameter(format!(
      "alpha must be in (0, 1), got {alpha}"
    )))
  }
}
