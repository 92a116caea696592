//! # Report
//!
//! $$
//! \text{result} \mapsto (\text{summary}, \text{figure})
//! $$
//!
//! Each pipeline step hands a [`TestSummary`] and a [`Figure`] to a [`Reporter`].
pub mod console;
pub mod figure;
pub mod html;
pub mod summary;

pub use console::ConsoleReporter;
pub use figure::Figure;
pub use html::PlotlyReporter;
pub use summary::TestSummary;
pub use summary::ToSummary;

use crate::error::Result;

pub trait Reporter {
  fn summary(&mut self, summary: &TestSummary) -> Result<()>;
  fn figure(&mut self, figure: &Figure) -> Result<()>;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
  fn summary(&mut self, summary: &TestSummary) -> Result<()> {
    (**self).summary(summary)
  }

  fn figure(&mut self, figure: &Figure) -> Result<()> {
    (**self).figure(figure)
  }
}

/// Fans every summary and figure out to several reporters, in order.
#[derive(Default)]
pub struct ReportSet {
  reporters: Vec<Box<dyn Reporter>>,
}

impl ReportSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with<R: Reporter + 'static>(mut self, reporter: R) -> Self {
    self.reporters.push(Box::new(reporter));
    self
  }

  pub fn len(&self) -> usize {
    self.reporters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.reporters.is_empty()
  }
}

impl Reporter for ReportSet {
  fn summary(&mut self, summary: &TestSummary) -> Result<()> {
    for r in &mut self.reporters {
      r.summary(summary)?;
    }
    Ok(())
  }

  fn figure(&mut self, figure: &Figure) -> Result<()> {
    for r in &mut self.reporters {
      r.figure(figure)?;
    }
    Ok(())
  }
}

#[cfg(test)]
pub(crate) mod recording {
  use super::Figure;
  use super::Reporter;
  use super::TestSummary;
  use crate::error::Result;

  /// Keeps everything it is given.
  #[derive(Default)]
  pub struct RecordingReporter {
    pub summaries: Vec<TestSummary>,
    pub figures: Vec<Figure>,
  }

  impl Reporter for RecordingReporter {
    fn summary(&mut self, summary: &TestSummary) -> Result<()> {
      self.summaries.push(summary.clone());
      Ok(())
    }

    fn figure(&mut self, figure: &Figure) -> Result<()> {
      self.figures.push(figure.clone());
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;
  use crate::error::Error;

  struct Shared(Rc<RefCell<Vec<String>>>);

  impl Reporter for Shared {
    fn summary(&mut self, summary: &TestSummary) -> Result<()> {
      self.0.borrow_mut().push(summary.title.clone());
      Ok(())
    }

    fn figure(&mut self, _figure: &Figure) -> Result<()> {
      Err(Error::Report("no figures here".into()))
    }
  }

  #[test]
  fn report_set_forwards_to_every_reporter() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut set = ReportSet::new()
      .with(Shared(seen.clone()))
      .with(Shared(seen.clone()));
    assert_eq!(set.len(), 2);

    set.summary(&TestSummary::new("ADF")).unwrap();
    assert_eq!(*seen.borrow(), vec!["ADF".to_string(), "ADF".to_string()]);

    let fig = Figure::new("empty", "Empty");
    assert!(matches!(set.figure(&fig), Err(Error::Report(_))));
  }
}
