use std::fs;
use std::path::Path;
use std::path::PathBuf;

use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::common::DashType;
use plotly::common::Line;
use plotly::common::Mode;
use plotly::layout::Axis;

use super::Reporter;
use super::figure::AxisValues;
use super::figure::Figure;
use super::figure::LineStyle;
use super::summary::TestSummary;
use crate::error::Error;
use crate::error::Result;

pub fn render(figure: &Figure) -> Plot {
  let mut plot = Plot::new();
  for trace in &figure.traces {
    let dash = match trace.style {
      LineStyle::Solid => DashType::Solid,
      LineStyle::Dash => DashType::Dash,
      LineStyle::Dot => DashType::Dot,
    };
    let line = Line::new().width(trace.width).dash(dash);
    let name = trace.name.as_str();
    match &trace.x {
      AxisValues::Dates(x) => plot.add_trace(
        Scatter::new(x.clone(), trace.y.clone())
          .mode(Mode::Lines)
          .line(line)
          .name(name),
      ),
      AxisValues::Fractions(x) => plot.add_trace(
        Scatter::new(x.clone(), trace.y.clone())
          .mode(Mode::Lines)
          .line(line)
          .name(name),
      ),
    }
  }
  plot.set_layout(
    Layout::new()
      .title(figure.title.as_str())
      .x_axis(Axis::new().title(figure.x_title.as_str()))
      .y_axis(Axis::new().title(figure.y_title.as_str())),
  );
  plot
}

/// Writes every figure as a standalone HTML file; summaries are ignored.
#[derive(Debug)]
pub struct PlotlyReporter {
  dir: PathBuf,
  written: Vec<PathBuf>,
}

impl PlotlyReporter {
  pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir)
      .map_err(|e| Error::Report(format!("creating output directory {}: {e}", dir.display())))?;
    Ok(Self {
      dir,
      written: Vec::new(),
    })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn written(&self) -> &[PathBuf] {
    &self.written
  }
}

impl Reporter for PlotlyReporter {
  fn summary(&mut self, _summary: &TestSummary) -> Result<()> {
    Ok(())
  }

  fn figure(&mut self, figure: &Figure) -> Result<()> {
    let path = self.dir.join(format!("{}.html", figure.name));
    fs::write(&path, render(figure).to_html())
      .map_err(|e| Error::Report(format!("writing {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "figure written");
    self.written.push(path);
    Ok(())
  }
}
