use crate::series::MonthlySeries;
use crate::stats::breaks::breakpoints::BreakpointFit;
use crate::stats::breaks::efp::FluctuationTest;
use crate::stats::breaks::fstats::FStatsTest;
use crate::stats::breaks::zivot_andrews::ZivotAndrewsResult;

#[derive(Debug, Clone, PartialEq)]
pub enum AxisValues {
  /// `YYYY-MM` labels.
  Dates(Vec<String>),
  /// Sample fractions in `[0, 1]`.
  Fractions(Vec<f64>),
}

impl AxisValues {
  pub fn len(&self) -> usize {
    match self {
      AxisValues::Dates(v) => v.len(),
      AxisValues::Fractions(v) => v.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
  Solid,
  Dash,
  Dot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
  pub name: String,
  pub x: AxisValues,
  pub y: Vec<f64>,
  pub style: LineStyle,
  pub width: f64,
}

impl Trace {
  pub fn new(name: impl Into<String>, x: AxisValues, y: Vec<f64>) -> Self {
    Self {
      name: name.into(),
      x,
      y,
      style: LineStyle::Solid,
      width: 1.5,
    }
  }

  pub fn style(mut self, style: LineStyle) -> Self {
    self.style = style;
    self
  }

  pub fn width(mut self, width: f64) -> Self {
    self.width = width;
    self
  }
}

/// Renderer-neutral description of one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
  /// File stem for renderers that write one file per figure.
  pub name: String,
  pub title: String,
  pub x_title: String,
  pub y_title: String,
  pub traces: Vec<Trace>,
}

impl Figure {
  pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      title: title.into(),
      x_title: String::new(),
      y_title: String::new(),
      traces: Vec::new(),
    }
  }

  pub fn axes(mut self, x_title: impl Into<String>, y_title: impl Into<String>) -> Self {
    self.x_title = x_title.into();
    self.y_title = y_title.into();
    self
  }

  pub fn trace(mut self, trace: Trace) -> Self {
    self.traces.push(trace);
    self
  }
}

fn range(values: &[f64]) -> (f64, f64) {
  values
    .iter()
    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

fn horizontal(name: String, labels: &[String], level: f64, style: LineStyle) -> Trace {
  let ends = match (labels.first(), labels.last()) {
    (Some(a), Some(b)) => vec![a.clone(), b.clone()],
    _ => Vec::new(),
  };
  let y = vec![level; ends.len()];
  Trace::new(name, AxisValues::Dates(ends), y).style(style)
}

fn vertical(name: String, label: &str, (lo, hi): (f64, f64)) -> Trace {
  Trace::new(
    name,
    AxisValues::Dates(vec![label.to_string(), label.to_string()]),
    vec![lo, hi],
  )
  .style(LineStyle::Dash)
}

pub fn series_figure(series: &MonthlySeries) -> Figure {
  Figure::new("time_series", "Illiquidity")
    .axes("month", "illiquidity")
    .trace(Trace::new(
      "series",
      AxisValues::Dates(series.labels()),
      series.values().to_vec(),
    ))
}

pub fn fluctuation_figure(test: &FluctuationTest) -> Figure {
  let x = AxisValues::Fractions(test.index.clone());
  let lower: Vec<f64> = test.boundary.iter().map(|b| -b).collect();
  Figure::new("fluctuation", format!("{} test", test.kind.label()))
    .axes("sample fraction", "empirical fluctuation process")
    .trace(Trace::new("process", x.clone(), test.path.clone()))
    .trace(Trace::new("upper boundary", x.clone(), test.boundary.clone()).style(LineStyle::Dash))
    .trace(Trace::new("lower boundary", x, lower).style(LineStyle::Dash))
}

pub fn f_stats_figure(test: &FStatsTest) -> Figure {
  Figure::new("f_statistics", "F statistics")
    .axes("break after", "F")
    .trace(Trace::new(
      "F",
      AxisValues::Dates(test.labels.clone()),
      test.f_path.clone(),
    ))
    .trace(horizontal(
      format!("supF {}% critical value", test.alpha * 100.0),
      &test.labels,
      test.sup_f.critical_value,
      LineStyle::Dash,
    ))
}

/// The series with a dashed line at each break and its confidence interval drawn along the bottom.
pub fn breakpoints_figure(series: &MonthlySeries, fit: &BreakpointFit) -> Figure {
  let span = range(series.values());
  let mut fig = Figure::new("breakpoints", format!("Breakpoints ({})", fit.breaks.len()))
    .axes("month", "illiquidity")
    .trace(Trace::new(
      "series",
      AxisValues::Dates(series.labels()),
      series.values().to_vec(),
    ));
  for (j, b) in fit.breaks.iter().enumerate() {
    fig = fig
      .trace(vertical(format!("break {}", j + 1), &b.label, span))
      .trace(
        Trace::new(
          format!("{}% CI {}", fit.level * 100.0, j + 1),
          AxisValues::Dates(vec![b.lower_label.clone(), b.upper_label.clone()]),
          vec![span.0, span.0],
        )
        .width(4.0),
      );
  }
  fig
}

pub fn zivot_andrews_figure(res: &ZivotAndrewsResult) -> Figure {
  let mut fig = Figure::new("zivot_andrews", format!("Zivot-Andrews (model = {})", res.model.label()))
    .axes("break after", "t statistic")
    .trace(Trace::new(
      "t",
      AxisValues::Dates(res.labels.clone()),
      res.path.clone(),
    ));
  for (name, cv) in res.critical_values.table() {
    fig = fig.trace(horizontal(format!("{name} critical value"), &res.labels, cv, LineStyle::Dot));
  }
  let (lo, hi) = range(&res.path);
  let lo = lo.min(res.critical_values.one_percent);
  fig.trace(vertical("potential break".into(), &res.break_label, (lo, hi)))
}
