use crate::stats::breaks::breakpoints::BreakpointFit;
use crate::stats::breaks::breakpoints::BreakpointSearch;
use crate::stats::breaks::efp::FluctuationTest;
use crate::stats::breaks::fstats::FStatsTest;
use crate::stats::breaks::zivot_andrews::ZivotAndrewsResult;
use crate::stats::stationarity::DeterministicTerm;
use crate::stats::stationarity::adf::ADFResult;
use crate::stats::stationarity::kpss::KPSSResult;
use crate::stats::stationarity::phillips_perron::PPTestType;
use crate::stats::stationarity::phillips_perron::PhillipsPerronResult;

/// Printable block for one test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSummary {
  pub title: String,
  pub statistics: Vec<(String, f64)>,
  pub critical_values: Vec<(String, f64)>,
  pub p_value: Option<f64>,
  pub decision: String,
  pub notes: Vec<String>,
}

impl TestSummary {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      statistics: Vec::new(),
      critical_values: Vec::new(),
      p_value: None,
      decision: String::new(),
      notes: Vec::new(),
    }
  }

  pub fn statistic(mut self, name: impl Into<String>, value: f64) -> Self {
    self.statistics.push((name.into(), value));
    self
  }

  pub fn critical_values(mut self, table: Vec<(String, f64)>) -> Self {
    self.critical_values.extend(table);
    self
  }

  pub fn p_value(mut self, p: f64) -> Self {
    self.p_value = Some(p);
    self
  }

  pub fn decision(mut self, decision: impl Into<String>) -> Self {
    self.decision = decision.into();
    self
  }

  pub fn note(mut self, note: impl Into<String>) -> Self {
    self.notes.push(note.into());
    self
  }
}

pub trait ToSummary {
  fn to_summary(&self) -> TestSummary;
}

fn unit_root_decision(reject: bool) -> &'static str {
  if reject {
    "reject the unit-root null"
  } else {
    "cannot reject the unit-root null"
  }
}

fn stability_decision(reject: bool) -> &'static str {
  if reject {
    "reject parameter stability"
  } else {
    "no evidence of a structural change"
  }
}

fn percent(alpha: f64) -> String {
  format!("{}%", alpha * 100.0)
}

impl ToSummary for ADFResult {
  fn to_summary(&self) -> TestSummary {
    TestSummary::new(format!(
      "Augmented Dickey-Fuller (type = {})",
      self.deterministic.label()
    ))
    .statistic("tau", self.statistic)
    .critical_values(self.critical_values.table())
    .p_value(self.p_value)
    .decision(unit_root_decision(self.reject_unit_root))
    .note(format!("lags used: {} ({} observations)", self.used_lags, self.nobs))
  }
}

impl ToSummary for PhillipsPerronResult {
  fn to_summary(&self) -> TestSummary {
    let model = match self.deterministic {
      DeterministicTerm::ConstantTrend => "trend",
      _ => "constant",
    };
    let name = match self.test_type {
      PPTestType::Tau => "Z-tau",
      PPTestType::Rho => "Z-alpha",
    };
    let mut s = TestSummary::new(format!("Phillips-Perron {name} (model = {model})"))
      .statistic(name, self.statistic)
      .note(format!("bandwidth: {} lags", self.used_lags));
    if let Some(cv) = self.critical_values {
      s = s.critical_values(cv.table());
    }
    if let Some(p) = self.p_value {
      s = s.p_value(p);
    }
    match self.reject_unit_root {
      Some(reject) => s.decision(unit_root_decision(reject)),
      None => s.decision("no tabulated decision for Z-alpha"),
    }
  }
}

impl ToSummary for KPSSResult {
  fn to_summary(&self) -> TestSummary {
    let decision = if self.reject_stationarity {
      "reject stationarity"
    } else {
      "cannot reject stationarity"
    };
    TestSummary::new(format!("KPSS (type = {})", self.trend.label()))
      .statistic("eta", self.statistic)
      .critical_values(self.critical_values.table())
      .p_value(self.p_value)
      .decision(decision)
      .note(format!("bandwidth: {} lags", self.used_lags))
  }
}

impl ToSummary for FluctuationTest {
  fn to_summary(&self) -> TestSummary {
    let crossed = if self.crosses_boundary { "yes" } else { "no" };
    TestSummary::new(format!("{} test", self.kind.label()))
      .statistic("S0", self.statistic)
      .critical_values(vec![(percent(self.alpha), self.critical_value)])
      .p_value(self.p_value)
      .decision(stability_decision(self.reject_stability()))
      .note(format!("boundary crossed: {crossed}"))
  }
}

impl ToSummary for FStatsTest {
  fn to_summary(&self) -> TestSummary {
    let level = percent(self.alpha);
    TestSummary::new("F statistics (Chow-type)")
      .statistic("supF", self.sup_f.statistic)
      .statistic("aveF", self.ave_f.statistic)
      .statistic("expF", self.exp_f.statistic)
      .critical_values(vec![
        (format!("supF {level}"), self.sup_f.critical_value),
        (format!("aveF {level}"), self.ave_f.critical_value),
        (format!("expF {level}"), self.exp_f.critical_value),
      ])
      .p_value(self.sup_f.p_value)
      .decision(stability_decision(self.reject_stability()))
      .note(format!(
        "supF break after {} (index {})",
        self.break_label, self.break_index
      ))
      .note(format!(
        "aveF p-value {:.4}, expF p-value {:.4}",
        self.ave_f.p_value, self.exp_f.p_value
      ))
      .note(format!("trimming: {}", self.trim))
  }
}

impl ToSummary for BreakpointSearch {
  fn to_summary(&self) -> TestSummary {
    let mut s = TestSummary::new(format!("Breakpoint search (h = {} observations)", self.h))
      .decision(format!(
        "BIC selects {} break(s); RSS criterion selects {}",
        self.bic_choice(),
        self.rss_choice()
      ));
    for m in &self.models {
      s = s
        .statistic(format!("RSS (m = {})", m.breaks), m.rss)
        .statistic(format!("BIC (m = {})", m.breaks), m.bic);
    }
    for m in self.models.iter().skip(1) {
      s = s.note(format!("m = {}: {}", m.breaks, self.break_labels(m.breaks).join(", ")));
    }
    s
  }
}

impl ToSummary for BreakpointFit {
  fn to_summary(&self) -> TestSummary {
    let mut s = TestSummary::new(format!(
      "Breakpoints with {}% confidence intervals",
      self.level * 100.0
    ))
    .decision(format!("{} break(s)", self.breaks.len()));
    for (j, seg) in self.segments.iter().enumerate() {
      s = s
        .statistic(format!("regime {} intercept", j + 1), seg.coefficients[0])
        .statistic(format!("regime {} ar(1)", j + 1), seg.coefficients[1]);
    }
    for (j, b) in self.breaks.iter().enumerate() {
      s = s.note(format!(
        "break {}: {} [{}, {}]",
        j + 1,
        b.label,
        b.lower_label,
        b.upper_label
      ));
    }
    for (j, seg) in self.segments.iter().enumerate() {
      s = s.note(format!(
        "regime {}: {} to {}, sigma^2 = {:.4}",
        j + 1,
        seg.first_label,
        seg.last_label,
        seg.sigma2
      ));
    }
    s
  }
}

impl ToSummary for ZivotAndrewsResult {
  fn to_summary(&self) -> TestSummary {
    TestSummary::new(format!(
      "Zivot-Andrews (model = {}, lags = {})",
      self.model.label(),
      self.used_lags
    ))
    .statistic("t", self.statistic)
    .critical_values(self.critical_values.table())
    .decision(unit_root_decision(self.reject_unit_root))
    .note(format!(
      "potential break after {} (index {})",
      self.break_label, self.break_index
    ))
  }
}
