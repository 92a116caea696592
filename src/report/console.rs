use std::io::Stdout;
use std::io::Write;

use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;
use prettytable::format;
use prettytable::row;

use super::Reporter;
use super::figure::Figure;
use super::summary::TestSummary;
use crate::error::Result;

/// Prints one table per summary.
pub struct ConsoleReporter<W: Write> {
  out: W,
}

impl ConsoleReporter<Stdout> {
  pub fn stdout() -> Self {
    Self::new(std::io::stdout())
  }
}

impl<W: Write> ConsoleReporter<W> {
  pub fn new(out: W) -> Self {
    Self { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}

pub fn summary_table(summary: &TestSummary) -> Table {
  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_BOX_CHARS);
  table.set_titles(Row::new(vec![Cell::new(&summary.title).with_hspan(2)]));

  for (name, value) in &summary.statistics {
    table.add_row(row![name, format!("{value:.4}")]);
  }
  if !summary.critical_values.is_empty() {
    let cv = summary
      .critical_values
      .iter()
      .map(|(level, v)| format!("{level}: {v:.3}"))
      .collect::<Vec<_>>()
      .join("  ");
    table.add_row(row!["critical values", cv]);
  }
  if let Some(p) = summary.p_value {
    table.add_row(row!["p-value", format!("{p:.4}")]);
  }
  if !summary.decision.is_empty() {
    table.add_row(row!["decision", summary.decision]);
  }
  for note in &summary.notes {
    table.add_row(row!["note", note]);
  }
  table
}

impl<W: Write> Reporter for ConsoleReporter<W> {
  fn summary(&mut self, summary: &TestSummary) -> Result<()> {
    summary_table(summary).print(&mut self.out)?;
    writeln!(self.out)?;
    Ok(())
  }

  fn figure(&mut self, figure: &Figure) -> Result<()> {
    writeln!(self.out, "[figure] {} ({})", figure.title, figure.name)?;
    Ok(())
  }
}
