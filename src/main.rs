use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use structbreak_rs::pipeline::PipelineConfig;
use structbreak_rs::pipeline::run;
use structbreak_rs::report::ConsoleReporter;
use structbreak_rs::report::PlotlyReporter;
use structbreak_rs::report::ReportSet;
use structbreak_rs::series::MonthlySeries;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATA: &str = "data/illiquidity.txt";
const DEFAULT_OUTPUT: &str = "plots";

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| "structbreak_rs=info".into()),
    )
    .init();

  let mut args = std::env::args().skip(1);
  let data = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_DATA.into()));
  let output = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT.into()));
  if let Some(extra) = args.next() {
    anyhow::bail!("unexpected argument {extra:?}; usage: structbreak-rs [DATA_FILE] [OUTPUT_DIR]");
  }

  let start = NaiveDate::from_ymd_opt(1996, 1, 1).context("invalid series start")?;
  let series = MonthlySeries::from_table_file(&data, start)
    .with_context(|| format!("loading {}", data.display()))?;

  let plots = PlotlyReporter::new(&output)
    .with_context(|| format!("preparing output directory {}", output.display()))?;
  let mut reporter = ReportSet::new()
    .with(ConsoleReporter::stdout())
    .with(plots);

  let outcome = run(&series, &PipelineConfig::default(), &mut reporter).context("analysis halted")?;
  tracing::info!(
    zivot_andrews_break = %outcome.zivot_andrews.break_label,
    bic_breaks = outcome.bic_fit.breaks.len(),
    output = %output.display(),
    "analysis complete"
  );
  Ok(())
}
