use std::fmt::Write as _;
use std::fs;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;
use structbreak_rs::Error;
use structbreak_rs::pipeline::PipelineConfig;
use structbreak_rs::pipeline::run;
use structbreak_rs::report::ConsoleReporter;
use structbreak_rs::report::PlotlyReporter;
use structbreak_rs::report::ReportSet;
use structbreak_rs::series::MonthlySeries;

const N: usize = 276;

fn jan_1996() -> NaiveDate {
  NaiveDate::from_ymd_opt(1996, 1, 1).unwrap()
}

/// Positive, persistent series with a level change in early 2013, written the way R's `write.table` does.
fn synthetic_table() -> String {
  let mut rng = StdRng::seed_from_u64(276);
  let noise = Normal::new(0.0, 0.05).unwrap();
  let mut x = 0.3;
  let mut out = String::from("\"x\"\n");
  for t in 0..N {
    let level = if t >= 206 { 0.6 } else { 0.3 };
    x = level + 0.5 * (x - level) + noise.sample(&mut rng);
    writeln!(out, "\"{}\" {x:.6}", t + 1).unwrap();
  }
  out
}

#[test]
fn synthetic_illiquidity_runs_end_to_end() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("illiquidity.txt");
  fs::write(&data, synthetic_table()).unwrap();

  let series = MonthlySeries::from_table_file(&data, jan_1996()).unwrap();
  assert_eq!(series.len(), N);
  assert_eq!(series.last_timestamp(), NaiveDate::from_ymd_opt(2018, 12, 1).unwrap());

  let plots = dir.path().join("plots");
  let mut reporter = ReportSet::new()
    .with(ConsoleReporter::new(std::io::sink()))
    .with(PlotlyReporter::new(&plots).unwrap());
  let outcome = run(&series, &PipelineConfig::default(), &mut reporter).unwrap();

  for name in ["time_series", "fluctuation", "f_statistics", "breakpoints", "zivot_andrews"] {
    assert!(plots.join(format!("{name}.html")).exists(), "{name} not rendered");
  }

  assert_eq!(outcome.adf.len(), 3);
  assert_eq!(outcome.phillips_perron.len(), 2);
  assert!(outcome.f_stats.reject_stability());
  assert!(
    outcome.zivot_andrews.break_label.starts_with("2012") || outcome.zivot_andrews.break_label.starts_with("2013"),
    "Zivot-Andrews break at {}",
    outcome.zivot_andrews.break_label
  );
}

#[test]
fn missing_file_is_a_data_format_error() {
  let dir = tempfile::tempdir().unwrap();
  let err = MonthlySeries::from_table_file(dir.path().join("absent.txt"), jan_1996()).unwrap_err();
  assert!(matches!(err, Error::DataFormat { line: None, .. }), "{err:?}");
}
