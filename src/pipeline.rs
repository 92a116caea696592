//! # Pipeline
//!
//! $$
//! y \to \{\text{ADF}, \text{PP}\} \to \text{KPSS} \to (y_t, y_{t-1}) \to
//! \{\text{CUSUM}, F, \text{BP}, \text{ZA}\}
//! $$
//!
//! One linear pass; the first failing step ends the run.
use crate::error::Result;
use crate::report::Reporter;
use crate::report::ToSummary;
use crate::report::figure::breakpoints_figure;
use crate::report::figure::f_stats_figure;
use crate::report::figure::fluctuation_figure;
use crate::report::figure::series_figure;
use crate::report::figure::zivot_andrews_figure;
use crate::series::MonthlySeries;
use crate::stats::breaks::breakpoints::BreakpointConfig;
use crate::stats::breaks::breakpoints::BreakpointFit;
use crate::stats::breaks::breakpoints::BreakpointSearch;
use crate::stats::breaks::breakpoints::breakpoints;
use crate::stats::breaks::design::Ar1Design;
use crate::stats::breaks::efp::FluctuationConfig;
use crate::stats::breaks::efp::FluctuationTest;
use crate::stats::breaks::efp::fluctuation_test;
use crate::stats::breaks::fstats::FStatsConfig;
use crate::stats::breaks::fstats::FStatsTest;
use crate::stats::breaks::fstats::f_statistics;
use crate::stats::breaks::zivot_andrews::ZivotAndrewsConfig;
use crate::stats::breaks::zivot_andrews::ZivotAndrewsResult;
use crate::stats::breaks::zivot_andrews::zivot_andrews_test;
use crate::stats::stationarity::BandwidthRule;
use crate::stats::stationarity::DeterministicTerm;
use crate::stats::stationarity::LagSelection;
use crate::stats::stationarity::adf::ADFConfig;
use crate::stats::stationarity::adf::ADFResult;
use crate::stats::stationarity::adf::adf_test;
use crate::stats::stationarity::kpss::KPSSConfig;
use crate::stats::stationarity::kpss::KPSSResult;
use crate::stats::stationarity::kpss::KPSSTrend;
use crate::stats::stationarity::kpss::kpss_test;
use crate::stats::stationarity::phillips_perron::PhillipsPerronConfig;
use crate::stats::stationarity::phillips_perron::PhillipsPerronResult;
use crate::stats::stationarity::phillips_perron::phillips_perron_test;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
  /// One ADF run per entry.
  pub adf: Vec<ADFConfig>,
  /// One Phillips-Perron run per entry.
  pub phillips_perron: Vec<PhillipsPerronConfig>,
  pub kpss: KPSSConfig,
  pub fluctuation: FluctuationConfig,
  pub f_stats: FStatsConfig,
  pub breakpoints: BreakpointConfig,
  pub zivot_andrews: ZivotAndrewsConfig,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    let adf = [
      DeterministicTerm::None,
      DeterministicTerm::Constant,
      DeterministicTerm::ConstantTrend,
    ]
    .into_iter()
    .map(|deterministic| ADFConfig {
      deterministic,
      lag_selection: LagSelection::Bic,
      max_lags: Some(10),
      ..ADFConfig::default()
    })
    .collect();

    let phillips_perron = [DeterministicTerm::Constant, DeterministicTerm::ConstantTrend]
      .into_iter()
      .map(|deterministic| PhillipsPerronConfig {
        deterministic,
        bandwidth: BandwidthRule::Long,
        ..PhillipsPerronConfig::default()
      })
      .collect();

    Self {
      adf,
      phillips_perron,
      kpss: KPSSConfig {
        trend: KPSSTrend::Trend,
        bandwidth: BandwidthRule::Short,
        ..KPSSConfig::default()
      },
      fluctuation: FluctuationConfig::default(),
      f_stats: FStatsConfig::default(),
      breakpoints: BreakpointConfig::default(),
      zivot_andrews: ZivotAndrewsConfig::default(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
  pub adf: Vec<ADFResult>,
  pub phillips_perron: Vec<PhillipsPerronResult>,
  pub kpss: KPSSResult,
  pub fluctuation: FluctuationTest,
  pub f_stats: FStatsTest,
  pub breakpoints: BreakpointSearch,
  /// Fit at the BIC choice.
  pub bic_fit: BreakpointFit,
  /// Fit at the RSS choice, when it differs from the BIC one.
  pub rss_fit: Option<BreakpointFit>,
  pub zivot_andrews: ZivotAndrewsResult,
}

/// Run every step on `series`, reporting as it goes.
pub fn run(series: &MonthlySeries, cfg: &PipelineConfig, reporter: &mut dyn Reporter) -> Result<PipelineOutcome> {
  tracing::info!(
    observations = series.len(),
    first = %series.label(0),
    last = %series.label(series.len() - 1),
    "series loaded"
  );
  reporter.figure(&series_figure(series))?;
  let y = series.values();

  let mut adf = Vec::with_capacity(cfg.adf.len());
  for c in &cfg.adf {
    let res = adf_test(y, *c)?;
    tracing::info!(
      deterministic = c.deterministic.label(),
      statistic = res.statistic,
      lags = res.used_lags,
      reject = res.reject_unit_root,
      "ADF"
    );
    reporter.summary(&res.to_summary())?;
    adf.push(res);
  }

  let mut phillips_perron = Vec::with_capacity(cfg.phillips_perron.len());
  for c in &cfg.phillips_perron {
    let res = phillips_perron_test(y, *c)?;
    tracing::info!(
      deterministic = c.deterministic.label(),
      statistic = res.statistic,
      lags = res.used_lags,
      "Phillips-Perron"
    );
    reporter.summary(&res.to_summary())?;
    phillips_perron.push(res);
  }

  let kpss = kpss_test(y, cfg.kpss)?;
  tracing::info!(
    trend = cfg.kpss.trend.label(),
    statistic = kpss.statistic,
    reject = kpss.reject_stationarity,
    "KPSS"
  );
  reporter.summary(&kpss.to_summary())?;

  let design = Ar1Design::from_series(series)?;
  tracing::info!(rows = design.len(), "AR(1) design built");

  let fluctuation = fluctuation_test(&design, cfg.fluctuation)?;
  tracing::info!(
    kind = fluctuation.kind.label(),
    statistic = fluctuation.statistic,
    p_value = fluctuation.p_value,
    "fluctuation test"
  );
  reporter.summary(&fluctuation.to_summary())?;
  reporter.figure(&fluctuation_figure(&fluctuation))?;

  let f_stats = f_statistics(&design, cfg.f_stats)?;
  tracing::info!(
    sup_f = f_stats.sup_f.statistic,
    p_value = f_stats.sup_f.p_value,
    break_label = %f_stats.break_label,
    "F statistics"
  );
  reporter.summary(&f_stats.to_summary())?;
  reporter.figure(&f_stats_figure(&f_stats))?;

  let search = breakpoints(&design, cfg.breakpoints)?;
  let (bic_m, rss_m) = (search.bic_choice(), search.rss_choice());
  tracing::info!(bic_choice = bic_m, rss_choice = rss_m, h = search.h, "breakpoint search");
  reporter.summary(&search.to_summary())?;

  let bic_fit = search.fit(bic_m)?;
  reporter.summary(&bic_fit.to_summary())?;
  reporter.figure(&breakpoints_figure(series, &bic_fit))?;
  let rss_fit = if rss_m != bic_m {
    let fit = search.fit(rss_m)?;
    reporter.summary(&fit.to_summary())?;
    Some(fit)
  } else {
    None
  };

  let zivot_andrews = zivot_andrews_test(series, cfg.zivot_andrews)?;
  tracing::info!(
    model = cfg.zivot_andrews.model.label(),
    statistic = zivot_andrews.statistic,
    break_label = %zivot_andrews.break_label,
    "Zivot-Andrews"
  );
  reporter.summary(&zivot_andrews.to_summary())?;
  reporter.figure(&zivot_andrews_figure(&zivot_andrews))?;

  Ok(PipelineOutcome {
    adf,
    phillips_perron,
    kpss,
    fluctuation,
    f_stats,
    breakpoints: search,
    bic_fit,
    rss_fit,
    zivot_andrews,
  })
}
