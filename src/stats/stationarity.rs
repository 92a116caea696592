//! Stationarity and unit-root tests.

pub(crate) mod common;

pub mod adf;
pub mod kpss;
pub mod phillips_perron;

pub use common::BandwidthRule;
pub use common::CriticalValues;
pub use common::DeterministicTerm;
pub use common::LagSelection;
