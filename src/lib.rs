//! # structbreak-rs
//!
//! $$
//! y_t = \mu_j + \phi_j y_{t-1} + u_t,\qquad t \in (T_{j-1}, T_j]
//! $$
//!
//! Unit-root, stationarity and structural-break analysis of a monthly series.
pub mod error;
pub mod pipeline;
pub mod report;
pub mod series;
pub mod stats;

pub use error::Error;
pub use error::Result;
