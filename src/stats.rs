//! # Stats
//!
//! $$
//! \hat\beta = (X^\top X)^{-1} X^\top y
//! $$
//!
pub mod breaks;
pub mod limits;
pub mod regression;
pub mod stationarity;

#[cfg(test)]
pub(crate) mod testing;
