//! # Structural breaks
//!
//! $$
//! y_t = \beta_{0,j} + \beta_{1,j} y_{t-1} + u_t,\qquad T_{j-1} < t \le T_j
//! $$
//!
//! Every test here works on the same AR(1) design.
pub mod breakpoints;
pub mod design;
pub mod efp;
pub mod fstats;
pub mod zivot_andrews;
