//! Commission calculators
//!
//! Pure functions over a member snapshot, sale events, a downline tree and
//! the typed rate views. Each consults the eligibility gate before anything
//! else; an ineligible earner gets a zero result, never an error.
//!
//! - [`isp`] - direct sale commission
//! - [`qpb`] - cycle bonus on sets of direct sales
//! - [`tsc`] - generational team commission

pub mod cycle;
pub mod isp;
pub mod qpb;
pub mod tsc;

pub use cycle::CycleWindow;
pub use isp::{IspResult, calculate_isp};
pub use qpb::{CycleSet, QpbResult, calculate_qpb};
pub use tsc::{TscResult, calculate_tsc};
