//! Branch prediction unit (BRU).
//!
//! This module contains the branch target buffer (BTB), the return address
//! stack (RAS), and the [`Bpu`] facade the stage handlers talk to.

/// Probe / add / update facade over the BTB and RAS.
pub mod bpu;

/// Branch Target Buffer for storing predicted branch targets.
pub mod btb;

/// Return Address Stack for predicting return addresses.
pub mod ras;

pub use self::bpu::Bpu;
pub use self::btb::{Btb, BtbHandle};
pub use self::ras::Ras;
