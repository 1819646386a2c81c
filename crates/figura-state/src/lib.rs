//! Figura State Engine - Effect lifecycle reconciliation
//!
//! This crate implements the effect state machine:
//! - The effect ledger (owned effects and their metadata)
//! - Server event reconciliation (snapshot, added, activated, expired)
//! - Local selection and the predictive countdown

pub mod ledger;
pub mod lifecycle;

pub use ledger::*;
pub use lifecycle::*;
