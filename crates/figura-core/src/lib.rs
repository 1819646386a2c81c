//! Figura Core - Fundamental avatar types
//!
//! This crate defines the types shared by every other Figura crate:
//! - Identifiers (EffectId, ObjectId)
//! - Figure strings and the per-gender FigureData model
//! - Gender and direction primitives
//! - Inbound server events and outgoing protocol messages

pub mod id;
pub mod figure;
pub mod figure_data;
pub mod event;
pub mod error;

pub use id::*;
pub use figure::*;
pub use figure_data::*;
pub use event::*;
pub use error::*;
