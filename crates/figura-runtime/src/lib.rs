//! Figura Runtime - The avatar editor
//!
//! This crate wires the engine together:
//! - [`EditorOrchestrator`]: figures per gender, category tabs, server
//!   events, editor actions and saving
//! - [`CountdownDriver`]: tokio task ticking the active effect countdown
//! - Configuration, local look persistence, wardrobe slots, link commands
//! - Logging initialization

pub mod config;
pub mod driver;
pub mod editor;
pub mod link;
pub mod logging;
pub mod outbox;
pub mod randomize;
pub mod store;
pub mod wardrobe;

pub use config::*;
pub use driver::*;
pub use editor::*;
pub use link::*;
pub use logging::*;
pub use outbox::*;
pub use randomize::*;
pub use store::*;
pub use wardrobe::*;
