//! Figura Test Harness - Session simulation and invariant checks
//!
//! This crate provides:
//! - A seeded session simulator driving the editor with random server
//!   events, clicks, visibility changes and countdown ticks
//! - Invariant checks run after every simulated step
//! - Property helpers shared by the crate tests

pub mod simulator;

pub use simulator::*;
