//! ATC sim CLI - scenario driver for the conflict engine.
//!
//! This crate provides:
//! - run_scenario: run a canned or random traffic scenario and report
//!   conflicts, violations and collisions

pub mod config;
pub mod sim;

pub use config::Config;
