//! Questline Runtime — host side of primary-thread dispatch.
//!
//! Provides a dedicated primary thread that quest actions can be scheduled
//! onto, its environment configuration, and tracing setup.

pub mod config;
pub mod error;
pub mod executor;
pub mod telemetry;
