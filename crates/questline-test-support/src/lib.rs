//! Shared test mocks and utilities for the Questline engine.

mod actions;
mod context;

pub use actions::{RecordedCall, RecordingCondition, RecordingEvent, test_profile};
pub use context::FakeExecutionContext;
