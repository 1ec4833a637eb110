//! Questline Core — quest action contracts and primary-thread dispatch.
//!
//! This crate defines the condition and event contracts every quest action
//! implements, and the wrappers that confine action execution to the primary
//! thread. It contains no scheduler of its own: the host supplies one through
//! [`context::PrimaryThreadContext`].

mod completion;

pub mod condition;
pub mod context;
pub mod error;
pub mod event;
pub mod primary_thread;
pub mod profile;
