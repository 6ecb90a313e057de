//! Core engine-facing contracts.
//!
//! The interface between the runtime (platform loop) and applications.

mod app;

pub use app::{App, AppControl};
