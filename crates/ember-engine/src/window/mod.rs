//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and drives an [`App`](crate::core::App)
//! through the graphics context's frame protocol.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
