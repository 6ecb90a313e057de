//! Ember engine crate.
//!
//! A small wgpu renderer core: device negotiation, a graphics context with a
//! strict prepare/present frame protocol, GPU resource wrappers and a winit
//! runtime that drives an [`App`](core::App).

pub mod core;
pub mod device;
pub mod geometry;
pub mod render;
pub mod time;
pub mod window;

pub mod logging;

#[cfg(test)]
mod test_support;
