//! Built-in WGSL sources.

/// Pass-through shader: transforms by `proj_view * model` and outputs the
/// material color with a time-animated green channel.
pub const BASIC: &str = include_str!("basic.wgsl");
