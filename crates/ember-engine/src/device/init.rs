/// What to do when the device reports an error outside of any explicit scope.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorPolicy {
    /// Log the error and terminate the process.
    Fatal,
    /// Log the error, count it, and keep running.
    Log,
}

/// Settings for creating a [`GraphicsContext`](super::GraphicsContext).
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Which adapter to ask for when several are present.
    pub power_preference: wgpu::PowerPreference,

    /// Swap-chain present mode. `Fifo` (vsync) is available everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Pick an 8-bit sRGB swap-chain format if the surface offers one.
    /// Otherwise the surface's first reported format is used.
    pub prefer_srgb: bool,

    /// Compositor alpha mode; falls back to the first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Frames the presentation engine may queue ahead (hint).
    pub desired_maximum_frame_latency: u32,

    /// Clear color of the main render pass.
    pub clear_color: wgpu::Color,

    /// Handling of uncaptured device errors.
    pub error_policy: ErrorPolicy,

    /// Color format of the offscreen target used by headless contexts.
    pub offscreen_format: wgpu::TextureFormat,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::Fifo,
            prefer_srgb: false,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            clear_color: wgpu::Color::BLACK,
            error_policy: ErrorPolicy::Fatal,
            offscreen_format: wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}
