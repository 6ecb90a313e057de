//! GPU rendering resources.
//!
//! Everything here is created against a [`GraphicsContext`](crate::device::GraphicsContext)
//! and recorded into a [`Frame`](crate::device::Frame)'s render pass.
//!
//! Conventions:
//! - vertex data is de-interleaved: one buffer per attribute, `f32` elements
//! - uniforms are grouped in three tiers (frame, material, draw), binding 0 each
//! - shaders expose `vs_main` / `fs_main`

mod bind_group;
mod buffer;
mod error;
mod pipeline;
mod shader;
pub mod shaders;
pub mod uniforms;
mod vertex_layout;

pub use bind_group::{BindGroup, BindGroupTier, UniformLayout};
pub use buffer::{IndexBuffer, VertexBuffer};
pub use error::ResourceError;
pub use pipeline::{
    blend_state, depth_stencil_state, primitive_state, RenderPipeline, FRAGMENT_ENTRY,
    VERTEX_ENTRY,
};
pub use shader::ShaderModule;
pub use uniforms::{DrawUniforms, FrameUniforms, MaterialUniforms};
pub use vertex_layout::VertexLayout;
