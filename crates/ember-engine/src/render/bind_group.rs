use std::num::NonZeroU64;

use bytemuck::Pod;

use crate::device::GraphicsContext;

use super::uniforms::{DrawUniforms, FrameUniforms, MaterialUniforms};
use super::ResourceError;

/// Bind-group slots shared by every pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BindGroupTier {
    /// Camera and time; changes once per frame.
    Frame = 0,
    /// Material parameters.
    Material = 1,
    /// Per-draw transform.
    Draw = 2,
}

impl BindGroupTier {
    /// Pipeline layout order.
    pub const ALL: [BindGroupTier; 3] = [Self::Frame, Self::Material, Self::Draw];

    /// Group index in the shader (`@group(n)`).
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Uniform block size bound at this tier.
    pub const fn uniform_size(self) -> u64 {
        match self {
            Self::Frame => std::mem::size_of::<FrameUniforms>() as u64,
            Self::Material => std::mem::size_of::<MaterialUniforms>() as u64,
            Self::Draw => std::mem::size_of::<DrawUniforms>() as u64,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::Material => "material",
            Self::Draw => "draw",
        }
    }
}

/// Layout with a single uniform buffer at binding 0, visible to vertex and
/// fragment stages.
pub struct UniformLayout {
    layout: wgpu::BindGroupLayout,
    size: u64,
    label: String,
}

impl UniformLayout {
    pub fn new(device: &wgpu::Device, size: u64, label: &str) -> Result<Self, ResourceError> {
        let min_binding_size = NonZeroU64::new(size).ok_or_else(|| ResourceError::EmptyBuffer {
            label: label.to_owned(),
        })?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(min_binding_size),
                },
                count: None,
            }],
        });

        Ok(Self {
            layout,
            size,
            label: label.to_owned(),
        })
    }

    /// Layout for the uniform block of `tier`.
    pub fn for_tier(device: &wgpu::Device, tier: BindGroupTier) -> Result<Self, ResourceError> {
        Self::new(
            device,
            tier.uniform_size(),
            &format!("ember {} uniform layout", tier.label()),
        )
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Binding size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A uniform buffer plus the bind group exposing it at binding 0.
pub struct BindGroup {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    size: u64,
    label: String,
}

impl BindGroup {
    pub const USAGE: wgpu::BufferUsages =
        wgpu::BufferUsages::COPY_DST.union(wgpu::BufferUsages::UNIFORM);

    /// Creates the uniform buffer and its bind group. `size` must equal the
    /// layout's binding size.
    pub fn new(
        ctx: &GraphicsContext<'_>,
        layout: &UniformLayout,
        size: u64,
        label: &str,
    ) -> Result<Self, ResourceError> {
        check_size(label, layout.size(), size)?;

        let device = ctx.device();
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: Self::USAGE,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: layout.layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(size),
                }),
            }],
        });

        log::debug!("bind group `{label}` created ({size} bytes)");

        Ok(Self {
            buffer,
            bind_group,
            size,
            label: label.to_owned(),
        })
    }

    /// Uploads `value` at offset 0. Its size must equal the buffer size.
    pub fn write<T: Pod>(&self, queue: &wgpu::Queue, value: &T) -> Result<(), ResourceError> {
        self.write_bytes(queue, bytemuck::bytes_of(value))
    }

    pub fn write_bytes(&self, queue: &wgpu::Queue, bytes: &[u8]) -> Result<(), ResourceError> {
        check_size(&self.label, self.size, bytes.len() as u64)?;
        queue.write_buffer(&self.buffer, 0, bytes);
        Ok(())
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Destroys the uniform buffer now; the bind group goes with it.
    pub fn release(self) {
        self.buffer.destroy();
        log::debug!("bind group `{}` released", self.label);
    }
}

fn check_size(label: &str, expected: u64, actual: u64) -> Result<(), ResourceError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ResourceError::UniformSizeMismatch {
            label: label.to_owned(),
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;

    #[test]
    fn tiers_are_ordered_and_sized() {
        let indices: Vec<u32> = BindGroupTier::ALL.iter().map(|t| t.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(BindGroupTier::Frame.uniform_size(), 208);
        assert_eq!(BindGroupTier::Material.uniform_size(), 16);
        assert_eq!(BindGroupTier::Draw.uniform_size(), 64);
    }

    #[test]
    fn buffer_is_exactly_the_binding_size() {
        let Some(ctx) = test_context(8, 8) else {
            return;
        };
        let layout = UniformLayout::for_tier(ctx.device(), BindGroupTier::Frame).unwrap();
        let group = BindGroup::new(&ctx, &layout, layout.size(), "frame uniforms").unwrap();

        assert_eq!(group.size(), 208);
        assert_eq!(group.buffer().size(), 208);
        assert_eq!(
            group.buffer().usage(),
            wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM
        );
    }

    #[test]
    fn size_mismatch_is_caught_before_the_driver() {
        let Some(ctx) = test_context(8, 8) else {
            return;
        };
        let layout = UniformLayout::new(ctx.device(), 64, "draw uniforms").unwrap();

        assert!(matches!(
            BindGroup::new(&ctx, &layout, 32, "too small"),
            Err(ResourceError::UniformSizeMismatch { expected: 64, actual: 32, .. })
        ));

        let group = BindGroup::new(&ctx, &layout, 64, "draw uniforms").unwrap();
        assert!(matches!(
            group.write(ctx.queue(), &MaterialUniforms::default()),
            Err(ResourceError::UniformSizeMismatch { expected: 64, actual: 16, .. })
        ));
        assert!(group.write(ctx.queue(), &DrawUniforms::default()).is_ok());
        assert_eq!(ctx.uncaptured_error_count(), 0);
    }

    #[test]
    fn zero_sized_layout_is_rejected() {
        let Some(ctx) = test_context(8, 8) else {
            return;
        };
        assert!(matches!(
            UniformLayout::new(ctx.device(), 0, "empty"),
            Err(ResourceError::EmptyBuffer { .. })
        ));
    }
}
