use anyhow::{bail, Context, Result};
use bytemuck::Pod;

use crate::device::{DepthTexture, GraphicsContext};

use super::bind_group::{BindGroup, BindGroupTier, UniformLayout};
use super::shader::ShaderModule;
use super::uniforms::{DrawUniforms, FrameUniforms, MaterialUniforms};
use super::vertex_layout::VertexLayout;
use super::ResourceError;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Triangle list, counter-clockwise front faces, no culling.
pub fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}

/// Straight alpha blending on color and alpha.
pub fn blend_state() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// Less-than depth test with writes; stencil passes everything and keeps it.
pub fn depth_stencil_state() -> wgpu::DepthStencilState {
    let face = wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Always,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    };
    wgpu::DepthStencilState {
        format: DepthTexture::FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xFFFF_FFFF,
            write_mask: 0xFFFF_FFFF,
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Compiled render pipeline with its three uniform tiers.
///
/// The pipeline owns one layout and one default bind group per
/// [`BindGroupTier`], indexed by tier. `bind` sets the pipeline together with
/// all three groups; uniforms are updated through `write_uniforms`.
pub struct RenderPipeline {
    pipeline: wgpu::RenderPipeline,
    pipeline_layout: wgpu::PipelineLayout,
    layouts: Vec<UniformLayout>,
    bind_groups: Vec<BindGroup>,
    vertex_layout: VertexLayout,
    color_format: wgpu::TextureFormat,
}

impl RenderPipeline {
    /// Builds the pipeline from WGSL sources for the vertex and fragment stages.
    ///
    /// The sources must define `vs_main` and `fs_main` and the three uniform
    /// groups. The shader modules are dropped once the pipeline exists.
    ///
    /// Device errors raised while compiling are returned as `Err` whatever the
    /// context's error policy. The bind groups start out holding the `Default`
    /// uniforms of their tier.
    pub fn new(ctx: &GraphicsContext<'_>, vertex_src: &str, fragment_src: &str) -> Result<Self> {
        let device = ctx.device();
        let color_format = ctx.surface_format();

        let vertex_layout = VertexLayout::standard();

        let layouts = BindGroupTier::ALL
            .iter()
            .map(|&tier| UniformLayout::for_tier(device, tier))
            .collect::<Result<Vec<_>, ResourceError>>()
            .context("failed to create uniform layouts")?;

        let bind_groups = BindGroupTier::ALL
            .iter()
            .zip(&layouts)
            .map(|(&tier, layout)| {
                BindGroup::new(
                    ctx,
                    layout,
                    tier.uniform_size(),
                    &format!("ember {} uniforms", tier.label()),
                )
            })
            .collect::<Result<Vec<_>, ResourceError>>()
            .context("failed to create default bind groups")?;

        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().map(|l| l.layout()).collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ember pipeline layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let (pipeline, errors) = ctx.capture_device_errors(|| {
            let vertex = ShaderModule::from_wgsl(device, vertex_src, "ember vertex shader");
            let fragment = ShaderModule::from_wgsl(device, fragment_src, "ember fragment shader");
            let buffers = vertex_layout.buffers();

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("ember render pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex.module(),
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment.module(),
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(blend_state()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: primitive_state(),
                depth_stencil: Some(depth_stencil_state()),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview_mask: None,
                cache: None,
            })
        });
        if errors > 0 {
            log::error!("render pipeline rejected by the device ({errors} error(s))");
            bail!("render pipeline creation failed with {errors} device error(s)");
        }

        log::info!(
            "render pipeline created (color {color_format:?}, depth {:?})",
            DepthTexture::FORMAT
        );

        let pipeline = Self {
            pipeline,
            pipeline_layout,
            layouts,
            bind_groups,
            vertex_layout,
            color_format,
        };
        pipeline.seed_defaults(ctx.queue())?;
        Ok(pipeline)
    }

    fn seed_defaults(&self, queue: &wgpu::Queue) -> Result<(), ResourceError> {
        self.write_uniforms(queue, BindGroupTier::Frame, &FrameUniforms::default())?;
        self.write_uniforms(queue, BindGroupTier::Material, &MaterialUniforms::default())?;
        self.write_uniforms(queue, BindGroupTier::Draw, &DrawUniforms::default())
    }

    /// Sets the pipeline and the three default bind groups on `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        for (tier, group) in BindGroupTier::ALL.iter().zip(&self.bind_groups) {
            pass.set_bind_group(tier.index(), group.bind_group(), &[]);
        }
    }

    /// Uploads the uniform block of `tier`.
    pub fn write_uniforms<T: Pod>(
        &self,
        queue: &wgpu::Queue,
        tier: BindGroupTier,
        value: &T,
    ) -> Result<(), ResourceError> {
        self.bind_group(tier).write(queue, value)
    }

    pub fn layout(&self, tier: BindGroupTier) -> &UniformLayout {
        &self.layouts[tier.index() as usize]
    }

    pub fn bind_group(&self, tier: BindGroupTier) -> &BindGroup {
        &self.bind_groups[tier.index() as usize]
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn pipeline_layout(&self) -> &wgpu::PipelineLayout {
        &self.pipeline_layout
    }

    pub fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Releases the pipeline together with the layouts and bind groups it created.
    pub fn release(self) {
        let RenderPipeline {
            pipeline,
            pipeline_layout,
            layouts,
            bind_groups,
            ..
        } = self;

        drop(pipeline);
        drop(pipeline_layout);
        for group in bind_groups {
            group.release();
        }
        drop(layouts);

        log::debug!("render pipeline released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders;
    use crate::test_support::test_context;

    #[test]
    fn fixed_state_matches_renderer_conventions() {
        let primitive = primitive_state();
        assert_eq!(primitive.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(primitive.front_face, wgpu::FrontFace::Ccw);
        assert_eq!(primitive.cull_mode, None);

        let blend = blend_state();
        assert_eq!(blend.color, blend.alpha);
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);

        let depth = depth_stencil_state();
        assert_eq!(depth.format, wgpu::TextureFormat::Depth24PlusStencil8);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
        assert!(depth.depth_write_enabled);
        assert_eq!(depth.stencil.read_mask, 0xFFFF_FFFF);
        assert_eq!(depth.stencil.front.compare, wgpu::CompareFunction::Always);
        assert_eq!(depth.bias.constant, 0);
        assert_eq!(depth.bias.slope_scale, 0.0);
    }

    #[test]
    fn basic_shader_builds_a_pipeline() {
        let Some(ctx) = test_context(64, 64) else {
            return;
        };
        let pipeline = RenderPipeline::new(&ctx, shaders::BASIC, shaders::BASIC).unwrap();

        for tier in BindGroupTier::ALL {
            assert_eq!(pipeline.layout(tier).size(), tier.uniform_size());
            assert_eq!(pipeline.bind_group(tier).size(), tier.uniform_size());
        }
        assert_eq!(pipeline.vertex_layout().strides(), &[3, 3, 2]);
        assert_eq!(pipeline.color_format(), ctx.surface_format());
        assert_eq!(ctx.uncaptured_error_count(), 0);
        pipeline.release();
    }

    #[test]
    fn uniforms_go_to_their_tier() {
        let Some(ctx) = test_context(64, 64) else {
            return;
        };
        let pipeline = RenderPipeline::new(&ctx, shaders::BASIC, shaders::BASIC).unwrap();
        let queue = ctx.queue();

        pipeline
            .write_uniforms(queue, BindGroupTier::Frame, &FrameUniforms::default())
            .unwrap();
        pipeline
            .write_uniforms(queue, BindGroupTier::Material, &MaterialUniforms::default())
            .unwrap();
        pipeline
            .write_uniforms(queue, BindGroupTier::Draw, &DrawUniforms::default())
            .unwrap();
        assert!(pipeline
            .write_uniforms(queue, BindGroupTier::Draw, &MaterialUniforms::default())
            .is_err());
        assert_eq!(ctx.uncaptured_error_count(), 0);
    }

    #[test]
    fn invalid_shader_is_an_error() {
        let Some(ctx) = test_context(64, 64) else {
            return;
        };
        let result = RenderPipeline::new(&ctx, "this is not wgsl", shaders::BASIC);
        assert!(result.is_err());
        assert!(ctx.uncaptured_error_count() > 0);
    }

    #[test]
    fn invalid_shader_is_an_error_under_fatal_policy() {
        let config = crate::device::ContextConfig::default();
        assert_eq!(config.error_policy, crate::device::ErrorPolicy::Fatal);
        let Ok(ctx) = GraphicsContext::headless(16, 16, config) else {
            return;
        };

        // Reaching the assertions at all means the process was not terminated.
        let result = RenderPipeline::new(&ctx, shaders::BASIC, "fn fs_main( {");
        assert!(result.is_err());
        assert!(ctx.uncaptured_error_count() > 0);

        let pipeline = RenderPipeline::new(&ctx, shaders::BASIC, shaders::BASIC).unwrap();
        pipeline.release();
    }
}
