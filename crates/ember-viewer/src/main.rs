use anyhow::{Context, Result};
use glam::{Mat4, Vec3, Vec4};

use ember_engine::core::{App, AppControl};
use ember_engine::device::{ContextConfig, Frame, GraphicsContext};
use ember_engine::geometry::{GpuMesh, PlaneParams, Vertices};
use ember_engine::logging::{init_logging, LoggingConfig};
use ember_engine::render::{
    shaders, BindGroupTier, DrawUniforms, FrameUniforms, MaterialUniforms, RenderPipeline,
};
use ember_engine::time::FrameTime;
use ember_engine::window::{Runtime, RuntimeConfig};

const FOV_Y_DEGREES: f32 = 45.0;
const EYE: Vec3 = Vec3::new(0.0, 0.0, 3.0);
const SPIN_RADIANS_PER_SEC: f32 = 0.8;
const TINT: Vec4 = Vec4::new(0.9, 0.3, 0.2, 1.0);

/// GPU resources, created once the context exists.
struct Scene {
    pipeline: RenderPipeline,
    plane: GpuMesh,
}

/// Spinning, tinted plane.
struct Viewer {
    scene: Option<Scene>,
    aspect: f32,
}

impl Viewer {
    fn new() -> Self {
        Self {
            scene: None,
            aspect: 1.0,
        }
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

fn camera(aspect: f32, time: f32) -> FrameUniforms {
    let projection = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, 0.1, 100.0);
    let view = Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Y);
    FrameUniforms::new(projection, view, time)
}

fn spin(time: f32) -> DrawUniforms {
    DrawUniforms::new(Mat4::from_rotation_y(time * SPIN_RADIANS_PER_SEC))
}

impl App for Viewer {
    fn init(&mut self, ctx: &GraphicsContext<'_>) -> Result<()> {
        let pipeline = RenderPipeline::new(ctx, shaders::BASIC, shaders::BASIC)
            .context("failed to build the basic pipeline")?;

        let vertices = Vertices::plane(&PlaneParams {
            width: 1.5,
            height: 1.5,
            width_segments: 4,
            height_segments: 4,
        });
        let plane = GpuMesh::new(ctx, &vertices, "plane")?;

        let material = MaterialUniforms::new(TINT);
        pipeline.write_uniforms(ctx.queue(), BindGroupTier::Material, &material)?;

        let (width, height) = ctx.size();
        self.aspect = aspect_ratio(width, height);
        self.scene = Some(Scene { pipeline, plane });

        log::info!("viewer ready: {} indices", vertices.index_count());
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &GraphicsContext<'_>,
        frame: &mut Frame,
        time: FrameTime,
    ) -> Result<AppControl> {
        let Some(scene) = &self.scene else {
            return Ok(AppControl::Continue);
        };

        let queue = ctx.queue();
        scene
            .pipeline
            .write_uniforms(queue, BindGroupTier::Frame, &camera(self.aspect, time.elapsed))?;
        scene
            .pipeline
            .write_uniforms(queue, BindGroupTier::Draw, &spin(time.elapsed))?;

        let pass = frame.pass();
        scene.pipeline.bind(pass);
        scene.plane.bind(pass);
        scene.plane.draw(pass);

        Ok(AppControl::Continue)
    }

    fn resized(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    fn exit(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.plane.release();
            scene.pipeline.release();
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let context_config = ContextConfig {
        clear_color: wgpu::Color {
            r: 0.1,
            g: 0.1,
            b: 0.12,
            a: 1.0,
        },
        ..Default::default()
    };

    Runtime::run(RuntimeConfig::default(), context_config, Viewer::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_survives_minimize() {
        assert_eq!(aspect_ratio(640, 480), 640.0 / 480.0);
        assert_eq!(aspect_ratio(640, 0), 1.0);
    }

    #[test]
    fn plane_center_projects_to_screen_center() {
        let u = camera(aspect_ratio(640, 480), 0.0);
        let proj_view = Mat4::from_cols_array_2d(&u.proj_view);
        let clip = proj_view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn spin_starts_at_identity() {
        assert_eq!(spin(0.0), DrawUniforms::default());
    }
}
