use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

use super::depth::DepthTexture;
use super::frame::{Frame, FrameState, FrameTarget, FrameTracker};
use super::{negotiate, surface};
use super::{ContextConfig, ErrorPolicy, FrameError, SurfaceErrorAction};

/// Load/store/clear values of the main render pass.
///
/// Built once at context creation; every frame patches in its own backbuffer
/// view and the current depth view.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PassDefaults {
    pub clear_color: wgpu::Color,
    pub depth_clear: f32,
    /// Stencil is mandatory for the combined format but otherwise unused.
    pub stencil_clear: u32,
}

impl PassDefaults {
    pub fn new(clear_color: wgpu::Color) -> Self {
        Self {
            clear_color,
            depth_clear: DepthTexture::CLEAR_VALUE,
            stencil_clear: DepthTexture::STENCIL_CLEAR_VALUE,
        }
    }

    pub fn color_ops(&self) -> wgpu::Operations<wgpu::Color> {
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(self.clear_color),
            store: wgpu::StoreOp::Store,
        }
    }

    pub fn depth_ops(&self) -> wgpu::Operations<f32> {
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(self.depth_clear),
            store: wgpu::StoreOp::Store,
        }
    }

    pub fn stencil_ops(&self) -> wgpu::Operations<u32> {
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(self.stencil_clear),
            store: wgpu::StoreOp::Store,
        }
    }
}

/// Where frames are rendered to.
enum ColorTarget<'w> {
    /// Window swap chain.
    Surface {
        surface: wgpu::Surface<'w>,
        config: wgpu::SurfaceConfiguration,
    },
    /// Offscreen texture (headless contexts).
    Offscreen { texture: wgpu::Texture },
}

/// Owns wgpu core objects, the swap chain and the depth buffer.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - creates and configures the Surface (swap chain) and the depth buffer
/// - hands out one [`Frame`] at a time and submits/presents it
///
/// The surface borrows the window for `'w`; the window must outlive the context.
pub struct GraphicsContext<'w> {
    target: ColorTarget<'w>,
    depth: DepthTexture,

    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
    instance: wgpu::Instance,

    /// Color format of the swap chain (or offscreen target).
    format: wgpu::TextureFormat,

    /// Current drawable size in physical pixels. May be zero while minimized.
    size: (u32, u32),

    pass_defaults: PassDefaults,
    frames: FrameTracker,
    presented: u64,
    errors: Arc<ErrorSink>,
}

/// Uncaptured-error bookkeeping shared with the device callback.
#[derive(Debug, Default)]
struct ErrorSink {
    count: AtomicU64,
    /// Depth of nested `capture_device_errors` calls. While non-zero, errors
    /// are counted but never terminate the process.
    capturing: AtomicU32,
}

impl<'w> GraphicsContext<'w> {
    /// Creates a graphics context bound to a window.
    ///
    /// Fails at the first resource that cannot be created; the context is not
    /// usable in that case.
    pub fn new(window: &'w Window, config: ContextConfig) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = create_instance();

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = negotiate::request_adapter(
            &instance,
            &wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            },
        )?;

        let (device, queue) = negotiate::request_device(&adapter, &device_descriptor(&config))?;
        let errors = install_error_handler(&device, config.error_policy);

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps.formats, config.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&caps.alpha_modes, config.alpha_mode);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: config.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: config.desired_maximum_frame_latency,
        };
        surface.configure(&device, &surface_config);
        log::info!(
            "swap chain configured: {}x{} {:?} {:?}",
            size.width,
            size.height,
            format,
            config.present_mode
        );

        let depth = DepthTexture::new(&device, size.width, size.height);

        Ok(Self {
            target: ColorTarget::Surface {
                surface,
                config: surface_config,
            },
            depth,
            device,
            queue,
            adapter,
            instance,
            format,
            size: (size.width, size.height),
            pass_defaults: PassDefaults::new(config.clear_color),
            frames: FrameTracker::new(),
            presented: 0,
            errors,
        })
    }
}

impl GraphicsContext<'static> {
    /// Creates a context without a window, rendering into an offscreen texture
    /// of `config.offscreen_format`.
    ///
    /// Presenting a headless frame submits the work; there is nothing to show.
    pub fn headless(width: u32, height: u32, config: ContextConfig) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let instance = create_instance();

        let adapter = negotiate::request_adapter(
            &instance,
            &wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        )?;

        let (device, queue) = negotiate::request_device(&adapter, &device_descriptor(&config))?;
        let errors = install_error_handler(&device, config.error_policy);

        let format = config.offscreen_format;
        let texture = create_offscreen_texture(&device, format, width, height);
        let depth = DepthTexture::new(&device, width, height);
        log::info!("headless context created: {width}x{height} {format:?}");

        Ok(Self {
            target: ColorTarget::Offscreen { texture },
            depth,
            device,
            queue,
            adapter,
            instance,
            format,
            size: (width, height),
            pass_defaults: PassDefaults::new(config.clear_color),
            frames: FrameTracker::new(),
            presented: 0,
            errors,
        })
    }
}

impl<'w> GraphicsContext<'w> {
    /// Returns the swap-chain color format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Returns the depth buffer format.
    pub fn depth_format(&self) -> wgpu::TextureFormat {
        DepthTexture::FORMAT
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// True while the drawable has zero area; frames cannot be prepared.
    pub fn is_minimized(&self) -> bool {
        self.size.0 == 0 || self.size.1 == 0
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn depth_texture(&self) -> &DepthTexture {
        &self.depth
    }

    /// Color target of a headless context; `None` for window contexts.
    pub fn offscreen_texture(&self) -> Option<&wgpu::Texture> {
        match &self.target {
            ColorTarget::Offscreen { texture } => Some(texture),
            ColorTarget::Surface { .. } => None,
        }
    }

    pub fn frame_state(&self) -> FrameState {
        self.frames.state()
    }

    pub fn pass_defaults(&self) -> &PassDefaults {
        &self.pass_defaults
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.pass_defaults.clear_color
    }

    /// Changes the clear color used by frames prepared from now on.
    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.pass_defaults.clear_color = color;
    }

    /// Number of frames submitted and presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    /// Number of device errors reported outside of any error scope.
    pub fn uncaptured_error_count(&self) -> u64 {
        self.errors.count.load(Ordering::SeqCst)
    }

    /// Runs `f` and returns how many uncaptured device errors it raised.
    ///
    /// Errors raised inside are logged and counted but do not terminate the
    /// process, whatever the [`ErrorPolicy`]. wgpu reports validation errors
    /// from the creating call, so resource creation can be checked this way.
    pub fn capture_device_errors<R>(&self, f: impl FnOnce() -> R) -> (R, u64) {
        let before = self.errors.count.load(Ordering::SeqCst);
        self.errors.capturing.fetch_add(1, Ordering::SeqCst);
        let out = f();
        self.errors.capturing.fetch_sub(1, Ordering::SeqCst);
        (out, self.errors.count.load(Ordering::SeqCst) - before)
    }

    /// Acquires the backbuffer, creates the frame's command encoder and begins
    /// the main render pass.
    ///
    /// Exactly one frame may be outstanding. A failed backbuffer acquisition is
    /// reported as [`FrameError::Surface`]; the context does not retry.
    pub fn prepare_frame(&mut self) -> Result<Frame, FrameError> {
        self.frames.check_begin()?;
        if self.is_minimized() {
            return Err(FrameError::Minimized);
        }

        let (target, view, color_size) = match &self.target {
            ColorTarget::Surface { surface, .. } => {
                let surface_texture = surface.get_current_texture()?;
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                let size = (
                    surface_texture.texture.width(),
                    surface_texture.texture.height(),
                );
                (FrameTarget::Surface(surface_texture), view, size)
            }
            ColorTarget::Offscreen { texture } => {
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                (
                    FrameTarget::Offscreen,
                    view,
                    (texture.width(), texture.height()),
                )
            }
        };

        let index = self.frames.begin()?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ember frame encoder"),
            });

        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ember main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: self.pass_defaults.color_ops(),
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(self.pass_defaults.depth_ops()),
                    stencil_ops: Some(self.pass_defaults.stencil_ops()),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        Ok(Frame {
            index,
            pass,
            encoder,
            view,
            target,
            color_size,
            depth_size: (self.depth.width(), self.depth.height()),
            guard: self.frames.guard(index),
        })
    }

    /// Ends the frame's render pass, submits its single command buffer and
    /// presents the backbuffer.
    pub fn present_frame(&mut self, frame: Frame) -> Result<(), FrameError> {
        if let Err(e) = self.frames.end(frame.index) {
            log::warn!("present_frame rejected: {e}");
            return Err(e);
        }

        let Frame {
            pass,
            encoder,
            view,
            target,
            ..
        } = frame;

        // Ending the pass unlocks the encoder.
        drop(pass);
        drop(view);

        let commands = encoder.finish();
        self.queue.submit(std::iter::once(commands));

        if let FrameTarget::Surface(surface_texture) = target {
            surface_texture.present();
        }
        self.presented += 1;
        Ok(())
    }

    /// Abandons a prepared frame without submitting it.
    pub fn discard_frame(&mut self, frame: Frame) -> Result<(), FrameError> {
        self.frames.end(frame.index)?;
        log::debug!("frame {} discarded", frame.index);
        drop(frame);
        Ok(())
    }

    /// Recreates the swap chain and the depth buffer at the new size,
    /// preserving formats.
    ///
    /// A zero-sized request is recorded and applied later; frames cannot be
    /// prepared until a non-zero size arrives.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), FrameError> {
        self.frames.ensure_idle()?;

        self.size = (width, height);
        if self.is_minimized() {
            log::debug!("resize to {width}x{height} deferred");
            return Ok(());
        }

        match &mut self.target {
            ColorTarget::Surface { surface, config } => {
                config.width = width;
                config.height = height;
                surface.configure(&self.device, config);
            }
            ColorTarget::Offscreen { texture } => {
                *texture = create_offscreen_texture(&self.device, self.format, width, height);
            }
        }
        self.depth = DepthTexture::new(&self.device, width, height);

        log::debug!("resized to {width}x{height}");
        Ok(())
    }

    /// Re-applies the current swap-chain configuration.
    pub fn reconfigure(&mut self) {
        if self.is_minimized() {
            return;
        }
        if let ColorTarget::Surface { surface, config } = &self.target {
            surface.configure(&self.device, config);
            log::debug!("swap chain reconfigured");
        }
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring the
    /// swap chain when that is the remedy.
    pub fn handle_surface_error(&mut self, err: &wgpu::SurfaceError) -> SurfaceErrorAction {
        let action = surface::classify_surface_error(err);
        match action {
            SurfaceErrorAction::Reconfigured => {
                log::warn!("surface error ({err}); reconfiguring");
                self.reconfigure();
            }
            SurfaceErrorAction::SkipFrame => log::debug!("surface error ({err}); skipping frame"),
            SurfaceErrorAction::Fatal => log::error!("fatal surface error: {err}"),
        }
        action
    }

    /// Tears the context down: swap chain (or offscreen target), device,
    /// surface, adapter, instance, then the depth buffer.
    pub fn release(self) {
        if let FrameState::Prepared { index } = self.frames.state() {
            log::warn!("releasing graphics context while frame {index} is in flight");
        }

        let GraphicsContext {
            target,
            depth,
            device,
            queue,
            adapter,
            instance,
            ..
        } = self;

        let surface = match target {
            ColorTarget::Surface { surface, config } => {
                drop(config);
                Some(surface)
            }
            ColorTarget::Offscreen { texture } => {
                texture.destroy();
                None
            }
        };
        drop(queue);
        drop(device);
        drop(surface);
        drop(adapter);
        drop(instance);
        drop(depth);

        log::debug!("graphics context released");
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

fn device_descriptor(config: &ContextConfig) -> wgpu::DeviceDescriptor<'static> {
    wgpu::DeviceDescriptor {
        label: Some("ember device"),
        required_features: config.required_features,
        required_limits: config.required_limits.clone(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }
}

fn install_error_handler(device: &wgpu::Device, policy: ErrorPolicy) -> Arc<ErrorSink> {
    let sink = Arc::new(ErrorSink::default());
    let seen = Arc::clone(&sink);

    device.on_uncaptured_error(Arc::new(move |error: wgpu::Error| {
        seen.count.fetch_add(1, Ordering::SeqCst);
        log::error!("uncaptured device error: {error}");
        if policy == ErrorPolicy::Fatal && seen.capturing.load(Ordering::SeqCst) == 0 {
            std::process::exit(1);
        }
    }));

    sink
}

fn create_offscreen_texture(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("ember offscreen color target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}
