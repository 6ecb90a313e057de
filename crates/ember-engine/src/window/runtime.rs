use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl};
use crate::device::{ContextConfig, FrameError, GraphicsContext, SurfaceErrorAction};
use crate::time::{FpsCounter, FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Append the measured frame rate to the window title once per second.
    pub show_fps: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ember".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            show_fps: true,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, creates its graphics context and drives `app` until
    /// the window closes, Escape is pressed or the app asks to exit.
    ///
    /// Returns the first fatal error (context creation, `App::init`, a failed
    /// frame).
    pub fn run<A>(config: RuntimeConfig, context_config: ContextConfig, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, context_config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// The window and the context whose surface borrows it.
///
/// `ctx` is taken and released before the entry (and the window) drops.
#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    fps: FpsCounter,

    window: Window,

    #[borrows(window)]
    #[covariant]
    ctx: Option<GraphicsContext<'this>>,
}

/// What happened to one redraw.
#[derive(Debug)]
pub(crate) enum FrameOutcome {
    Presented(AppControl),
    Skipped,
    Failed(anyhow::Error),
}

/// One iteration of the frame loop: update, prepare, render, present.
///
/// Surface errors are routed through `handle_surface_error`; a minimized
/// target skips the frame.
pub(crate) fn drive_frame<A: App>(
    app: &mut A,
    ctx: &mut GraphicsContext<'_>,
    time: FrameTime,
) -> FrameOutcome {
    app.update(time);

    let mut frame = match ctx.prepare_frame() {
        Ok(frame) => frame,
        Err(FrameError::Minimized) => return FrameOutcome::Skipped,
        Err(FrameError::Surface(err)) => {
            return match ctx.handle_surface_error(&err) {
                SurfaceErrorAction::Fatal => {
                    FrameOutcome::Failed(anyhow!("unrecoverable surface error: {err}"))
                }
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    FrameOutcome::Skipped
                }
            };
        }
        Err(e) => return FrameOutcome::Failed(e.into()),
    };

    let control = match app.render(ctx, &mut frame, time) {
        Ok(control) => control,
        Err(e) => {
            if let Err(discard) = ctx.discard_frame(frame) {
                log::warn!("could not discard frame after render error: {discard}");
            }
            return FrameOutcome::Failed(e.context("render failed"));
        }
    };

    match ctx.present_frame(frame) {
        Ok(()) => FrameOutcome::Presented(control),
        Err(e) => FrameOutcome::Failed(e.into()),
    }
}

pub(crate) fn fps_title(title: &str, fps: f32) -> String {
    format!("{title} - {fps:.0} fps")
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    context_config: ContextConfig,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, context_config: ContextConfig, app: A) -> Self {
        Self {
            config,
            context_config,
            app,
            entry: None,
            exit_requested: false,
            error: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let context_config = self.context_config.clone();

        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            fps: FpsCounter::new(),
            window,
            ctx_builder: |w| GraphicsContext::new(w, context_config).map(Some),
        }
        .try_build()
        .context("graphics context initialization failed")?;

        let app = &mut self.app;
        entry.with_ctx(|ctx| match ctx {
            Some(ctx) => app.init(ctx),
            None => Ok(()),
        })?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.shutdown(event_loop);
    }

    /// Calls `App::exit`, releases the context, then drops the window.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;

        if let Some(mut entry) = self.entry.take() {
            self.app.exit();
            entry.with_ctx_mut(|ctx| {
                if let Some(ctx) = ctx.take() {
                    ctx.release();
                }
            });
            drop(entry);
            log::info!("window closed");
        }

        event_loop.exit();
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let app = &mut self.app;

        entry.with_mut(|fields| {
            let Some(ctx) = fields.ctx.as_mut() else {
                return;
            };
            match ctx.resize(width, height) {
                Ok(()) if !ctx.is_minimized() => app.resized(width, height),
                Ok(()) => {}
                Err(e) => log::warn!("resize to {width}x{height} ignored: {e}"),
            }
            // Long pauses while resizing should not show up as one huge step.
            fields.clock.reset();
            fields.window.request_redraw();
        });
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let app = &mut self.app;
        let show_fps = self.config.show_fps;
        let title = self.config.title.as_str();

        let outcome = entry.with_mut(|fields| {
            let Some(ctx) = fields.ctx.as_mut() else {
                return FrameOutcome::Skipped;
            };

            let time = fields.clock.tick();
            if show_fps {
                if let Some(fps) = fields.fps.record(time.dt) {
                    fields.window.set_title(&fps_title(title, fps));
                }
            }

            drive_frame(app, ctx, time)
        });

        match outcome {
            FrameOutcome::Presented(AppControl::Continue) | FrameOutcome::Skipped => {}
            FrameOutcome::Presented(AppControl::Exit) => self.shutdown(event_loop),
            FrameOutcome::Failed(e) => self.fail(event_loop, e),
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("failed to create initial window"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::KeyboardInput { event: key, .. }
                if key.state == ElementState::Pressed
                    && key.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.shutdown(event_loop)
            }

            WindowEvent::Resized(size) => self.resize(size.width, size.height),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown(event_loop);
    }
}
