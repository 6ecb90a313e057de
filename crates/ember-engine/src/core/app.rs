use anyhow::Result;
use winit::event::WindowEvent;

use crate::device::{Frame, GraphicsContext};
use crate::time::FrameTime;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// Per frame the runtime calls `update`, prepares a frame, calls `render` with
/// it and presents it. Resources are created in `init`, once the context
/// exists, and released in `exit`, before the context is torn down.
pub trait App {
    /// Called once after the graphics context is created.
    fn init(&mut self, ctx: &GraphicsContext<'_>) -> Result<()>;

    /// Advances simulation state. Runs before the frame is prepared.
    fn update(&mut self, time: FrameTime) {
        let _ = time;
    }

    /// Records draw calls into `frame`.
    ///
    /// Uniform writes through `ctx.queue()` land before the frame's commands
    /// execute.
    fn render(
        &mut self,
        ctx: &GraphicsContext<'_>,
        frame: &mut Frame,
        time: FrameTime,
    ) -> Result<AppControl>;

    /// Called after the context has been resized to a non-zero size.
    fn resized(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once before the graphics context is released.
    fn exit(&mut self) {}
}
