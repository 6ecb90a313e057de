/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Violations of the prepare/present frame protocol.
///
/// Every frame must be acquired with `prepare_frame` and handed back exactly
/// once through `present_frame` (or `discard_frame`). Resizing and teardown are
/// only legal while no frame is outstanding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// `prepare_frame` was called while frame `index` is still outstanding.
    #[error("frame {index} is already prepared; present or discard it first")]
    AlreadyPrepared { index: u64 },

    /// `present_frame` / `discard_frame` was called with no frame outstanding.
    #[error("no frame is prepared")]
    NotPrepared,

    /// The frame handed back is not the one currently outstanding.
    #[error("stale frame: expected frame {expected}, got frame {actual}")]
    StaleFrame { expected: u64, actual: u64 },

    /// The operation is not allowed between `prepare_frame` and `present_frame`.
    #[error("operation not allowed while a frame is in flight")]
    FrameInFlight,

    /// The render target has zero area (window minimized); nothing to draw into.
    #[error("render target has zero size")]
    Minimized,

    /// The swap chain could not provide a backbuffer.
    #[error("failed to acquire backbuffer: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
