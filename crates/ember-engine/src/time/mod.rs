//! Time subsystem.
//!
//! Frame timing utilities without coupling to the runtime:
//! - one `FrameClock` per render loop; `tick()` once per frame
//! - `FpsCounter` for the window-title frame rate

mod fps;
mod frame_clock;

pub use fps::FpsCounter;
pub use frame_clock::{FrameClock, FrameTime};
