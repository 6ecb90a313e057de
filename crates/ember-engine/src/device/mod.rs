//! GPU device, swap chain and frame management.
//!
//! This module is responsible for:
//! - negotiating the wgpu Instance/Adapter/Device/Queue
//! - creating and configuring the Surface (swap chain) and the depth buffer
//! - the prepare/present frame protocol

mod context;
mod depth;
mod error;
mod frame;
mod init;
pub mod negotiate;
mod surface;

pub use context::{GraphicsContext, PassDefaults};
pub use depth::DepthTexture;
pub use error::{FrameError, SurfaceErrorAction};
pub use frame::{Frame, FrameState};
pub use init::{ContextConfig, ErrorPolicy};
