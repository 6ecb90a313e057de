//! CPU meshes and their GPU buffers.

mod mesh;
mod vertices;

pub use mesh::GpuMesh;
pub use vertices::{PlaneParams, Vertices};
