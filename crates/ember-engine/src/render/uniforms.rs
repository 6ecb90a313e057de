//! Uniform blocks of the three bind-group tiers.
//!
//! Layouts match the WGSL structs in the shaders (16-byte aligned, matrices
//! column-major).

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Group 0: camera and time, written once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// `projection * view`, precomputed.
    pub proj_view: [[f32; 4]; 4],
    pub time: f32,
    pub _pad: [f32; 3],
}

impl FrameUniforms {
    pub fn new(projection: Mat4, view: Mat4, time: f32) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj_view: (projection * view).to_cols_array_2d(),
            time,
            _pad: [0.0; 3],
        }
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.0)
    }
}

/// Group 1: per-material parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub color: [f32; 4],
}

impl MaterialUniforms {
    pub fn new(color: Vec4) -> Self {
        Self {
            color: color.to_array(),
        }
    }
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}

/// Group 2: per-draw model transform.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
}

impl DrawUniforms {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn sizes_match_wgsl_layout() {
        assert_eq!(size_of::<FrameUniforms>(), 208);
        assert_eq!(size_of::<MaterialUniforms>(), 16);
        assert_eq!(size_of::<DrawUniforms>(), 64);
        assert_eq!(size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn proj_view_is_precomputed() {
        let projection = Mat4::perspective_rh(1.0, 4.0 / 3.0, 0.1, 100.0);
        let view = Mat4::from_translation(glam::Vec3::new(0.0, 0.0, -3.0));
        let u = FrameUniforms::new(projection, view, 1.5);
        assert_eq!(u.proj_view, (projection * view).to_cols_array_2d());
        assert_eq!(u.time, 1.5);
    }

    #[test]
    fn field_offsets_match_wgsl_layout() {
        assert_eq!(offset_of!(FrameUniforms, projection), 0);
        assert_eq!(offset_of!(FrameUniforms, view), 64);
        assert_eq!(offset_of!(FrameUniforms, proj_view), 128);
        assert_eq!(offset_of!(FrameUniforms, time), 192);
        assert_eq!(offset_of!(MaterialUniforms, color), 0);
        assert_eq!(offset_of!(DrawUniforms, model), 0);
    }

    #[test]
    fn defaults_are_visible_to_a_shader() {
        // Identity transforms and an opaque white material draw something.
        let frame = FrameUniforms::default();
        assert_eq!(frame.proj_view, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(MaterialUniforms::default().color, [1.0; 4]);
        assert_eq!(DrawUniforms::default().model, Mat4::IDENTITY.to_cols_array_2d());
    }
}
