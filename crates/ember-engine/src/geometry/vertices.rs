/// Plane generator parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaneParams {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for PlaneParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            width_segments: 1,
            height_segments: 1,
        }
    }
}

/// CPU-side mesh, de-interleaved to match
/// [`VertexLayout::standard`](crate::render::VertexLayout::standard).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertices {
    /// xyz per vertex.
    pub positions: Vec<f32>,
    /// xyz per vertex.
    pub normals: Vec<f32>,
    /// uv per vertex.
    pub uvs: Vec<f32>,
    /// Triangle list.
    pub indices: Vec<u32>,
}

impl Vertices {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Grid in the XY plane centered on the origin, facing +Z.
    ///
    /// Rows run top to bottom; `v` is 1 on the top edge. Segment counts below
    /// one are treated as one.
    pub fn plane(params: &PlaneParams) -> Self {
        let gx = params.width_segments.max(1);
        let gy = params.height_segments.max(1);
        let gx1 = gx + 1;
        let gy1 = gy + 1;

        let half_w = params.width / 2.0;
        let half_h = params.height / 2.0;
        let seg_w = params.width / gx as f32;
        let seg_h = params.height / gy as f32;

        let count = (gx1 * gy1) as usize;
        let mut out = Self {
            positions: Vec::with_capacity(count * 3),
            normals: Vec::with_capacity(count * 3),
            uvs: Vec::with_capacity(count * 2),
            indices: Vec::with_capacity((gx * gy * 6) as usize),
        };

        for iy in 0..gy1 {
            let y = iy as f32 * seg_h - half_h;
            for ix in 0..gx1 {
                let x = ix as f32 * seg_w - half_w;
                out.positions.extend_from_slice(&[x, -y, 0.0]);
                out.normals.extend_from_slice(&[0.0, 0.0, 1.0]);
                out.uvs
                    .extend_from_slice(&[ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32]);
            }
        }

        for iy in 0..gy {
            for ix in 0..gx {
                let a = ix + gx1 * iy;
                let b = ix + gx1 * (iy + 1);
                let c = (ix + 1) + gx1 * (iy + 1);
                let d = (ix + 1) + gx1 * iy;
                out.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        out
    }
}
