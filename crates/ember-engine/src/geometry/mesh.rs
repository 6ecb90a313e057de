use crate::device::GraphicsContext;
use crate::render::{IndexBuffer, ResourceError, VertexBuffer};

use super::Vertices;

/// GPU copy of a [`Vertices`] mesh: one vertex buffer per attribute plus the
/// index buffer, in the slot order of `VertexLayout::standard`.
pub struct GpuMesh {
    positions: VertexBuffer,
    normals: VertexBuffer,
    uvs: VertexBuffer,
    indices: IndexBuffer,
}

impl GpuMesh {
    pub fn new(
        ctx: &GraphicsContext<'_>,
        mesh: &Vertices,
        label: &str,
    ) -> Result<Self, ResourceError> {
        let stream = |data: &[f32], name: &str| {
            VertexBuffer::new(ctx, data.len(), Some(data), &format!("{label} {name}"))
        };

        let positions = stream(&mesh.positions, "positions")?;
        let normals = stream(&mesh.normals, "normals")?;
        let uvs = stream(&mesh.uvs, "uvs")?;
        let indices = IndexBuffer::new(
            ctx,
            mesh.indices.len(),
            Some(mesh.indices.as_slice()),
            &format!("{label} indices"),
        )?;

        log::debug!(
            "mesh `{label}` uploaded: {} vertices, {} indices",
            mesh.vertex_count(),
            mesh.index_count()
        );

        Ok(Self {
            positions,
            normals,
            uvs,
            indices,
        })
    }

    /// Sets vertex slots 0/1/2 and the index buffer.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.positions.slice());
        pass.set_vertex_buffer(1, self.normals.slice());
        pass.set_vertex_buffer(2, self.uvs.slice());
        pass.set_index_buffer(self.indices.slice(), IndexBuffer::FORMAT);
    }

    /// Draws every index once.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.draw_indexed(0..self.index_count(), 0, 0..1);
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn release(self) {
        self.positions.release();
        self.normals.release();
        self.uvs.release();
        self.indices.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlaneParams;
    use crate::test_support::test_context;

    #[test]
    fn plane_uploads_every_stream() {
        let Some(ctx) = test_context(16, 16) else {
            return;
        };
        let plane = Vertices::plane(&PlaneParams {
            width_segments: 4,
            height_segments: 4,
            ..Default::default()
        });
        let mesh = GpuMesh::new(&ctx, &plane, "plane").unwrap();
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.index_count(), 96);
        assert_eq!(mesh.positions.size(), 25 * 3 * 4);
        assert_eq!(mesh.uvs.size(), 25 * 2 * 4);
        assert_eq!(mesh.indices.label(), "plane indices");
        mesh.release();
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let Some(ctx) = test_context(16, 16) else {
            return;
        };
        assert!(matches!(
            GpuMesh::new(&ctx, &Vertices::default(), "empty"),
            Err(ResourceError::EmptyBuffer { .. })
        ));
    }
}
