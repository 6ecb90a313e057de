use std::marker::PhantomData;

use bytemuck::Pod;

use crate::device::GraphicsContext;

use super::ResourceError;

/// Fixed-length GPU buffer of `T` elements.
///
/// Content may be rewritten with data of the same length; buffers never resize.
struct ElementBuffer<T> {
    buffer: wgpu::Buffer,
    len: usize,
    usage: wgpu::BufferUsages,
    label: String,
    _elem: PhantomData<T>,
}

impl<T: Pod> ElementBuffer<T> {
    const ELEM_SIZE: u64 = std::mem::size_of::<T>() as u64;

    fn new(
        ctx: &GraphicsContext<'_>,
        len: usize,
        data: Option<&[T]>,
        usage: wgpu::BufferUsages,
        label: &str,
    ) -> Result<Self, ResourceError> {
        if len == 0 {
            return Err(ResourceError::EmptyBuffer {
                label: label.to_owned(),
            });
        }
        if let Some(data) = data {
            check_len(label, len, data.len())?;
        }

        let buffer = ctx.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: len as u64 * Self::ELEM_SIZE,
            usage,
            mapped_at_creation: false,
        });

        if let Some(data) = data {
            ctx.queue().write_buffer(&buffer, 0, bytemuck::cast_slice(data));
        }

        Ok(Self {
            buffer,
            len,
            usage,
            label: label.to_owned(),
            _elem: PhantomData,
        })
    }

    fn write(&self, queue: &wgpu::Queue, data: &[T]) -> Result<(), ResourceError> {
        check_len(&self.label, self.len, data.len())?;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        Ok(())
    }

    fn size(&self) -> u64 {
        self.len as u64 * Self::ELEM_SIZE
    }

    fn release(self) {
        self.buffer.destroy();
        log::debug!("buffer `{}` released", self.label);
    }
}

fn check_len(label: &str, expected: usize, actual: usize) -> Result<(), ResourceError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ResourceError::DataLengthMismatch {
            label: label.to_owned(),
            expected,
            actual,
        })
    }
}

macro_rules! element_buffer_accessors {
    ($elem:ty) => {
        /// Writes the full buffer content; `data` must have exactly `len()` elements.
        pub fn write(&self, queue: &wgpu::Queue, data: &[$elem]) -> Result<(), ResourceError> {
            self.inner.write(queue, data)
        }

        /// The whole buffer, for binding.
        pub fn slice(&self) -> wgpu::BufferSlice<'_> {
            self.inner.buffer.slice(..)
        }

        pub fn buffer(&self) -> &wgpu::Buffer {
            &self.inner.buffer
        }

        /// Number of elements.
        pub fn len(&self) -> usize {
            self.inner.len
        }

        pub fn is_empty(&self) -> bool {
            self.inner.len == 0
        }

        /// Size in bytes.
        pub fn size(&self) -> u64 {
            self.inner.size()
        }

        pub fn usage(&self) -> wgpu::BufferUsages {
            self.inner.usage
        }

        pub fn label(&self) -> &str {
            &self.inner.label
        }

        /// Destroys the GPU buffer now.
        pub fn release(self) {
            self.inner.release();
        }
    };
}

/// One de-interleaved vertex attribute stream (`f32` elements).
pub struct VertexBuffer {
    inner: ElementBuffer<f32>,
}

impl VertexBuffer {
    pub const USAGE: wgpu::BufferUsages =
        wgpu::BufferUsages::COPY_DST.union(wgpu::BufferUsages::VERTEX);

    /// Creates a vertex buffer of `len` floats, optionally uploading `data`.
    pub fn new(
        ctx: &GraphicsContext<'_>,
        len: usize,
        data: Option<&[f32]>,
        label: &str,
    ) -> Result<Self, ResourceError> {
        let inner = ElementBuffer::new(ctx, len, data, Self::USAGE, label)?;
        Ok(Self { inner })
    }

    element_buffer_accessors!(f32);
}

/// 32-bit index buffer.
pub struct IndexBuffer {
    inner: ElementBuffer<u32>,
}

impl IndexBuffer {
    pub const USAGE: wgpu::BufferUsages =
        wgpu::BufferUsages::COPY_DST.union(wgpu::BufferUsages::INDEX);

    pub const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

    /// Creates an index buffer of `len` indices, optionally uploading `data`.
    pub fn new(
        ctx: &GraphicsContext<'_>,
        len: usize,
        data: Option<&[u32]>,
        label: &str,
    ) -> Result<Self, ResourceError> {
        let inner = ElementBuffer::new(ctx, len, data, Self::USAGE, label)?;
        Ok(Self { inner })
    }

    element_buffer_accessors!(u32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;

    #[test]
    fn vertex_buffer_descriptor_facts() {
        let Some(ctx) = test_context(8, 8) else {
            return;
        };
        let data = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0];
        let vb = VertexBuffer::new(&ctx, data.len(), Some(&data[..]), "positions").unwrap();
        assert_eq!(vb.len(), 6);
        assert_eq!(vb.size(), 24);
        assert_eq!(vb.buffer().size(), 24);
        assert_eq!(vb.usage(), wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::VERTEX);
        assert_eq!(vb.label(), "positions");
        vb.release();
    }

    #[test]
    fn index_buffer_without_initial_data() {
        let Some(ctx) = test_context(8, 8) else {
            return;
        };
        let ib = IndexBuffer::new(&ctx, 3, None, "indices").unwrap();
        assert_eq!(ib.size(), 12);
        assert_eq!(ib.usage(), wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::INDEX);
        ib.write(ctx.queue(), &[0, 1, 2]).unwrap();
        assert_eq!(ctx.uncaptured_error_count(), 0);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let Some(ctx) = test_context(8, 8) else {
            return;
        };
        let err = VertexBuffer::new(&ctx, 4, Some(&[1.0, 2.0][..]), "short").err();
        assert_eq!(
            err,
            Some(ResourceError::DataLengthMismatch {
                label: "short".into(),
                expected: 4,
                actual: 2,
            })
        );

        let ib = IndexBuffer::new(&ctx, 3, None, "tri").unwrap();
        assert!(matches!(
            ib.write(ctx.queue(), &[0, 1, 2, 3]),
            Err(ResourceError::DataLengthMismatch { expected: 3, actual: 4, .. })
        ));
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let Some(ctx) = test_context(8, 8) else {
            return;
        };
        assert!(matches!(
            IndexBuffer::new(&ctx, 0, None, "empty"),
            Err(ResourceError::EmptyBuffer { .. })
        ));
    }

    #[test]
    fn check_len_reports_both_sides() {
        assert!(check_len("x", 3, 3).is_ok());
        assert_eq!(
            check_len("x", 3, 1),
            Err(ResourceError::DataLengthMismatch {
                label: "x".into(),
                expected: 3,
                actual: 1,
            })
        );
    }
}
