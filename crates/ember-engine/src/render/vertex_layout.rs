use super::ResourceError;

/// De-interleaved vertex input description.
///
/// Attribute `i` lives alone in vertex buffer slot `i` at shader location `i`.
/// Strides are counted in `f32`s.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    strides: Vec<u32>,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub const MAX_ATTRIBUTES: usize = 8;

    pub fn new(strides: &[u32]) -> Result<Self, ResourceError> {
        if strides.len() > Self::MAX_ATTRIBUTES {
            return Err(ResourceError::TooManyAttributes {
                count: strides.len(),
                max: Self::MAX_ATTRIBUTES,
            });
        }

        let attributes = strides
            .iter()
            .enumerate()
            .map(|(i, &stride)| {
                let location = i as u32;
                Ok(wgpu::VertexAttribute {
                    format: float_format(location, stride)?,
                    offset: 0,
                    shader_location: location,
                })
            })
            .collect::<Result<Vec<_>, ResourceError>>()?;

        Ok(Self {
            strides: strides.to_vec(),
            attributes,
        })
    }

    /// Position (3), normal (3), uv (2).
    pub fn standard() -> Self {
        Self {
            strides: vec![3, 3, 2],
            attributes: vec![
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 2,
                },
            ],
        }
    }

    /// One buffer layout per attribute, in slot order.
    pub fn buffers(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.attributes
            .iter()
            .zip(&self.strides)
            .map(|(attribute, &stride)| wgpu::VertexBufferLayout {
                array_stride: stride as u64 * std::mem::size_of::<f32>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: std::slice::from_ref(attribute),
            })
            .collect()
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn strides(&self) -> &[u32] {
        &self.strides
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

fn float_format(location: u32, stride: u32) -> Result<wgpu::VertexFormat, ResourceError> {
    match stride {
        1 => Ok(wgpu::VertexFormat::Float32),
        2 => Ok(wgpu::VertexFormat::Float32x2),
        3 => Ok(wgpu::VertexFormat::Float32x3),
        4 => Ok(wgpu::VertexFormat::Float32x4),
        _ => Err(ResourceError::InvalidAttributeStride { location, stride }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_is_three_separate_streams() {
        let layout = VertexLayout::new(&[3, 3, 2]).unwrap();
        assert_eq!(layout, VertexLayout::standard());

        let buffers = layout.buffers();
        assert_eq!(buffers.len(), 3);

        let expected = [
            (12, wgpu::VertexFormat::Float32x3),
            (12, wgpu::VertexFormat::Float32x3),
            (8, wgpu::VertexFormat::Float32x2),
        ];
        for (slot, (buffer, (stride, format))) in buffers.iter().zip(expected).enumerate() {
            assert_eq!(buffer.array_stride, stride);
            assert_eq!(buffer.step_mode, wgpu::VertexStepMode::Vertex);
            assert_eq!(buffer.attributes.len(), 1);
            assert_eq!(buffer.attributes[0].format, format);
            assert_eq!(buffer.attributes[0].offset, 0);
            assert_eq!(buffer.attributes[0].shader_location, slot as u32);
        }
    }

    #[test]
    fn building_twice_gives_identical_layouts() {
        let a = VertexLayout::new(&[3, 3, 2]).unwrap();
        let b = VertexLayout::new(&[3, 3, 2]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_stride_maps_to_a_float_format() {
        let layout = VertexLayout::new(&[1, 2, 3, 4]).unwrap();
        let formats: Vec<_> = layout.attributes().iter().map(|a| a.format).collect();
        assert_eq!(
            formats,
            vec![
                wgpu::VertexFormat::Float32,
                wgpu::VertexFormat::Float32x2,
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Float32x4,
            ]
        );
        assert_eq!(layout.strides(), &[1, 2, 3, 4]);
    }

    #[test]
    fn bad_strides_are_rejected() {
        assert_eq!(
            VertexLayout::new(&[3, 0]),
            Err(ResourceError::InvalidAttributeStride {
                location: 1,
                stride: 0
            })
        );
        assert!(matches!(
            VertexLayout::new(&[5]),
            Err(ResourceError::InvalidAttributeStride { stride: 5, .. })
        ));
    }

    #[test]
    fn attribute_count_is_bounded() {
        assert_eq!(VertexLayout::new(&[1; 8]).unwrap().len(), 8);
        assert_eq!(
            VertexLayout::new(&[1; 9]),
            Err(ResourceError::TooManyAttributes { count: 9, max: 8 })
        );
    }
}
