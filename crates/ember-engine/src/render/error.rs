/// Misuse of GPU resource wrappers, detected before anything reaches the driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// Initial or replacement data does not match the buffer's element count.
    #[error("buffer `{label}` holds {expected} elements, got {actual}")]
    DataLengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },

    /// Zero-length buffers cannot be bound.
    #[error("buffer `{label}` must hold at least one element")]
    EmptyBuffer { label: String },

    /// Vertex attributes are 1 to 4 floats wide.
    #[error("attribute {location} has stride {stride}; expected 1..=4 floats")]
    InvalidAttributeStride { location: u32, stride: u32 },

    #[error("{count} vertex attributes requested; at most {max} are supported")]
    TooManyAttributes { count: usize, max: usize },

    /// Uniform data or buffer size differs from the layout's binding size.
    #[error("uniform `{label}` is {expected} bytes, got {actual}")]
    UniformSizeMismatch {
        label: String,
        expected: u64,
        actual: u64,
    },
}
