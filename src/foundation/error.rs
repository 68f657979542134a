/// Result alias used throughout the crate.
pub type LinestackResult<T> = Result<T, LinestackError>;

/// Every failure a compose run can end in.
///
/// All variants are fatal for the whole run: a compose either returns every segment or fails.
#[derive(thiserror::Error, Debug)]
pub enum LinestackError {
    /// No images were handed to the pipeline.
    #[error("no images to export")]
    EmptyInput,

    /// The image at position 0 is not a keyframe.
    #[error("first image must be a keyframe (found {role})")]
    InvalidFirstImage {
        /// Role found at position 0.
        role: crate::Role,
    },

    /// A crop spec is malformed or produces an empty window.
    #[error("invalid crop spec for image '{image_id}': {reason}")]
    InvalidCropSpec {
        /// Offending image id.
        image_id: String,
        /// Human readable reason.
        reason: String,
    },

    /// Decoded bitmap dimensions disagree with the recorded metadata.
    #[error(
        "dimension mismatch for image '{image_id}': recorded {}x{}, decoded {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    DimensionMismatch {
        /// Offending image id.
        image_id: String,
        /// Recorded `(width, height)`.
        expected: (u32, u32),
        /// Decoded `(width, height)`.
        actual: (u32, u32),
    },

    /// JPEG encoding of a segment produced no data.
    #[error("failed to encode segment {segment}: {reason}")]
    EncodeFailure {
        /// Zero-based segment index.
        segment: usize,
        /// Encoder message.
        reason: String,
    },

    /// The pixel source could not be decoded.
    #[error("decode error for image '{image_id}': {reason}")]
    Decode {
        /// Offending image id.
        image_id: String,
        /// Decoder message.
        reason: String,
    },

    /// Settings or job input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Rendering failed outside of encoding (surface allocation, watermark raster).
    #[error("render error: {0}")]
    Render(String),

    /// The run was cancelled through its [`CancelFlag`](crate::CancelFlag).
    #[error("compose cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LinestackError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn invalid_crop(image_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCropSpec {
            image_id: image_id.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(image_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            image_id: image_id.into(),
            reason: reason.into(),
        }
    }

    pub fn encode(segment: usize, reason: impl Into<String>) -> Self {
        Self::EncodeFailure {
            segment,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
