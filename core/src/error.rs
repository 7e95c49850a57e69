use thiserror::Error;

/// Reasons a sample block or configuration can't be rendered.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("sample block is empty")]
    EmptyBlock,
    #[error(
        "sample block has {len} samples but the frame is {width} pixels wide"
    )]
    BlockTooShort { len: usize, width: u32 },
    #[error("frame dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },
    #[error("horizontal stride must be non-zero")]
    ZeroStride,
    #[error("frame rate must be non-zero")]
    ZeroFps,
    #[error("vertical compression factor must be non-zero")]
    ZeroVerticalCompression,
    #[error("audio stream has no channels or a zero sample rate")]
    EmptyStream,
}

#[derive(Debug, Error)]
pub enum Error {
    /// A file or device couldn't be opened.
    #[error("failed to open {what}: {reason}")]
    Open { what: String, reason: String },
    /// The stream was corrupt or unsupported part way through.
    #[error("failed to decode audio: {0}")]
    Decode(String),
    #[error("invalid render input: {0}")]
    Render(#[from] InvalidInput),
    #[error("display error: {0}")]
    Display(String),
}

impl Error {
    pub fn open(what: impl ToString, reason: impl ToString) -> Self {
        Self::Open {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }
}
