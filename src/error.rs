use thiserror::Error;

/// Errors that can occur when fetching an image from a remote URL
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Remote endpoint answered with a non-success status
    #[error("Failed to fetch image: {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    /// Network, DNS, TLS or timeout failure before a status was received
    #[error("Failed to fetch image: {message}")]
    Transport { url: String, message: String },

    /// Advertised content type does not describe an image
    #[error("Response is not an image")]
    NotAnImage {
        content_type: String,
        preview: String,
    },

    /// Body exceeds the configured size limit
    #[error("Image exceeds the maximum accepted size of {limit} bytes")]
    TooLarge { url: String, limit: usize },
}

/// Errors that can occur while handling a chunk request
#[derive(Debug, Clone, Error)]
pub enum ChunkError {
    /// The `imageUrl` query parameter is absent or empty
    #[error("imageUrl parameter required")]
    MissingParameter,

    /// A query parameter is present but unusable
    #[error("Invalid {name} parameter: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Fetching the source image failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Fetched bytes could not be decoded as an image
    #[error("Invalid image format")]
    InvalidImage {
        details: String,
        buffer_size: usize,
        content_type: Option<String>,
    },

    /// Cropping or encoding a single chunk failed
    #[error("Failed to extract chunk {index}: {message}")]
    ChunkExtractionFailed { index: u32, message: String },

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of [`ChunkError`] used to pick the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingParameter,
    InvalidParameter,
    FetchFailed,
    NotAnImage,
    PayloadTooLarge,
    InvalidImage,
    ChunkExtractionFailed,
    Internal,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::MissingParameter,
        ErrorKind::InvalidParameter,
        ErrorKind::FetchFailed,
        ErrorKind::NotAnImage,
        ErrorKind::PayloadTooLarge,
        ErrorKind::InvalidImage,
        ErrorKind::ChunkExtractionFailed,
        ErrorKind::Internal,
    ];

    /// Stable snake_case identifier, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingParameter => "missing_parameter",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::FetchFailed => "fetch_failed",
            ErrorKind::NotAnImage => "not_an_image",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::InvalidImage => "invalid_image",
            ErrorKind::ChunkExtractionFailed => "chunk_extraction_failed",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl ChunkError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChunkError::MissingParameter => ErrorKind::MissingParameter,
            ChunkError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            ChunkError::Fetch(FetchError::Status { .. } | FetchError::Transport { .. }) => {
                ErrorKind::FetchFailed
            }
            ChunkError::Fetch(FetchError::NotAnImage { .. }) => ErrorKind::NotAnImage,
            ChunkError::Fetch(FetchError::TooLarge { .. }) => ErrorKind::PayloadTooLarge,
            ChunkError::InvalidImage { .. } => ErrorKind::InvalidImage,
            ChunkError::ChunkExtractionFailed { .. } => ErrorKind::ChunkExtractionFailed,
            ChunkError::Internal(_) => ErrorKind::Internal,
        }
    }
}
