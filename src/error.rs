use thiserror::Error;

/// Multipart Error
#[derive(Debug, Error)]
pub enum Error {
    /// IO Error
    #[error(transparent)]
    Stream(#[from] std::io::Error),

    /// Box Error
    #[error(transparent)]
    BoxError(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Content-Type is absent or is not `multipart/*`
    #[error("content type is not multipart")]
    NotMultipart,

    /// Content-Type has no `boundary` parameter
    #[error("missing boundary parameter")]
    MissingBoundary,

    /// A line expected to be a delimiter or terminator is neither
    #[error("invalid boundary `{found}`, expected `{expected}`")]
    MalformedBoundaryLine {
        /// The delimiter this reader is bound to.
        expected: String,
        /// The line that was read instead.
        found: String,
    },

    /// Declared Content-Length disagrees with the terminator position
    #[error("part data does not match its content length")]
    TruncatedOrOverlongPart,

    /// No decoder for the declared Content-Encoding
    #[error("unsupported content encoding `{0}`")]
    UnsupportedContentEncoding(String),

    /// Length-bounded read on a line-bounded part, or the other way round
    #[error("{0}")]
    ModePreconditionViolation(&'static str),

    /// Invalid part header
    #[error("invalid part header")]
    InvalidHeader,

    /// Invalid Content-Length header
    #[error("invalid content length")]
    InvalidContentLength,

    /// Stream closed before the body was complete
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Line too long
    #[error("line is too long, limit to `{0}`")]
    LineTooLong(usize),

    /// Headers too many
    #[error("headers is too many, limit to `{0}`")]
    HeadersTooMany(usize),

    /// Payload too large
    #[error("payload is too large, limit to `{0}`")]
    PayloadTooLarge(u64),

    /// Parts too many
    #[error("parts is too many, limit to `{0}`")]
    PartsTooMany(usize),

    /// Unknown charset label
    #[error("unknown charset `{0}`")]
    UnknownCharset(String),

    /// Payload is not valid in the resolved charset
    #[error("payload is not valid `{0}` text")]
    InvalidText(&'static str),

    /// JSON Error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Try Lock Error
    #[error("`{0}`")]
    TryLockError(String),
}
