use rusoto_core::RusotoError;
use rusoto_s3::PutObjectError;
use thiserror::Error;
use uuid::Uuid;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error: {source}")]
    Sqlx { source: sqlx::Error },

    /// Represents an ID that could not be parsed.
    #[error("invalid ID: {0}")]
    InvalidId(String),

    /// Represents a story that does not exist.
    #[error("story {0} not found")]
    NonExistentId(Uuid),

    /// Represents a required text field that was missing or blank.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// Represents a multipart submission without a `file` part.
    #[error("no file provided")]
    PartsMissing,

    /// Represents a multipart submission that could not be read.
    #[error("malformed form submission")]
    MalformedFormSubmission,

    /// Represents an upload whose content type is neither audio nor
    /// video. Checked before the body is read.
    #[error("only audio and video files are allowed, got {essence}")]
    UnsupportedMediaType { essence: String },

    /// Represents an upload larger than the configured ceiling.
    #[error("file of {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// Represents an error returned by the storage provider when
    /// uploading. The provider's message is preserved.
    #[error("upload error: {source}")]
    UploadFailed {
        source: RusotoError<PutObjectError>,
    },

    /// Represents a failure to derive the public URL for an object.
    #[error("failed to generate object URL")]
    FailedToGenerateUrl { source: url::ParseError },

    /// Represents a stored URL that could not be parsed back.
    #[error("unable to parse {url} as URL")]
    UnableToParseUrl {
        url: String,
        source: url::ParseError,
    },
}
