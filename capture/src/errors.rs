use thiserror::Error;
use uuid::Uuid;

/// Enumerates validation failures for the capture form. These are
/// surfaced inline and never retried automatically.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was left empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A new story was submitted without a finished recording.
    #[error("no media attached to submission")]
    MediaMissing,
}

/// Enumerates errors produced while driving the recorder.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The platform refused to hand over a device stream, either
    /// because permission was denied or because no device exists.
    #[error("unable to access capture device: {reason}")]
    DeviceAccess { reason: String },
}

/// Enumerates errors surfaced by the capture workflow. Provider
/// messages are preserved verbatim for diagnostics.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The storage provider rejected the upload or the network failed.
    /// The two-phase create is abandoned; no story is created.
    #[error("upload failed: {message}")]
    Upload { message: String },

    /// The referenced story no longer exists on the server.
    #[error("story {id} not found")]
    NotFound { id: Uuid },

    /// Any other error reported by the REST API.
    #[error("{message}")]
    Api { message: String },
}
