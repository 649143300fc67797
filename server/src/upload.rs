use serde::Serialize;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::story::MediaType;

/// The default ceiling on media uploads: 500 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// The prefix under which uploaded objects are stored.
pub const OBJECT_PREFIX: &str = "stories";

/// The body returned after a successful upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: Url,
    pub path: String,
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
    pub original_name: String,
}

/// Checks an upload's content type and size before it is stored. The
/// content type must be audio or video and the size must not exceed
/// the given limit.
pub fn validate_upload(essence: &str, size: u64, limit: u64) -> Result<MediaType, BackendError> {
    let media_type =
        MediaType::from_essence(essence).ok_or_else(|| BackendError::UnsupportedMediaType {
            essence: essence.to_owned(),
        })?;

    if size > limit {
        return Err(BackendError::FileTooLarge { size, limit });
    }

    Ok(media_type)
}

/// Generates a unique object name for an upload, keeping the original
/// file's extension.
pub fn generate_file_name(original_name: &str) -> String {
    let extension = match original_name.rfind('.') {
        Some(index) if index + 1 < original_name.len() => &original_name[index + 1..],
        _ => "bin",
    };

    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

    format!("{}-{}.{}", millis, Uuid::new_v4().to_simple(), extension)
}

/// Returns the storage path for the given generated file name.
pub fn object_path(file_name: &str) -> String {
    format!("{}/{}", OBJECT_PREFIX, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_audio() {
        let media_type = validate_upload("audio/webm", 10 * 1024 * 1024, MAX_UPLOAD_BYTES)
            .expect("accept 10 MiB audio upload");

        assert_eq!(media_type, MediaType::Audio);
    }

    #[test]
    fn rejects_non_media_content_types() {
        let error = validate_upload("text/plain", 1024, MAX_UPLOAD_BYTES)
            .expect_err("reject text upload");

        assert!(matches!(
            error,
            BackendError::UnsupportedMediaType { essence } if essence == "text/plain"
        ));
    }

    #[test]
    fn rejects_oversized_uploads() {
        let size = 600 * 1024 * 1024;
        let error =
            validate_upload("video/webm", size, MAX_UPLOAD_BYTES).expect_err("reject 600 MiB");

        assert!(matches!(
            error,
            BackendError::FileTooLarge { size: s, limit } if s == size && limit == MAX_UPLOAD_BYTES
        ));
    }

    #[test]
    fn file_names_keep_the_extension() {
        let name = generate_file_name("grandma-interview.webm");

        assert!(name.ends_with(".webm"));
    }

    #[test]
    fn file_names_without_extension_get_a_fallback() {
        let name = generate_file_name("recording");

        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn file_names_are_unique() {
        assert_ne!(generate_file_name("a.webm"), generate_file_name("a.webm"));
    }

    #[test]
    fn object_paths_live_under_the_stories_prefix() {
        assert!(object_path("123-abc.webm").starts_with("stories/"));
    }
}
