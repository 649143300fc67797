use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use url::Url;
use uuid::Uuid;

use crate::dates::{iso_date, iso_date_option, rfc3339};
use crate::errors::BackendError;

/// The kind of media a story was captured as. Fixed at creation;
/// re-recording means delete and recreate.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
}

impl MediaType {
    /// Classifies a MIME essence (`audio/webm`, `video/mp4`, ...).
    /// Anything outside the two families is rejected.
    pub fn from_essence(essence: &str) -> Option<MediaType> {
        if essence.starts_with("audio/") {
            Some(MediaType::Audio)
        } else if essence.starts_with("video/") {
            Some(MediaType::Video)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(MediaType::Audio),
            "video" => Ok(MediaType::Video),
            _ => Err(BackendError::UnsupportedMediaType {
                essence: s.to_owned(),
            }),
        }
    }
}

/// The owner a story is displayed under. With no authentication in
/// place this is always the default owner.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A family, exposed as id + display name only.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: Uuid,
    pub name: String,
}

/// A lesson linked to a story.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub story_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// A recorded testimony as returned by the API: the persisted fields
/// joined with owner and family display fields, and lessons when a
/// single story is retrieved.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub elder_name: String,
    pub media_type: MediaType,
    pub media_url: Url,
    #[serde(default)]
    pub media_size: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub family_id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: Owner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<Family>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lessons: Option<Vec<Lesson>>,
}

/// Body of `POST /stories`. `media_url` must already point at an
/// uploaded object; create is the second phase of upload-then-create.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub title: String,
    pub elder_name: String,
    pub media_type: MediaType,
    pub media_url: Url,
    #[serde(default)]
    pub media_size: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, with = "iso_date_option")]
    pub date: Option<Date>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub family_id: Option<Uuid>,
}

impl NewStory {
    pub fn validate(&self) -> Result<(), BackendError> {
        non_empty(&self.title, "title")?;
        non_empty(&self.elder_name, "elderName")?;

        Ok(())
    }
}

/// Body of `PATCH /stories/:id`. Only provided fields are merged.
/// There are no media fields: updates can never alter `media_url` or
/// `media_type`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub elder_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, with = "iso_date_option")]
    pub date: Option<Date>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub family_id: Option<Uuid>,
}

impl StoryUpdate {
    pub fn validate(&self) -> Result<(), BackendError> {
        if let Some(title) = &self.title {
            non_empty(title, "title")?;
        }

        if let Some(elder_name) = &self.elder_name {
            non_empty(elder_name, "elderName")?;
        }

        Ok(())
    }
}

/// Additive AND filters for listing stories. The tag filter matches a
/// story whose tag set intersects the given list.
#[derive(Clone, Debug, Default)]
pub struct StoryFilters {
    pub user_id: Option<Uuid>,
    pub family_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
}

/// Splits the `tags` query parameter into its comma-separated parts.
pub fn split_tag_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

fn non_empty(value: &str, field: &'static str) -> Result<(), BackendError> {
    if value.trim().is_empty() {
        Err(BackendError::EmptyField { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_is_classified_by_essence_prefix() {
        assert_eq!(MediaType::from_essence("audio/webm"), Some(MediaType::Audio));
        assert_eq!(MediaType::from_essence("video/mp4"), Some(MediaType::Video));
        assert_eq!(MediaType::from_essence("text/plain"), None);
        assert_eq!(MediaType::from_essence("application/octet-stream"), None);
    }

    #[test]
    fn unknown_media_type_names_the_offending_value() {
        let error = "text".parse::<MediaType>().unwrap_err();

        assert!(matches!(
            error,
            BackendError::UnsupportedMediaType { essence } if essence == "text"
        ));
    }

    #[test]
    fn new_story_requires_title_and_elder_name() {
        let raw = r#"{
            "title": " ",
            "elderName": "Grandfather Ram",
            "mediaType": "audio",
            "mediaUrl": "https://storage.example.com/stories/1-a.webm"
        }"#;
        let story: NewStory = serde_json::from_str(raw).unwrap();

        assert!(matches!(
            story.validate(),
            Err(BackendError::EmptyField { field: "title" })
        ));
    }

    #[test]
    fn tag_filter_splitting_ignores_blanks() {
        assert_eq!(split_tag_filter("a, b ,,c"), vec!["a", "b", "c"]);
        assert_eq!(split_tag_filter(""), Vec::<String>::new());
    }

    #[test]
    fn update_payload_has_no_media_fields() {
        // unknown fields are dropped on the floor rather than merged,
        // so a client cannot smuggle a new mediaUrl through PATCH
        let raw = r#"{"title":"New Title","mediaUrl":"https://elsewhere.example.com/x"}"#;
        let update: StoryUpdate = serde_json::from_str(raw).unwrap();

        assert_eq!(update.title.as_deref(), Some("New Title"));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({
                "title": "New Title",
                "elderName": null,
                "description": null,
                "prompt": null,
                "date": null,
                "tags": null,
                "familyId": null,
            })
        );
    }
}
