//! Wire types and the REST seam the workflow talks through. Field
//! names are camelCased to match the backend's JSON contract.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use time::Date;
use url::Url;
use uuid::Uuid;

use crate::dates::{iso_date, iso_date_option};
use crate::errors::ClientError;
use crate::recorder::MediaBlob;

/// A persisted story as the server returns it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    pub id: Uuid,
    pub title: String,
    pub elder_name: String,
    pub media_type: String,
    pub media_url: Url,
    #[serde(default)]
    pub media_size: Option<u64>,
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
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The durable reference handed back by `POST /upload/story`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: Url,
    pub path: String,
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
    pub original_name: String,
}

/// Body of `POST /stories`. `media_url` is only ever set from a
/// completed upload; create is strictly upload-then-create.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub title: String,
    pub elder_name: String,
    pub media_type: String,
    pub media_url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id: Option<Uuid>,
}

/// Body of `PATCH /stories/:id`. Metadata only: there are no media
/// fields here, so an edit can never touch `mediaUrl` or `mediaType`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, with = "iso_date_option", skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id: Option<Uuid>,
}

/// Query parameters of `GET /stories`. Filters are additive AND; the
/// tag list matches any overlap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListFilters {
    pub user_id: Option<Uuid>,
    pub family_id: Option<Uuid>,
    pub tags: Option<String>,
}

/// Maps a non-success REST response to an error, preferring the
/// `message` field of the body when one is present.
pub fn error_from_response(status: u16, id: Option<Uuid>, body: &str) -> ClientError {
    if status == 404 {
        if let Some(id) = id {
            return ClientError::NotFound { id };
        }
    }

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| format!("HTTP {}", status));

    ClientError::Api { message }
}

/// Transfers finished blobs to object storage.
pub trait UploadClient: Send + Sync {
    fn upload(&self, blob: MediaBlob) -> BoxFuture<'_, Result<UploadedMedia, ClientError>>;
}

/// The stories REST surface.
pub trait StoryApi: Send + Sync {
    fn create(&self, request: CreateStoryRequest)
        -> BoxFuture<'_, Result<StoryRecord, ClientError>>;

    fn list(&self, filters: ListFilters) -> BoxFuture<'_, Result<Vec<StoryRecord>, ClientError>>;

    fn retrieve(&self, id: Uuid) -> BoxFuture<'_, Result<StoryRecord, ClientError>>;

    fn update(
        &self,
        id: Uuid,
        request: UpdateStoryRequest,
    ) -> BoxFuture<'_, Result<StoryRecord, ClientError>>;

    fn delete(&self, id: Uuid) -> BoxFuture<'_, Result<Uuid, ClientError>>;
}
