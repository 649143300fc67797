use serde::Deserialize;
use uuid::Uuid;

use crate::story::{split_tag_filter, StoryFilters};

/// Query parameters accepted by `GET /stories`. All optional; present
/// parameters narrow the result.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoriesQuery {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub family_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl From<StoriesQuery> for StoryFilters {
    fn from(query: StoriesQuery) -> Self {
        StoryFilters {
            user_id: query.user_id,
            family_id: query.family_id,
            tags: query.tags.as_deref().map(split_tag_filter).filter(|tags| !tags.is_empty()),
        }
    }
}
