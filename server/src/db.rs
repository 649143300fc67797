use futures::future::BoxFuture;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::story::{Family, Lesson, NewStory, Story, StoryFilters, StoryUpdate};

pub mod memory;

/// The identity every story is owned by while there is no
/// authentication. Resolved as an idempotent upsert so concurrent
/// first requests cannot race each other into duplicate rows.
#[derive(Clone, Debug)]
pub struct DefaultOwner {
    pub email: String,
    pub name: String,
}

pub trait Db {
    fn create_story(&self, story: NewStory) -> BoxFuture<Result<Story, BackendError>>;

    fn list_stories(&self, filters: StoryFilters) -> BoxFuture<Result<Vec<Story>, BackendError>>;

    fn retrieve_story(&self, id: &Uuid) -> BoxFuture<Result<Option<Story>, BackendError>>;

    fn update_story(
        &self,
        id: &Uuid,
        update: StoryUpdate,
    ) -> BoxFuture<Result<Option<Story>, BackendError>>;

    fn delete_story(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    fn list_families(&self) -> BoxFuture<Result<Vec<Family>, BackendError>>;

    fn list_lessons(&self) -> BoxFuture<Result<Vec<Lesson>, BackendError>>;
}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::postgres::{PgPool, PgRow};
    use time::{Date, OffsetDateTime};
    use url::Url;
    use uuid::Uuid;

    use super::DefaultOwner;
    use crate::errors::BackendError;
    use crate::story::{
        Family, Lesson, MediaType, NewStory, Owner, Story, StoryFilters, StoryUpdate,
    };

    pub struct PgDb {
        pool: PgPool,
        owner: DefaultOwner,
    }

    impl PgDb {
        pub fn new(pool: PgPool, owner: DefaultOwner) -> Self {
            PgDb { pool, owner }
        }

        async fn upsert_default_owner(&self) -> Result<Owner, BackendError> {
            let query = sqlx::query_as(include_str!("queries/upsert_default_owner.sql"));

            let (id, name, email): (Uuid, String, String) = query
                .bind(&self.owner.email)
                .bind(&self.owner.name)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            Ok(Owner { id, name, email })
        }

        async fn fetch_story(&self, id: Uuid) -> Result<Option<Story>, BackendError> {
            let query = sqlx::query(include_str!("queries/retrieve_story.sql"));

            let story = query
                .bind(id)
                .try_map(|row: PgRow| story_from_row(&row))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            Ok(story)
        }

        async fn fetch_lessons(&self, story_id: Uuid) -> Result<Vec<Lesson>, BackendError> {
            let query = sqlx::query(include_str!("queries/retrieve_lessons.sql"));

            let lessons = query
                .bind(story_id)
                .try_map(|row: PgRow| lesson_from_row(&row))
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            Ok(lessons)
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn create_story(&self, story: NewStory) -> BoxFuture<Result<Story, BackendError>> {
            async move {
                let owner = self.upsert_default_owner().await?;

                let query = sqlx::query_as(include_str!("queries/create_story.sql"));

                let (id,): (Uuid,) = query
                    .bind(&story.title)
                    .bind(&story.elder_name)
                    .bind(story.media_type.as_str())
                    .bind(story.media_url.as_str())
                    .bind(story.media_size)
                    .bind(&story.description)
                    .bind(&story.prompt)
                    .bind(story.date)
                    .bind(&story.tags)
                    .bind(story.family_id)
                    .bind(owner.id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                self.fetch_story(id)
                    .await?
                    .ok_or(BackendError::NonExistentId(id))
            }
            .boxed()
        }

        fn list_stories(
            &self,
            filters: StoryFilters,
        ) -> BoxFuture<Result<Vec<Story>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_stories.sql"));

                let stories = query
                    .bind(filters.user_id)
                    .bind(filters.family_id)
                    .bind(filters.tags)
                    .try_map(|row: PgRow| story_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(stories)
            }
            .boxed()
        }

        fn retrieve_story(&self, id: &Uuid) -> BoxFuture<Result<Option<Story>, BackendError>> {
            let id = *id;

            async move {
                let story = self.fetch_story(id).await?;

                match story {
                    Some(mut story) => {
                        story.lessons = Some(self.fetch_lessons(id).await?);
                        Ok(Some(story))
                    }
                    None => Ok(None),
                }
            }
            .boxed()
        }

        fn update_story(
            &self,
            id: &Uuid,
            update: StoryUpdate,
        ) -> BoxFuture<Result<Option<Story>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_story.sql"));

                let count = query
                    .bind(id)
                    .bind(&update.title)
                    .bind(&update.elder_name)
                    .bind(&update.description)
                    .bind(&update.prompt)
                    .bind(update.date)
                    .bind(&update.tags)
                    .bind(update.family_id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
                    return Ok(None);
                }

                self.fetch_story(id).await
            }
            .boxed()
        }

        fn delete_story(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/delete_story.sql"));

                let count = query
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
                    Err(BackendError::NonExistentId(id))
                } else {
                    Ok(())
                }
            }
            .boxed()
        }

        fn list_families(&self) -> BoxFuture<Result<Vec<Family>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_families.sql"));

                let families = query
                    .try_map(|row: PgRow| {
                        Ok(Family {
                            id: try_get(&row, "id")?,
                            name: try_get(&row, "name")?,
                        })
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(families)
            }
            .boxed()
        }

        fn list_lessons(&self) -> BoxFuture<Result<Vec<Lesson>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_lessons.sql"));

                let lessons = query
                    .try_map(|row: PgRow| lesson_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(lessons)
            }
            .boxed()
        }
    }

    fn story_from_row(row: &PgRow) -> Result<Story, sqlx::Error> {
        let media_type: String = try_get(row, "media_type")?;
        let media_type = media_type
            .parse::<MediaType>()
            .map_err(|_| decode_error(format!("unknown media type {}", media_type)))?;

        let url: String = try_get(row, "media_url")?;
        let media_url = Url::parse(&url).map_err(|source| {
            // we control the URLs that go into the database, but just
            // for completeness...
            sqlx::Error::Decode(Box::new(BackendError::UnableToParseUrl { url, source }))
        })?;

        let user = Owner {
            id: try_get(row, "user_id")?,
            name: try_get(row, "user_name")?,
            email: try_get(row, "user_email")?,
        };

        let family_id: Option<Uuid> = try_get(row, "family_id")?;
        let family_name: Option<String> = try_get(row, "family_name")?;
        let family = match (family_id, family_name) {
            (Some(id), Some(name)) => Some(Family { id, name }),
            _ => None,
        };

        let date: Date = try_get(row, "date")?;
        let created_at: OffsetDateTime = try_get(row, "created_at")?;

        Ok(Story {
            id: try_get(row, "id")?,
            title: try_get(row, "title")?,
            elder_name: try_get(row, "elder_name")?,
            media_type,
            media_url,
            media_size: try_get(row, "media_size")?,
            description: try_get(row, "description")?,
            prompt: try_get(row, "prompt")?,
            date,
            tags: try_get(row, "tags")?,
            family_id,
            user_id: user.id,
            created_at,
            user,
            family,
            lessons: None,
        })
    }

    fn lesson_from_row(row: &PgRow) -> Result<Lesson, sqlx::Error> {
        Ok(Lesson {
            id: try_get(row, "id")?,
            story_id: try_get(row, "story_id")?,
            title: try_get(row, "title")?,
            summary: try_get(row, "summary")?,
        })
    }

    fn decode_error(message: String) -> sqlx::Error {
        sqlx::Error::Decode(message.into())
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        BackendError::Sqlx { source: error }
    }
}
