//! An in-memory [`Db`] used by the HTTP tests, mirroring the Postgres
//! implementation's semantics (default-owner resolution, filter
//! intersection, newest-first ordering).

use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Db, DefaultOwner};
use crate::errors::BackendError;
use crate::story::{Family, Lesson, NewStory, Owner, Story, StoryFilters, StoryUpdate};

pub struct MemoryDb {
    owner: Owner,
    stories: Mutex<Vec<Story>>,
    families: Mutex<Vec<Family>>,
    lessons: Mutex<Vec<Lesson>>,
}

impl MemoryDb {
    pub fn new(owner: DefaultOwner) -> Self {
        MemoryDb {
            owner: Owner {
                id: Uuid::new_v4(),
                name: owner.name,
                email: owner.email,
            },
            stories: Mutex::new(vec![]),
            families: Mutex::new(vec![]),
            lessons: Mutex::new(vec![]),
        }
    }

    pub fn owner(&self) -> Owner {
        self.owner.clone()
    }

    pub fn seed_family(&self, name: impl Into<String>) -> Family {
        let family = Family {
            id: Uuid::new_v4(),
            name: name.into(),
        };

        self.families.lock().unwrap().push(family.clone());

        family
    }

    pub fn seed_lesson(&self, story_id: Uuid, title: impl Into<String>) -> Lesson {
        let lesson = Lesson {
            id: Uuid::new_v4(),
            story_id,
            title: title.into(),
            summary: None,
        };

        self.lessons.lock().unwrap().push(lesson.clone());

        lesson
    }

    fn matches(story: &Story, filters: &StoryFilters) -> bool {
        if let Some(user_id) = filters.user_id {
            if story.user_id != user_id {
                return false;
            }
        }

        if let Some(family_id) = filters.family_id {
            if story.family_id != Some(family_id) {
                return false;
            }
        }

        if let Some(tags) = &filters.tags {
            if !story.tags.iter().any(|tag| tags.contains(tag)) {
                return false;
            }
        }

        true
    }
}

impl Db for MemoryDb {
    fn create_story(&self, story: NewStory) -> BoxFuture<Result<Story, BackendError>> {
        async move {
            let now = OffsetDateTime::now_utc();

            let family = story.family_id.and_then(|id| {
                self.families
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|family| family.id == id)
                    .cloned()
            });

            let created = Story {
                id: Uuid::new_v4(),
                title: story.title,
                elder_name: story.elder_name,
                media_type: story.media_type,
                media_url: story.media_url,
                media_size: story.media_size,
                description: story.description,
                prompt: story.prompt,
                date: story.date.unwrap_or_else(|| now.date()),
                tags: story.tags,
                family_id: family.as_ref().map(|family| family.id),
                user_id: self.owner.id,
                created_at: now,
                user: self.owner.clone(),
                family,
                lessons: None,
            };

            self.stories.lock().unwrap().push(created.clone());

            Ok(created)
        }
        .boxed()
    }

    fn list_stories(&self, filters: StoryFilters) -> BoxFuture<Result<Vec<Story>, BackendError>> {
        async move {
            let stories = self.stories.lock().unwrap();

            let mut matching: Vec<Story> = stories
                .iter()
                .rev()
                .filter(|story| MemoryDb::matches(story, &filters))
                .cloned()
                .collect();

            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            Ok(matching)
        }
        .boxed()
    }

    fn retrieve_story(&self, id: &Uuid) -> BoxFuture<Result<Option<Story>, BackendError>> {
        let id = *id;

        async move {
            let story = self
                .stories
                .lock()
                .unwrap()
                .iter()
                .find(|story| story.id == id)
                .cloned();

            Ok(story.map(|mut story| {
                story.lessons = Some(
                    self.lessons
                        .lock()
                        .unwrap()
                        .iter()
                        .filter(|lesson| lesson.story_id == id)
                        .cloned()
                        .collect(),
                );

                story
            }))
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
            let mut stories = self.stories.lock().unwrap();

            let story = match stories.iter_mut().find(|story| story.id == id) {
                Some(story) => story,
                None => return Ok(None),
            };

            if let Some(title) = update.title {
                story.title = title;
            }

            if let Some(elder_name) = update.elder_name {
                story.elder_name = elder_name;
            }

            if let Some(description) = update.description {
                story.description = Some(description);
            }

            if let Some(prompt) = update.prompt {
                story.prompt = Some(prompt);
            }

            if let Some(date) = update.date {
                story.date = date;
            }

            if let Some(tags) = update.tags {
                story.tags = tags;
            }

            if let Some(family_id) = update.family_id {
                story.family_id = Some(family_id);
            }

            Ok(Some(story.clone()))
        }
        .boxed()
    }

    fn delete_story(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        async move {
            let mut stories = self.stories.lock().unwrap();
            let before = stories.len();

            stories.retain(|story| story.id != id);

            if stories.len() == before {
                Err(BackendError::NonExistentId(id))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn list_families(&self) -> BoxFuture<Result<Vec<Family>, BackendError>> {
        async move { Ok(self.families.lock().unwrap().clone()) }.boxed()
    }

    fn list_lessons(&self) -> BoxFuture<Result<Vec<Lesson>, BackendError>> {
        async move { Ok(self.lessons.lock().unwrap().clone()) }.boxed()
    }
}
