use std::sync::Arc;

use log::{debug, Logger};
use uuid::Uuid;

use crate::api::{
    CreateStoryRequest, ListFilters, StoryApi, StoryRecord, UpdateStoryRequest, UploadClient,
};
use crate::errors::{ClientError, ValidationError};
use crate::form::StoryDraft;

/// Orchestrates the capture-and-persist sequence against the REST
/// seams. Creation is strictly sequential and not idempotent: the
/// upload must complete before the story is created, and an upload
/// failure abandons the whole submission (the already-uploaded object,
/// if any, is orphaned; there is no cleanup path).
pub struct CaptureWorkflow {
    logger: Arc<Logger>,
    store: Arc<crate::store::StoryStore>,
    uploads: Arc<dyn UploadClient>,
    api: Arc<dyn StoryApi>,
}

impl CaptureWorkflow {
    pub fn new(
        logger: Arc<Logger>,
        store: Arc<crate::store::StoryStore>,
        uploads: Arc<dyn UploadClient>,
        api: Arc<dyn StoryApi>,
    ) -> Self {
        CaptureWorkflow {
            logger,
            store,
            uploads,
            api,
        }
    }

    pub fn store(&self) -> &crate::store::StoryStore {
        &self.store
    }

    /// Reloads the story list. Results replace the in-memory list.
    pub async fn refresh(&self, filters: ListFilters) -> Result<Vec<StoryRecord>, ClientError> {
        self.store.begin();

        let result = self.api.list(filters).await;

        match result {
            Ok(stories) => {
                self.store.put_stories(stories.clone());
                Ok(stories)
            }
            Err(e) => Err(self.published(e)),
        }
    }

    /// Fetches a single story and makes it the selection.
    pub async fn open(&self, id: Uuid) -> Result<StoryRecord, ClientError> {
        self.store.begin();

        let result = self.api.retrieve(id).await;

        match result {
            Ok(story) => {
                self.store.select(story.clone());
                Ok(story)
            }
            Err(e) => Err(self.published(e)),
        }
    }

    /// Persists a submission. New stories go upload-then-create; edits
    /// send metadata only.
    pub async fn save(&self, draft: StoryDraft) -> Result<StoryRecord, ClientError> {
        self.store.begin();

        let result = match draft.editing {
            Some(id) => self.save_edit(id, draft).await,
            None => self.save_new(draft).await,
        };

        match result {
            Ok(story) => Ok(story),
            Err(e) => Err(self.published(e)),
        }
    }

    /// Deletes a story and prunes it from the list. The media object
    /// in storage is left behind.
    pub async fn remove(&self, id: Uuid) -> Result<(), ClientError> {
        self.store.begin();

        let result = self.api.delete(id).await;

        match result {
            Ok(id) => {
                self.store.remove(id);
                Ok(())
            }
            Err(e) => Err(self.published(e)),
        }
    }

    async fn save_new(&self, draft: StoryDraft) -> Result<StoryRecord, ClientError> {
        let (blob, capability) = draft.media.ok_or(ValidationError::MediaMissing)?;

        debug!(self.logger, "Uploading media..."; "size" => blob.size(), "mime_type" => &blob.mime_type);
        let uploaded = self.uploads.upload(blob).await?;

        debug!(self.logger, "Creating story..."; "url" => %uploaded.url);
        let request = CreateStoryRequest {
            title: draft.title,
            elder_name: draft.elder_name,
            media_type: capability.as_str().to_owned(),
            media_url: uploaded.url,
            media_size: Some(uploaded.size),
            description: draft.description,
            prompt: draft.prompt,
            date: draft.date,
            tags: draft.tags,
            family_id: None,
        };

        let story = self.api.create(request).await?;
        self.store.prepend(story.clone());

        Ok(story)
    }

    async fn save_edit(&self, id: Uuid, draft: StoryDraft) -> Result<StoryRecord, ClientError> {
        debug!(self.logger, "Updating story metadata..."; "id" => %id);

        let request = UpdateStoryRequest {
            title: Some(draft.title),
            elder_name: Some(draft.elder_name),
            description: draft.description,
            prompt: draft.prompt,
            date: Some(draft.date),
            tags: Some(draft.tags),
            family_id: None,
        };

        let story = self.api.update(id, request).await?;
        self.store.replace(story.clone());

        Ok(story)
    }

    fn published(&self, error: ClientError) -> ClientError {
        self.store.fail(error.to_string());
        error
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use time::Date;
    use url::Url;

    use super::*;
    use crate::recorder::{Capability, MediaBlob};
    use crate::store::StoryStore;

    struct FakeUploads {
        fail: bool,
        uploaded: Mutex<Vec<u64>>,
    }

    impl UploadClient for FakeUploads {
        fn upload(
            &self,
            blob: MediaBlob,
        ) -> BoxFuture<'_, Result<crate::api::UploadedMedia, ClientError>> {
            async move {
                if self.fail {
                    return Err(ClientError::Upload {
                        message: "bucket does not exist".to_owned(),
                    });
                }

                self.uploaded.lock().unwrap().push(blob.size());

                Ok(crate::api::UploadedMedia {
                    url: Url::parse("https://storage.example.com/stories/1-a.webm").unwrap(),
                    path: "stories/1-a.webm".to_owned(),
                    file_name: "1-a.webm".to_owned(),
                    size: blob.size(),
                    mime_type: blob.mime_type,
                    original_name: "recording.webm".to_owned(),
                })
            }
            .boxed()
        }
    }

    struct FakeApi {
        created: AtomicBool,
        stories: Mutex<Vec<StoryRecord>>,
    }

    impl FakeApi {
        fn new() -> Self {
            FakeApi {
                created: AtomicBool::new(false),
                stories: Mutex::new(vec![]),
            }
        }

        fn record_from(request: &CreateStoryRequest) -> StoryRecord {
            StoryRecord {
                id: Uuid::new_v4(),
                title: request.title.clone(),
                elder_name: request.elder_name.clone(),
                media_type: request.media_type.clone(),
                media_url: request.media_url.clone(),
                media_size: request.media_size,
                description: request.description.clone(),
                prompt: request.prompt.clone(),
                date: request.date,
                tags: request.tags.clone(),
                family_id: request.family_id,
                created_at: None,
            }
        }
    }

    impl StoryApi for FakeApi {
        fn create(
            &self,
            request: CreateStoryRequest,
        ) -> BoxFuture<'_, Result<StoryRecord, ClientError>> {
            async move {
                self.created.store(true, Ordering::SeqCst);

                let story = FakeApi::record_from(&request);
                self.stories.lock().unwrap().push(story.clone());

                Ok(story)
            }
            .boxed()
        }

        fn list(
            &self,
            _filters: ListFilters,
        ) -> BoxFuture<'_, Result<Vec<StoryRecord>, ClientError>> {
            async move { Ok(self.stories.lock().unwrap().clone()) }.boxed()
        }

        fn retrieve(&self, id: Uuid) -> BoxFuture<'_, Result<StoryRecord, ClientError>> {
            async move {
                self.stories
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|story| story.id == id)
                    .cloned()
                    .ok_or(ClientError::NotFound { id })
            }
            .boxed()
        }

        fn update(
            &self,
            id: Uuid,
            request: UpdateStoryRequest,
        ) -> BoxFuture<'_, Result<StoryRecord, ClientError>> {
            async move {
                let mut stories = self.stories.lock().unwrap();
                let story = stories
                    .iter_mut()
                    .find(|story| story.id == id)
                    .ok_or(ClientError::NotFound { id })?;

                if let Some(title) = request.title {
                    story.title = title;
                }

                Ok(story.clone())
            }
            .boxed()
        }

        fn delete(&self, id: Uuid) -> BoxFuture<'_, Result<Uuid, ClientError>> {
            async move {
                let mut stories = self.stories.lock().unwrap();
                let before = stories.len();
                stories.retain(|story| story.id != id);

                if stories.len() == before {
                    Err(ClientError::NotFound { id })
                } else {
                    Ok(id)
                }
            }
            .boxed()
        }
    }

    fn workflow(fail_upload: bool) -> (CaptureWorkflow, Arc<FakeApi>, Arc<StoryStore>) {
        let store = Arc::new(StoryStore::new());
        let api = Arc::new(FakeApi::new());
        let uploads = Arc::new(FakeUploads {
            fail: fail_upload,
            uploaded: Mutex::new(vec![]),
        });

        let workflow = CaptureWorkflow::new(
            Arc::new(log::discard_logger()),
            store.clone(),
            uploads,
            api.clone(),
        );

        (workflow, api, store)
    }

    fn draft() -> StoryDraft {
        StoryDraft {
            title: "Trip to Delhi".to_owned(),
            elder_name: "Grandfather Ram".to_owned(),
            date: Date::try_from_ymd(2024, 1, 15).unwrap(),
            tags: vec!["travel".to_owned(), "family".to_owned()],
            description: None,
            prompt: None,
            media: Some((
                MediaBlob {
                    data: vec![0; 2 * 1024 * 1024],
                    mime_type: "audio/webm".to_owned(),
                },
                Capability::Audio,
            )),
            editing: None,
        }
    }

    #[tokio::test]
    async fn save_uploads_then_creates_and_prepends() {
        let (workflow, _, store) = workflow(false);

        let story = workflow.save(draft()).await.unwrap();

        assert_eq!(story.media_type, "audio");
        assert_eq!(story.media_size, Some(2 * 1024 * 1024));
        assert!(story
            .media_url
            .as_str()
            .ends_with("stories/1-a.webm"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.stories.len(), 1);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn failed_upload_abandons_the_create() {
        let (workflow, api, store) = workflow(true);

        let error = workflow.save(draft()).await.unwrap_err();

        assert_eq!(
            error,
            ClientError::Upload {
                message: "bucket does not exist".to_owned()
            }
        );
        assert!(!api.created.load(Ordering::SeqCst));

        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("upload failed: bucket does not exist")
        );
        assert!(snapshot.stories.is_empty());
    }

    #[tokio::test]
    async fn save_without_media_is_a_validation_error() {
        let (workflow, api, _) = workflow(false);

        let mut empty = draft();
        empty.media = None;

        let error = workflow.save(empty).await.unwrap_err();

        assert_eq!(error, ClientError::Validation(ValidationError::MediaMissing));
        assert!(!api.created.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn edit_sends_metadata_only_and_replaces_in_store() {
        let (workflow, _, store) = workflow(false);

        let created = workflow.save(draft()).await.unwrap();

        let mut edit = draft();
        edit.title = "New Title".to_owned();
        edit.media = None;
        edit.editing = Some(created.id);

        let updated = workflow.save(edit).await.unwrap();

        assert_eq!(updated.title, "New Title");
        assert_eq!(updated.media_url, created.media_url);
        assert_eq!(updated.media_type, created.media_type);
        assert_eq!(store.snapshot().stories[0].title, "New Title");
    }

    #[tokio::test]
    async fn remove_prunes_the_list() {
        let (workflow, _, store) = workflow(false);

        let created = workflow.save(draft()).await.unwrap();
        workflow.remove(created.id).await.unwrap();

        assert!(store.snapshot().stories.is_empty());
    }

    #[tokio::test]
    async fn remove_of_unknown_story_publishes_not_found() {
        let (workflow, _, store) = workflow(false);
        let id = Uuid::new_v4();

        let error = workflow.remove(id).await.unwrap_err();

        assert_eq!(error, ClientError::NotFound { id });
        assert_eq!(
            store.snapshot().error,
            Some(format!("story {} not found", id))
        );
    }

    #[tokio::test]
    async fn refresh_replaces_the_list() {
        let (workflow, _, store) = workflow(false);

        workflow.save(draft()).await.unwrap();
        workflow.refresh(ListFilters::default()).await.unwrap();

        assert_eq!(store.snapshot().stories.len(), 1);
    }
}
