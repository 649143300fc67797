use std::time::{Duration, Instant};

use log::debug;
use uuid::Uuid;
use warp::{
    filters::multipart::{FormData, Part},
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::io;
use crate::routes::{
    query::StoriesQuery,
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::story::{MediaType, NewStory, StoryUpdate};
use crate::upload::{generate_file_name, object_path, validate_upload, UploadResponse};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn create(environment: Environment, story: NewStory) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create(), e);

        story.validate().map_err(error_handler)?;
        debug!(environment.logger, "Creating story..."; "title" => &story.title);

        let story = environment
            .db
            .create_story(story)
            .await
            .map_err(error_handler)?;

        Box::new(with_header(
            with_status(json(&story), StatusCode::CREATED),
            "location",
            environment.urls.story(&story.id).as_str(),
        )) as Box<dyn Reply>
    }
}

pub async fn list(environment: Environment, query: StoriesQuery) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list(), e);

        debug!(environment.logger, "Listing stories..."; "query" => format!("{:?}", query));

        let stories = environment
            .db
            .list_stories(query.into())
            .await
            .map_err(error_handler)?;

        json(&stories)
    }
}

pub async fn retrieve(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::retrieve(id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Retrieving story..."; "id" => format!("{}", &id));

        let story = environment
            .db
            .retrieve_story(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&story)
    }
}

pub async fn update(environment: Environment, id: String, update: StoryUpdate) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::update(id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        update.validate().map_err(error_handler)?;
        debug!(environment.logger, "Updating story..."; "id" => format!("{}", &id));

        let story = environment
            .db
            .update_story(&id, update)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&story)
    }
}

pub async fn delete(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::delete(id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Deleting story..."; "id" => format!("{}", &id));

        // the media object is left in place; only the row goes
        environment.db.delete_story(&id).await.map_err(error_handler)?;

        json(&SuccessResponse::Deleted {
            message: "Story deleted successfully",
            id,
        })
    }
}

pub async fn upload(environment: Environment, content: FormData) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::upload(), e);

        let logger = environment.logger.clone();

        debug!(logger, "Parsing submission...");
        let file = find_file_part(content).await.map_err(error_handler)?;

        let essence = file
            .content_type()
            .ok_or(BackendError::MalformedFormSubmission)
            .map_err(error_handler)?
            .to_owned();

        // reject unsupported types before buffering the body
        let _ = MediaType::from_essence(&essence)
            .ok_or_else(|| BackendError::UnsupportedMediaType {
                essence: essence.clone(),
            })
            .map_err(error_handler)?;

        let original_name = file.filename().unwrap_or("recording").to_owned();

        let raw = io::part_as_vec(file).await.map_err(error_handler)?;
        let size = raw.len() as u64;

        let _ = validate_upload(&essence, size, environment.config.max_upload_bytes)
            .map_err(error_handler)?;

        let file_name = generate_file_name(&original_name);
        let path = object_path(&file_name);

        debug!(logger, "Saving media to store..."; "path" => &path, "size" => size);
        environment
            .store
            .save(&path, essence.clone(), raw)
            .await
            .map_err(error_handler)?;

        let url = environment
            .store
            .get_url(&path)
            .map_err(|e| BackendError::FailedToGenerateUrl { source: e })
            .map_err(error_handler)?;

        let response = UploadResponse {
            url,
            path,
            file_name,
            size,
            mime_type: essence,
            original_name,
        };

        with_status(json(&response), StatusCode::CREATED)
    }
}

pub async fn families(environment: Environment) -> RouteResult {
    timed! {
        let families = environment
            .db
            .list_families()
            .await
            .map_err(|e: BackendError| Rejection::new(Context::families(), e))?;

        json(&families)
    }
}

pub async fn lessons(environment: Environment) -> RouteResult {
    timed! {
        let lessons = environment
            .db
            .list_lessons()
            .await
            .map_err(|e: BackendError| Rejection::new(Context::lessons(), e))?;

        json(&lessons)
    }
}

fn parse_id(id: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(id).map_err(|_| BackendError::InvalidId(id.to_owned()))
}

async fn find_file_part(content: FormData) -> Result<Part, BackendError> {
    use futures::TryStreamExt;

    let parts: Vec<Part> = content
        .try_collect()
        .await
        .map_err(|_| BackendError::MalformedFormSubmission)?;

    parts
        .into_iter()
        .find(|part| part.name() == "file")
        .ok_or(BackendError::PartsMissing)
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
