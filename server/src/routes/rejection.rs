use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

// The no-field variants use braces so the untagged representation is
// an empty map, which `#[serde(flatten)]` accepts.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    Create {},
    Delete { id: String },
    Families {},
    Lessons {},
    List {},
    Retrieve { id: String },
    Update { id: String },
    Upload {},
}

impl Context {
    pub fn create() -> Context {
        Context::Create {}
    }

    pub fn delete(id: String) -> Context {
        Context::Delete { id }
    }

    pub fn families() -> Context {
        Context::Families {}
    }

    pub fn lessons() -> Context {
        Context::Lessons {}
    }

    pub fn list() -> Context {
        Context::List {}
    }

    pub fn retrieve(id: String) -> Context {
        Context::Retrieve { id }
    }

    pub fn update(id: String) -> Context {
        Context::Update { id }
    }

    pub fn upload() -> Context {
        Context::Upload {}
    }
}
