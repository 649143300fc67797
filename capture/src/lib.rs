//! The client side of the story-capture workflow: a recorder state
//! machine over an abstract capture device, the metadata form, an
//! observable story store, and the upload-then-create sequence that
//! turns a finished recording into a persisted story.

pub mod api;
pub mod dates;
pub mod errors;
pub mod form;
pub mod recorder;
pub mod store;
pub mod workflow;
