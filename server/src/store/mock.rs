use std::collections::HashMap;
use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};
use url::{ParseError, Url};

use crate::errors::BackendError;
use crate::store::Store;

/// An in-memory store for tests. Remembers each saved object with its
/// content type.
#[derive(Default)]
pub struct MockStore {
    pub map: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MockStore {
    pub fn new() -> Self {
        MockStore::default()
    }

    pub fn saved_paths(&self) -> Vec<String> {
        self.map.read().unwrap().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().unwrap().is_empty()
    }
}

impl Store for MockStore {
    fn get_url(&self, path: &str) -> Result<Url, ParseError> {
        Url::parse("https://storage.example.com/")?.join(path)
    }

    fn save(
        &self,
        path: &str,
        content_type: String,
        raw: Vec<u8>,
    ) -> BoxFuture<Result<(), BackendError>> {
        mock_save(self, path.to_owned(), content_type, raw).boxed()
    }
}

async fn mock_save(
    store: &MockStore,
    path: String,
    content_type: String,
    raw: Vec<u8>,
) -> Result<(), BackendError> {
    store.map.write().unwrap().insert(path, (content_type, raw));

    Ok(())
}
