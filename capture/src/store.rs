use std::sync::Mutex;

use uuid::Uuid;

use crate::api::StoryRecord;

/// A point-in-time copy of the client's story state.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub stories: Vec<StoryRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<StoryRecord>,
}

type Subscriber = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// The view layer's story state: list, loading/error flags, and the
/// currently selected story, with explicit subscribe/notify. Owned by
/// whoever constructs it and passed in where needed; there is no
/// hidden module-level instance.
#[derive(Default)]
pub struct StoryStore {
    state: Mutex<Snapshot>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl StoryStore {
    pub fn new() -> Self {
        StoryStore::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().unwrap().clone()
    }

    /// Registers a callback invoked after every state change, with the
    /// snapshot that change produced.
    pub fn subscribe(&self, subscriber: impl Fn(&Snapshot) + Send + Sync + 'static) {
        self.subscribers.lock().unwrap().push(Box::new(subscriber));
    }

    /// Marks the start of a request: loading on, previous error gone.
    pub fn begin(&self) {
        self.mutate(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    /// Records a failure and returns the store to an actionable state;
    /// loading never stays set after an error.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();

        self.mutate(move |state| {
            state.error = Some(message.clone());
            state.loading = false;
        });
    }

    pub fn put_stories(&self, stories: Vec<StoryRecord>) {
        self.mutate(move |state| {
            state.stories = stories.clone();
            state.loading = false;
        });
    }

    /// Adds a freshly created story at the head of the list.
    pub fn prepend(&self, story: StoryRecord) {
        self.mutate(move |state| {
            state.stories.insert(0, story.clone());
            state.loading = false;
        });
    }

    /// Swaps an updated story into the list and, if it is the selected
    /// one, into the selection.
    pub fn replace(&self, story: StoryRecord) {
        self.mutate(move |state| {
            for existing in state.stories.iter_mut() {
                if existing.id == story.id {
                    *existing = story.clone();
                }
            }

            if state.selected.as_ref().map(|s| s.id) == Some(story.id) {
                state.selected = Some(story.clone());
            }

            state.loading = false;
        });
    }

    pub fn remove(&self, id: Uuid) {
        self.mutate(move |state| {
            state.stories.retain(|story| story.id != id);

            if state.selected.as_ref().map(|s| s.id) == Some(id) {
                state.selected = None;
            }

            state.loading = false;
        });
    }

    pub fn select(&self, story: StoryRecord) {
        self.mutate(move |state| {
            state.selected = Some(story.clone());
            state.loading = false;
        });
    }

    pub fn clear_selected(&self) {
        self.mutate(|state| state.selected = None);
    }

    pub fn clear_error(&self) {
        self.mutate(|state| state.error = None);
    }

    fn mutate(&self, change: impl Fn(&mut Snapshot)) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            change(&mut state);
            state.clone()
        };

        for subscriber in self.subscribers.lock().unwrap().iter() {
            subscriber(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::Date;
    use url::Url;

    use super::*;

    fn story(title: &str) -> StoryRecord {
        StoryRecord {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            elder_name: "Grandmother Sita".to_owned(),
            media_type: "audio".to_owned(),
            media_url: Url::parse("https://storage.example.com/stories/1-a.webm").unwrap(),
            media_size: None,
            description: None,
            prompt: None,
            date: Date::try_from_ymd(2024, 1, 15).unwrap(),
            tags: vec![],
            family_id: None,
            created_at: None,
        }
    }

    #[test]
    fn subscribers_see_every_change() {
        let store = StoryStore::new();
        let seen = Arc::new(Mutex::new(Vec::<(bool, usize)>::new()));

        let seen2 = seen.clone();
        store.subscribe(move |snapshot| {
            seen2
                .lock()
                .unwrap()
                .push((snapshot.loading, snapshot.stories.len()));
        });

        store.begin();
        store.put_stories(vec![story("one")]);
        store.prepend(story("two"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(true, 0), (false, 1), (false, 2)]
        );
    }

    #[test]
    fn fail_clears_loading_and_sets_error() {
        let store = StoryStore::new();

        store.begin();
        store.fail("bucket does not exist");

        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("bucket does not exist"));

        store.begin();
        assert_eq!(store.snapshot().error, None);
    }

    #[test]
    fn replace_updates_list_and_selection() {
        let store = StoryStore::new();
        let mut target = story("before");

        store.put_stories(vec![story("other"), target.clone()]);
        store.select(target.clone());

        target.title = "after".to_owned();
        store.replace(target.clone());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.stories[1].title, "after");
        assert_eq!(snapshot.selected.unwrap().title, "after");
    }

    #[test]
    fn remove_prunes_list_and_selection() {
        let store = StoryStore::new();
        let target = story("doomed");

        store.put_stories(vec![target.clone(), story("kept")]);
        store.select(target.clone());
        store.remove(target.id);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.stories.len(), 1);
        assert_eq!(snapshot.stories[0].title, "kept");
        assert!(snapshot.selected.is_none());
    }
}
