use url::Url;
use uuid::Uuid;

/// The addresses under which stories are served.
#[derive(Clone, Debug)]
pub struct Urls {
    pub base: Url,
    pub stories_path: String,
}

impl Urls {
    pub fn new(base: impl AsRef<str>, stories_path: impl Into<String>) -> Self {
        Urls {
            base: Url::parse(base.as_ref()).expect("parse base URL"),
            stories_path: stories_path.into(),
        }
    }

    /// Returns the canonical URL of the given story.
    pub fn story(&self, id: &Uuid) -> Url {
        self.base
            .join(&format!("{}/{}", self.stories_path, id))
            .expect("join story path to base URL")
    }
}

#[cfg(test)]
mod tests {
    use super::Urls;
    use uuid::Uuid;

    #[test]
    fn story_url_includes_path_and_id() {
        let urls = Urls::new("https://api.example.com/", "stories");
        let id = Uuid::new_v4();

        assert_eq!(
            urls.story(&id).as_str(),
            format!("https://api.example.com/stories/{}", id)
        );
    }
}
