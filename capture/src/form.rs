use time::Date;
use uuid::Uuid;

use crate::api::StoryRecord;
use crate::errors::ValidationError;
use crate::recorder::{Capability, MediaBlob};

/// The fixed set of suggested interview questions. Selecting one
/// overwrites whatever free-text prompt was typed.
pub const GUIDED_PROMPTS: [&str; 8] = [
    "Tell us about a significant life event that shaped who you are today.",
    "Share a story about your childhood or family traditions.",
    "What is the most important lesson you learned from your parents or grandparents?",
    "Describe a challenge you overcame and how you did it.",
    "Tell us about your career journey and key decisions you made.",
    "Share wisdom or advice you would give to future generations.",
    "What cultural traditions or practices are important to you?",
    "Tell us about a person who greatly influenced your life.",
];

/// Collects story metadata and merges it with a finished recording
/// into a submission payload. Performs no I/O of its own.
#[derive(Clone, Debug)]
pub struct StoryForm {
    pub title: String,
    pub elder_name: String,
    pub date: Date,
    /// Comma-separated as typed; split into a tag set on submit.
    pub tags: String,
    pub description: String,
    pub prompt: String,
    editing: Option<Uuid>,
}

impl StoryForm {
    /// An empty form for a new story; the date defaults to today.
    pub fn new(today: Date) -> Self {
        StoryForm {
            title: String::new(),
            elder_name: String::new(),
            date: today,
            tags: String::new(),
            description: String::new(),
            prompt: String::new(),
            editing: None,
        }
    }

    /// A form pre-filled from an existing story. Media is read-only in
    /// this mode and never re-enters the payload.
    pub fn for_edit(story: &StoryRecord) -> Self {
        StoryForm {
            title: story.title.clone(),
            elder_name: story.elder_name.clone(),
            date: story.date,
            tags: format_tags(&story.tags),
            description: story.description.clone().unwrap_or_default(),
            prompt: story.prompt.clone().unwrap_or_default(),
            editing: Some(story.id),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Copies a guided prompt into the prompt field, replacing any
    /// typed text. Out-of-range indexes are ignored.
    pub fn select_prompt(&mut self, index: usize) {
        if let Some(prompt) = GUIDED_PROMPTS.get(index) {
            self.prompt = (*prompt).to_owned();
        }
    }

    /// Validates the form and produces the submission payload. In
    /// create mode the payload carries the attached blob and its
    /// capability; in edit mode it carries neither, regardless of what
    /// the caller passes.
    pub fn submit(
        &self,
        media: Option<(MediaBlob, Capability)>,
    ) -> Result<StoryDraft, ValidationError> {
        let title = required(&self.title, "title")?;
        let elder_name = required(&self.elder_name, "elderName")?;

        Ok(StoryDraft {
            title,
            elder_name,
            date: self.date,
            tags: parse_tags(&self.tags),
            description: optional(&self.description),
            prompt: optional(&self.prompt),
            media: if self.editing.is_some() { None } else { media },
            editing: self.editing,
        })
    }
}

/// A validated submission, ready for the capture workflow.
#[derive(Debug)]
pub struct StoryDraft {
    pub title: String,
    pub elder_name: String,
    pub date: Date,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub media: Option<(MediaBlob, Capability)>,
    pub editing: Option<Uuid>,
}

/// Splits comma-separated input into trimmed, non-empty, deduplicated
/// tags. Insertion order is preserved for display.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = vec![];

    for tag in input.split(',') {
        let tag = tag.trim();

        if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_owned());
        }
    }

    tags
}

/// Reverses [`parse_tags`] for edit-mode pre-filling.
pub fn format_tags(tags: &[String]) -> String {
    tags.join(", ")
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(value.to_owned())
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();

    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}
