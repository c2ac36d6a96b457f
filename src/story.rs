use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::info;

use crate::completion::{Completion, CompletionError, SYSTEM_PROMPT};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Style {
    Sad,
    Scary,
    Serious,
    Adventurous,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Sad, Style::Scary, Style::Serious, Style::Adventurous];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Sad => "Sad",
            Style::Scary => "Scary",
            Style::Serious => "Serious",
            Style::Adventurous => "Adventurous",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("style must be one of Sad, Scary, Serious, Adventurous (got {0:?})")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Sad" => Ok(Style::Sad),
            "Scary" => Ok(Style::Scary),
            "Serious" => Ok(Style::Serious),
            // Older clients still send the misspelled name.
            "Adventurous" | "Adventourous" => Ok(Style::Adventurous),
            other => Err(UnknownStyle(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Accepts a missing value, `null` or an empty string as "no style".
pub fn deserialize_optional_style<'de, D>(deserializer: D) -> Result<Option<Style>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub fn build_prompt(topic: &str, style: Option<Style>) -> String {
    let mut prompt = format!("write a story under 500 words about {topic}");
    if let Some(style) = style {
        prompt.push_str(&format!(" in the style of {style}"));
    }
    prompt
}

pub fn build_rewrite_prompt(story: &str) -> String {
    format!("Rewrite this story in a funny way: {story}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryOutcome {
    Written {
        original_story: String,
        funny_story: String,
    },
    /// The first generation came back without text; no rewrite was attempted.
    EmptyStory,
    EmptyRewrite,
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Generates a story and then its funny rewrite, one call after the other.
pub async fn write_story(
    completion: &dyn Completion,
    policy: &RetryPolicy,
    topic: &str,
    style: Option<Style>,
) -> Result<StoryOutcome, CompletionError> {
    let Some(original_story) = write_single_story(completion, policy, topic, style).await? else {
        return Ok(StoryOutcome::EmptyStory);
    };

    let rewrite_prompt = build_rewrite_prompt(&original_story);
    let funny = policy
        .complete(completion, SYSTEM_PROMPT, &rewrite_prompt)
        .await?;

    match non_empty(funny) {
        Some(funny_story) => {
            info!(
                topic,
                original_len = original_story.len(),
                funny_len = funny_story.len(),
                "story written"
            );
            Ok(StoryOutcome::Written {
                original_story,
                funny_story,
            })
        }
        None => Ok(StoryOutcome::EmptyRewrite),
    }
}

/// Generates a story without the rewrite step. `None` means the backend
/// answered with no text.
pub async fn write_single_story(
    completion: &dyn Completion,
    policy: &RetryPolicy,
    topic: &str,
    style: Option<Style>,
) -> Result<Option<String>, CompletionError> {
    let prompt = build_prompt(topic, style);
    let story = policy.complete(completion, SYSTEM_PROMPT, &prompt).await?;
    Ok(non_empty(story))
}
