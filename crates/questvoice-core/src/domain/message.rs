//! Displayed story messages, as seen by per-message speech sites.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageAuthor {
    /// Narrator / game master output. The only speakable author.
    System,
    User,
}

/// A message as currently rendered in the story transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayedMessage {
    pub position: usize,
    pub author: MessageAuthor,
    pub content: String,
    /// "Thinking…" placeholder shown while the server composes a reply.
    #[serde(default)]
    pub is_placeholder: bool,
    /// Still receiving streamed chunks.
    #[serde(default)]
    pub is_streaming_chunk: bool,
}

impl DisplayedMessage {
    pub fn system(position: usize, content: impl Into<String>) -> Self {
        Self {
            position,
            author: MessageAuthor::System,
            content: content.into(),
            is_placeholder: false,
            is_streaming_chunk: false,
        }
    }

    pub fn user(position: usize, content: impl Into<String>) -> Self {
        Self {
            author: MessageAuthor::User,
            ..Self::system(position, content)
        }
    }

    pub const fn is_system(&self) -> bool {
        matches!(self.author, MessageAuthor::System)
    }

    /// System-authored, complete, and not a placeholder.
    pub const fn is_speakable(&self) -> bool {
        self.is_system() && !self.is_placeholder && !self.is_streaming_chunk
    }
}

/// Where a message sits within its story at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryContext {
    pub story_id: String,
    /// The story was started in this session rather than resumed.
    pub is_fresh_story: bool,
    /// Position of the most recent message in the transcript.
    pub latest_position: usize,
    /// Position of the first system message, if any has arrived.
    pub first_system_position: Option<usize>,
}

impl StoryContext {
    pub const fn is_opener(&self, position: usize) -> bool {
        matches!(self.first_system_position, Some(p) if p == position)
    }

    pub const fn is_latest(&self, position: usize) -> bool {
        self.latest_position == position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speakable() {
        assert!(DisplayedMessage::system(0, "Welcome.").is_speakable());
        assert!(!DisplayedMessage::user(1, "Hello").is_speakable());

        let mut thinking = DisplayedMessage::system(2, "");
        thinking.is_placeholder = true;
        assert!(!thinking.is_speakable());

        let mut partial = DisplayedMessage::system(3, "The dra");
        partial.is_streaming_chunk = true;
        assert!(!partial.is_speakable());
    }

    #[test]
    fn test_story_context_positions() {
        let ctx = StoryContext {
            story_id: "s1".into(),
            is_fresh_story: true,
            latest_position: 4,
            first_system_position: Some(0),
        };
        assert!(ctx.is_opener(0));
        assert!(!ctx.is_opener(4));
        assert!(ctx.is_latest(4));
    }

    #[test]
    fn test_message_deserializes_with_defaults() {
        let msg: DisplayedMessage =
            serde_json::from_str(r#"{"position":2,"author":"system","content":"Hi"}"#).unwrap();
        assert_eq!(msg, DisplayedMessage::system(2, "Hi"));
    }
}
