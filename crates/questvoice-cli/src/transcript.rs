//! Story transcript files replayed by `questvoice story`.
//!
//! ```json
//! {
//!   "storyId": "crypt-01",
//!   "fresh": true,
//!   "messages": [
//!     { "position": 0, "author": "system", "content": "You wake in a crypt." },
//!     { "position": 1, "author": "user", "content": "I light a torch." }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use questvoice_core::{DisplayedMessage, StoryContext};

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub story_id: String,
    /// The story starts in this run rather than being resumed.
    #[serde(default)]
    pub fresh: bool,
    pub messages: Vec<DisplayedMessage>,
}

impl Transcript {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, CliError> {
        let transcript: Self =
            serde_json::from_str(raw).map_err(|e| CliError::Data(format!("transcript: {e}")))?;
        if transcript
            .messages
            .windows(2)
            .any(|w| w[1].position <= w[0].position)
        {
            return Err(CliError::Data(
                "transcript positions must be strictly increasing".into(),
            ));
        }
        Ok(transcript)
    }

    /// Story context as seen when `messages[..=index]` have arrived.
    pub fn context_at(&self, index: usize) -> StoryContext {
        let arrived = &self.messages[..=index];
        StoryContext {
            story_id: self.story_id.clone(),
            is_fresh_story: self.fresh,
            latest_position: arrived[index].position,
            first_system_position: arrived.iter().find(|m| m.is_system()).map(|m| m.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRYPT: &str = r#"{
        "storyId": "crypt-01",
        "fresh": true,
        "messages": [
            { "position": 0, "author": "user", "content": "Begin." },
            { "position": 1, "author": "system", "content": "You wake in a crypt." },
            { "position": 2, "author": "user", "content": "I light a torch." },
            { "position": 3, "author": "system", "content": "Shadows flee." }
        ]
    }"#;

    #[test]
    fn test_parse_and_context() {
        let transcript = Transcript::parse(CRYPT).unwrap();
        assert_eq!(transcript.messages.len(), 4);

        let before_opener = transcript.context_at(0);
        assert_eq!(before_opener.first_system_position, None);

        let at_end = transcript.context_at(3);
        assert_eq!(at_end.latest_position, 3);
        assert_eq!(at_end.first_system_position, Some(1));
        assert!(at_end.is_fresh_story);
    }

    #[test]
    fn test_rejects_unordered_positions() {
        let raw = r#"{"storyId":"s","messages":[
            {"position":2,"author":"system","content":"a"},
            {"position":1,"author":"system","content":"b"}]}"#;
        let err = Transcript::parse(raw).unwrap_err();
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Transcript::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
