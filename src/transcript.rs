//! Chat transcript — message list plus the streaming-message state machine.
//!
//! The transcript owns every visible message and a single "current
//! streaming message" slot. The slot is explicit state: idle when every
//! message is sealed, streaming while exactly one model message is open
//! for appends. All transitions happen through methods here; nothing
//! else mutates the message list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message role in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A displayable fragment of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Artifact {
    /// Plain text fragment.
    Text(String),
    /// Base64-encoded image bytes plus mime type.
    Image { data: String, mime_type: String },
}

impl Artifact {
    pub fn text(content: impl Into<String>) -> Self {
        Artifact::Text(content.into())
    }

    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Artifact::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Artifact::Image { .. })
    }
}

/// One transcript entry.
///
/// Created empty when the model begins responding, appended to
/// incrementally, then sealed when the response completes or errors.
/// User messages are sealed at creation; they are never streamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub artifacts: Vec<Artifact>,
    pub sealed: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn sealed_user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            artifacts: vec![Artifact::text(text)],
            sealed: true,
            timestamp: Utc::now(),
        }
    }

    fn open_model() -> Self {
        Self {
            role: Role::Model,
            artifacts: Vec::new(),
            sealed: false,
            timestamp: Utc::now(),
        }
    }

    /// Concatenated text artifacts of this message.
    pub fn text_content(&self) -> String {
        let fragments: Vec<&str> = self
            .artifacts
            .iter()
            .filter_map(|a| match a {
                Artifact::Text(text) => Some(text.as_str()),
                Artifact::Image { .. } => None,
            })
            .collect();
        fragments.join("\n")
    }
}

/// The transcript and its single streaming slot.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    streaming: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no model message is open.
    pub fn is_idle(&self) -> bool {
        self.streaming.is_none()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a sealed user message.
    ///
    /// Invariant: a user turn never begins against an unsealed model
    /// message. If one is still open it is finalized first.
    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.finalize_streaming_message();
        self.messages.push(ChatMessage::sealed_user(text));
    }

    /// Open an empty model message and enter the streaming state.
    ///
    /// Calling this while a model message is already open reuses the
    /// existing slot unchanged.
    pub fn start_model_message(&mut self) {
        if self.streaming.is_some() {
            return;
        }
        self.messages.push(ChatMessage::open_model());
        self.streaming = Some(self.messages.len() - 1);
    }

    /// Append an artifact to the open model message, opening one first
    /// if the slot is idle.
    pub fn append_artifact(&mut self, artifact: Artifact) {
        if self.streaming.is_none() {
            self.start_model_message();
        }
        if let Some(index) = self.streaming {
            self.messages[index].artifacts.push(artifact);
        }
    }

    /// Append a text fragment to the open model message.
    pub fn append_text(&mut self, text: impl Into<String>) {
        self.append_artifact(Artifact::text(text));
    }

    /// Seal the open model message and return to idle. Idempotent: a
    /// no-op when the slot is already clear.
    pub fn finalize_streaming_message(&mut self) {
        if let Some(index) = self.streaming.take() {
            self.messages[index].sealed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_sealed_immediately() {
        let mut transcript = Transcript::new();
        transcript.add_user_message("hello");

        assert!(transcript.is_idle());
        let msg = &transcript.messages()[0];
        assert_eq!(msg.role, Role::User);
        assert!(msg.sealed);
        assert_eq!(msg.text_content(), "hello");
    }

    #[test]
    fn test_start_append_finalize_cycle() {
        let mut transcript = Transcript::new();
        transcript.add_user_message("hi");
        transcript.start_model_message();
        assert!(!transcript.is_idle());

        transcript.append_text("hello back");
        transcript.finalize_streaming_message();

        assert!(transcript.is_idle());
        let msg = &transcript.messages()[1];
        assert_eq!(msg.role, Role::Model);
        assert!(msg.sealed);
        assert_eq!(msg.text_content(), "hello back");
    }

    #[test]
    fn test_double_start_reuses_slot() {
        let mut transcript = Transcript::new();
        transcript.start_model_message();
        transcript.append_text("first");
        transcript.start_model_message();
        transcript.append_text("second");
        transcript.finalize_streaming_message();

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].text_content(), "first\nsecond");
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut transcript = Transcript::new();
        transcript.start_model_message();
        transcript.finalize_streaming_message();
        assert!(transcript.is_idle());

        transcript.finalize_streaming_message();
        assert!(transcript.is_idle());
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_append_while_idle_auto_starts() {
        let mut transcript = Transcript::new();
        transcript.append_artifact(Artifact::image("AAAA", "image/png"));

        assert!(!transcript.is_idle());
        let msg = &transcript.messages()[0];
        assert_eq!(msg.role, Role::Model);
        assert!(msg.artifacts[0].is_image());
    }

    #[test]
    fn test_user_message_seals_open_model_message() {
        let mut transcript = Transcript::new();
        transcript.start_model_message();
        transcript.append_text("partial");

        transcript.add_user_message("interrupting");

        let model = &transcript.messages()[0];
        assert!(model.sealed);
        let user = &transcript.messages()[1];
        assert_eq!(user.role, Role::User);
        assert!(transcript.is_idle());
    }

    #[test]
    fn test_text_content_skips_image_artifacts() {
        let mut transcript = Transcript::new();
        transcript.append_text("here you go");
        transcript.append_artifact(Artifact::image("AAAA", "image/png"));
        transcript.finalize_streaming_message();

        assert_eq!(transcript.messages()[0].text_content(), "here you go");
    }
}
