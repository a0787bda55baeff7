//! Session orchestration — one send/response cycle at a time.
//!
//! The session wires one user send action to the API client and the
//! transcript. Failures never escape a cycle: the error message becomes
//! chat content and the streaming slot is always finalized, so the
//! transcript can never end a cycle with an unsealed message. Taking
//! `&mut self` serializes sends; a second send cannot interleave with
//! an outstanding one.

use tracing::{debug, info};

use crate::api::{CallPurpose, GenerativeClient};
use crate::settings::Settings;
use crate::transcript::{ChatMessage, Transcript};

/// External input/view surface the session drives.
///
/// The session clears the input surface before the network call begins
/// so it is immediately reusable, and nudges the view after appends.
pub trait InputSurface {
    /// Discard any pending input.
    fn clear_input(&mut self);

    /// Keep the newest transcript content visible. Always safe to call;
    /// no transcript state impact.
    fn scroll_to_bottom(&mut self);
}

/// Outcome of one send action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// A model message was appended and sealed. It carries either the
    /// generated artifacts or an error fragment.
    Completed,
}

/// Drives request/response cycles against the transcript.
pub struct Session<C: GenerativeClient> {
    client: C,
    purpose: CallPurpose,
    settings: Settings,
    transcript: Transcript,
}

impl<C: GenerativeClient> Session<C> {
    pub fn new(client: C, purpose: CallPurpose, settings: Settings) -> Self {
        Self {
            client,
            purpose,
            settings,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn purpose(&self) -> CallPurpose {
        self.purpose
    }

    /// Handle one send action end to end.
    ///
    /// Empty input (after trimming) is silently ignored. Otherwise the
    /// user message and an open model message are appended, the client
    /// is invoked once, and the model message is sealed whether the
    /// call succeeded or failed.
    pub async fn handle_send(
        &mut self,
        raw_input: &str,
        surface: &mut dyn InputSurface,
    ) -> SendOutcome {
        let prompt = raw_input.trim();
        if prompt.is_empty() {
            debug!("Ignoring empty input");
            return SendOutcome::Ignored;
        }

        surface.clear_input();

        // Prior turns, captured before this cycle touches the transcript.
        let history: Vec<ChatMessage> = self.transcript.messages().to_vec();

        self.transcript.add_user_message(prompt);
        self.transcript.start_model_message();
        surface.scroll_to_bottom();

        match self
            .client
            .generate(self.purpose, &history, prompt, &self.settings)
            .await
        {
            Ok(artifacts) => {
                info!("Received {} artifact(s)", artifacts.len());
                for artifact in artifacts {
                    self.transcript.append_artifact(artifact);
                }
            }
            Err(e) => {
                info!("Generation failed: {}", e);
                self.transcript.append_text(format!("Error: {}", e));
            }
        }

        self.transcript.finalize_streaming_message();
        surface.scroll_to_bottom();

        SendOutcome::Completed
    }
}

/// Surface that ignores all view effects.
///
/// For headless call sites (and tests) where there is no pending input
/// to clear and no viewport to move.
#[derive(Debug, Default)]
pub struct NullSurface;

impl InputSurface for NullSurface {
    fn clear_input(&mut self) {}
    fn scroll_to_bottom(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FakeClient;
    use crate::error::Error;
    use crate::transcript::{Artifact, Role};

    /// Surface that records the order of calls against it.
    #[derive(Default)]
    struct RecordingSurface {
        cleared: usize,
        scrolled: usize,
    }

    impl InputSurface for RecordingSurface {
        fn clear_input(&mut self) {
            self.cleared += 1;
        }
        fn scroll_to_bottom(&mut self) {
            self.scrolled += 1;
        }
    }

    fn session(client: FakeClient, purpose: CallPurpose) -> Session<FakeClient> {
        Session::new(client, purpose, Settings::new())
    }

    #[tokio::test]
    async fn test_empty_input_is_silently_ignored() {
        let mut session = session(FakeClient::text("unused"), CallPurpose::Chat);
        let mut surface = RecordingSurface::default();

        let outcome = session.handle_send("   \t ", &mut surface).await;

        assert_eq!(outcome, SendOutcome::Ignored);
        assert!(session.transcript().is_empty());
        assert_eq!(surface.cleared, 0);
    }

    #[tokio::test]
    async fn test_success_appends_user_then_sealed_model_message() {
        let mut session = session(FakeClient::text("hello back"), CallPurpose::Chat);
        let mut surface = RecordingSurface::default();

        let outcome = session.handle_send("  hello  ", &mut surface).await;

        assert_eq!(outcome, SendOutcome::Completed);
        assert!(session.transcript().is_idle());

        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text_content(), "hello");
        assert!(messages[0].sealed);
        assert_eq!(messages[1].role, Role::Model);
        assert_eq!(messages[1].text_content(), "hello back");
        assert!(messages[1].sealed);

        assert_eq!(surface.cleared, 1);
        assert!(surface.scrolled >= 1);
    }

    #[tokio::test]
    async fn test_image_outcome_lands_in_model_message() {
        let mut session = session(
            FakeClient::image("AAAA", "image/png"),
            CallPurpose::ImageGeneration,
        );
        let mut surface = RecordingSurface::default();

        session.handle_send("draw a cat", &mut surface).await;

        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text_content(), "draw a cat");
        assert_eq!(
            messages[1].artifacts,
            vec![Artifact::image("AAAA", "image/png")]
        );
        assert!(messages[1].sealed);
    }

    #[tokio::test]
    async fn test_failure_becomes_error_fragment_and_slot_is_idle() {
        let mut session = session(FakeClient::failing("quota exceeded"), CallPurpose::Chat);
        let mut surface = RecordingSurface::default();

        let outcome = session.handle_send("hello", &mut surface).await;

        assert_eq!(outcome, SendOutcome::Completed);
        assert!(session.transcript().is_idle());

        let model = &session.transcript().messages()[1];
        assert!(model.sealed);
        assert_eq!(model.text_content(), "Error: quota exceeded");

        // The input surface was cleared before the call, failure or not.
        assert_eq!(surface.cleared, 1);
    }

    #[tokio::test]
    async fn test_malformed_response_is_scoped_to_one_cycle() {
        let client = FakeClient::with_outcomes(vec![
            Err(Error::MalformedResponse("no candidates in response".into())),
            Ok(vec![Artifact::text("recovered")]),
        ]);
        let mut session = session(client, CallPurpose::Chat);
        let mut surface = NullSurface;

        session.handle_send("first", &mut surface).await;
        session.handle_send("second", &mut surface).await;

        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(
            messages[1].text_content(),
            "Error: Malformed response: no candidates in response"
        );
        assert_eq!(messages[3].text_content(), "recovered");
        assert!(session.transcript().is_idle());
    }
}
