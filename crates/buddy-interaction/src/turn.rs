//! Conversation turn coordination.
//!
//! `ChatSession` orchestrates one request/response cycle: append the user
//! message, build the prompt, call the generation agent, post-process the
//! reply, request speech, append the assistant message, and kick off
//! auto-play. Speech and playback are best-effort side tasks — their
//! failure never rolls back the text turn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use buddy_core::{ChatMessage, LearnerProfile, Personality};
use buddy_infrastructure::UploadedFile;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, warn};
use uuid::Uuid;

use crate::agent::{GenerationAgent, GenerationRequest, InlineAttachment};
use crate::playback::PlaybackController;
use crate::prompt::build_prompt;
use crate::sanitize::{clean_for_speech, truncate_reply, OUTPUT_CHAR_LIMIT};
use crate::speech::SpeechSynthesizer;

/// Fixed user-facing text appended when a generation request fails.
pub const GENERATION_FAILURE_NOTICE: &str =
    "Sorry, I encountered an error. Please check your API keys and try again.";

/// One-time notice emitted when the speech quota runs out.
pub const QUOTA_NOTICE: &str =
    "The speech quota is used up, so replies will be text-only. Auto-play has been turned off.";

/// Result of a `submit` call.
///
/// Text readiness and audio readiness are reported independently: a turn
/// with `audio: false` still completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty input, or another turn was in flight. Nothing changed.
    Ignored,
    /// An assistant reply was appended.
    Replied {
        /// Whether synthesized speech was stored with the reply.
        audio: bool,
        /// One-time user-visible notice (quota exhaustion).
        notice: Option<String>,
    },
    /// Generation failed; an error message was appended instead.
    Failed,
}

/// One learner conversation: selected personality, learner context,
/// append-only history, and the collaborators for generation, speech, and
/// playback.
pub struct ChatSession {
    id: String,
    personality: Personality,
    profile: LearnerProfile,
    history: Arc<RwLock<Vec<ChatMessage>>>,
    pending_file: Mutex<Option<UploadedFile>>,
    in_flight: AtomicBool,
    quota_notified: AtomicBool,
    agent: Arc<dyn GenerationAgent>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    playback: Arc<PlaybackController>,
}

/// Clears the in-flight flag on every exit path, success or failure.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ChatSession {
    /// Creates a new session with empty conversation history.
    pub fn new(
        personality: Personality,
        profile: LearnerProfile,
        agent: Arc<dyn GenerationAgent>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        playback: Arc<PlaybackController>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            personality,
            profile,
            history: Arc::new(RwLock::new(Vec::new())),
            pending_file: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            quota_notified: AtomicBool::new(false),
            agent,
            synthesizer,
            playback,
        }
    }

    /// Returns the session ID.
    pub fn session_id(&self) -> &str {
        &self.id
    }

    /// Returns the personality conditioning this session.
    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    /// Returns the playback controller shared with the UI.
    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Returns a snapshot of the conversation history.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.read().await.clone()
    }

    /// Attaches a file to the next submitted turn, replacing any previous
    /// pending attachment.
    pub async fn attach(&self, file: UploadedFile) {
        *self.pending_file.lock().await = Some(file);
    }

    /// Name of the pending attachment, for display.
    pub async fn pending_attachment(&self) -> Option<String> {
        self.pending_file.lock().await.as_ref().map(|f| f.name.clone())
    }

    /// Clears the conversation history and any pending attachment.
    pub async fn reset(&self) {
        self.history.write().await.clear();
        *self.pending_file.lock().await = None;
    }

    /// Runs one conversation turn.
    ///
    /// Preconditions: trimmed input is non-empty and no turn is currently
    /// in flight; otherwise the call is a silent no-op. A turn's user
    /// message is always appended before its assistant or error
    /// counterpart, and the in-flight guard serializes turns.
    pub async fn submit(&self, input: &str) -> TurnOutcome {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return TurnOutcome::Ignored;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return TurnOutcome::Ignored;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let attachment = self.pending_file.lock().await.take().map(InlineAttachment::from);

        // Snapshot before appending so the new message is rendered once,
        // under the question heading.
        let prior_history = self.history.read().await.clone();
        self.history.write().await.push(ChatMessage::user(trimmed));

        let prompt = build_prompt(&self.personality, &self.profile, &prior_history, trimmed);
        let mut request = GenerationRequest::text(prompt);
        if let Some(attachment) = attachment {
            request = request.with_attachment(attachment);
        }

        let raw = match self.agent.generate(request).await {
            Ok(text) => text,
            Err(err) => {
                error!(session = %self.id, "generation failed: {err}");
                self.history
                    .write()
                    .await
                    .push(ChatMessage::error(GENERATION_FAILURE_NOTICE));
                return TurnOutcome::Failed;
            }
        };

        // The truncated text is the single stored value; display and
        // speech both derive from it.
        let reply = truncate_reply(&raw, OUTPUT_CHAR_LIMIT);

        let (audio, notice) = self.synthesize_reply(&reply).await;

        self.history
            .write()
            .await
            .push(ChatMessage::assistant(&reply, audio.clone()));

        if let Some(handle) = &audio {
            if self.playback.auto_play() {
                if let Err(err) = self.playback.play(handle) {
                    warn!(session = %self.id, "auto-play failed: {err}");
                }
            }
        }

        TurnOutcome::Replied {
            audio: audio.is_some(),
            notice,
        }
    }

    /// Requests speech for a finished reply. Failures are silent except the
    /// quota sub-case, which disables auto-play and produces a one-time
    /// notice.
    async fn synthesize_reply(
        &self,
        reply: &str,
    ) -> (Option<buddy_core::AudioHandle>, Option<String>) {
        let synthesizer = match &self.synthesizer {
            Some(s) => s,
            None => return (None, None),
        };
        let voice_id = match self.personality.voice_id.as_deref() {
            Some(v) => v,
            None => return (None, None),
        };

        match synthesizer.synthesize(&clean_for_speech(reply), voice_id).await {
            Ok(handle) => (Some(handle), None),
            Err(err) if err.is_quota_exhausted() => {
                self.playback.disable_auto_play();
                let notice = if !self.quota_notified.swap(true, Ordering::SeqCst) {
                    Some(QUOTA_NOTICE.to_string())
                } else {
                    None
                };
                warn!(session = %self.id, "speech quota exhausted; auto-play disabled");
                (None, notice)
            }
            Err(err) => {
                warn!(session = %self.id, "speech synthesis failed: {err}");
                (None, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use buddy_core::{
        AudioHandle, BuddyError, EducationLevel, MessageRole, PersonalityRegistry, Result,
    };
    use crate::playback::{AudioOutput, NullAudioOutput};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    struct ScriptedAgent {
        replies: StdMutex<Vec<Result<String>>>,
        requests: StdMutex<Vec<GenerationRequest>>,
        hold: Option<Notify>,
    }

    impl ScriptedAgent {
        fn replying(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(replies),
                requests: StdMutex::new(Vec::new()),
                hold: None,
            })
        }

        fn blocked() -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(Vec::new()),
                requests: StdMutex::new(Vec::new()),
                hold: Some(Notify::new()),
            })
        }

        fn last_request(&self) -> Option<GenerationRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl GenerationAgent for ScriptedAgent {
        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            if let Some(hold) = &self.hold {
                hold.notified().await;
                return Ok("released".to_string());
            }
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok("ok".to_string())
            } else {
                replies.remove(0)
            }
        }
    }

    struct ScriptedSynthesizer {
        results: StdMutex<Vec<Result<AudioHandle>>>,
        texts: StdMutex<Vec<String>>,
    }

    impl ScriptedSynthesizer {
        fn replying(results: Vec<Result<AudioHandle>>) -> Arc<Self> {
            Arc::new(Self {
                results: StdMutex::new(results),
                texts: StdMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for ScriptedSynthesizer {
        async fn synthesize(&self, text: &str, _voice_id: &str) -> Result<AudioHandle> {
            self.texts.lock().unwrap().push(text.to_string());
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok(AudioHandle::new(vec![0]))
            } else {
                results.remove(0)
            }
        }
    }

    #[derive(Default)]
    struct CountingOutput {
        plays: AtomicUsize,
    }

    impl AudioOutput for CountingOutput {
        fn play(&self, _handle: &AudioHandle) -> Result<()> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) {}
    }

    fn profile() -> LearnerProfile {
        LearnerProfile {
            topic: "Algebra".to_string(),
            education: Some(EducationLevel::MiddleSchool),
            grade: String::new(),
        }
    }

    fn session(
        agent: Arc<dyn GenerationAgent>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        playback: Arc<PlaybackController>,
    ) -> ChatSession {
        let registry = PersonalityRegistry::with_defaults();
        ChatSession::new(
            registry.get("friendly_tutor").clone(),
            profile(),
            agent,
            synthesizer,
            playback,
        )
    }

    fn text_only_session(agent: Arc<dyn GenerationAgent>) -> ChatSession {
        session(
            agent,
            None,
            Arc::new(PlaybackController::new(Arc::new(NullAudioOutput))),
        )
    }

    #[tokio::test]
    async fn a_successful_turn_appends_a_user_assistant_pair() {
        let agent = ScriptedAgent::replying(vec![Ok("A variable is a letter.".to_string())]);
        let session = text_only_session(agent.clone());

        let outcome = session.submit("  What is a variable?  ").await;
        assert_eq!(
            outcome,
            TurnOutcome::Replied {
                audio: false,
                notice: None
            }
        );

        let history = session.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[0].content, "What is a variable?");
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].content, "A variable is a letter.");
    }

    #[tokio::test]
    async fn sequential_turns_form_strict_pairs() {
        let agent = ScriptedAgent::replying(vec![
            Ok("r1".to_string()),
            Err(BuddyError::generation("boom")),
            Ok("r3".to_string()),
        ]);
        let session = text_only_session(agent);

        assert!(matches!(
            session.submit("q1").await,
            TurnOutcome::Replied { .. }
        ));
        assert_eq!(session.submit("q2").await, TurnOutcome::Failed);
        assert!(matches!(
            session.submit("q3").await,
            TurnOutcome::Replied { .. }
        ));

        let history = session.history().await;
        assert_eq!(history.len(), 6);
        let roles: Vec<MessageRole> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Error,
                MessageRole::User,
                MessageRole::Assistant,
            ]
        );
        assert_eq!(history[3].content, GENERATION_FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn empty_input_is_silently_rejected() {
        let session = text_only_session(ScriptedAgent::replying(vec![]));

        assert_eq!(session.submit("").await, TurnOutcome::Ignored);
        assert_eq!(session.submit("   \n ").await, TurnOutcome::Ignored);
        assert!(session.history().await.is_empty());
    }

    #[tokio::test]
    async fn a_second_submit_while_one_is_pending_is_a_no_op() {
        let agent = ScriptedAgent::blocked();
        let session = Arc::new(text_only_session(agent.clone()));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit("hi").await }
        });

        // Wait for the first turn to reach the generation call.
        while agent.requests.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        assert_eq!(session.submit("hi").await, TurnOutcome::Ignored);
        {
            let history = session.history().await;
            assert_eq!(history.len(), 1, "second call must not append");
            assert_eq!(history[0].content, "hi");
        }

        agent.hold.as_ref().unwrap().notify_one();
        assert!(matches!(
            first.await.unwrap(),
            TurnOutcome::Replied { .. }
        ));
        assert_eq!(session.history().await.len(), 2);
    }

    #[tokio::test]
    async fn long_replies_are_truncated_and_spoken_from_the_stored_text() {
        let long_reply = "word ".repeat(300); // 1500 chars
        let agent = ScriptedAgent::replying(vec![Ok(long_reply)]);
        let synthesizer = ScriptedSynthesizer::replying(vec![]);
        let session = session(
            agent,
            Some(synthesizer.clone()),
            Arc::new(PlaybackController::new(Arc::new(NullAudioOutput))),
        );

        session.submit("explain").await;

        let history = session.history().await;
        let stored = &history[1].content;
        assert_eq!(stored.chars().count(), OUTPUT_CHAR_LIMIT + 3);
        assert!(stored.ends_with("..."));

        // Speech receives the cleaned version of the same stored text.
        let spoken = synthesizer.texts.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0], clean_for_speech(stored));
    }

    #[tokio::test]
    async fn markup_is_stripped_for_speech_but_kept_for_display() {
        let agent = ScriptedAgent::replying(vec![Ok("Use **bold** `code`".to_string())]);
        let synthesizer = ScriptedSynthesizer::replying(vec![]);
        let session = session(
            agent,
            Some(synthesizer.clone()),
            Arc::new(PlaybackController::new(Arc::new(NullAudioOutput))),
        );

        session.submit("style?").await;

        assert_eq!(session.history().await[1].content, "Use **bold** `code`");
        assert_eq!(synthesizer.texts.lock().unwrap()[0], "Use bold code");
    }

    #[tokio::test]
    async fn quota_exhaustion_disables_auto_play_and_notifies_once() {
        let agent = ScriptedAgent::replying(vec![Ok("r1".to_string()), Ok("r2".to_string())]);
        let synthesizer = ScriptedSynthesizer::replying(vec![
            Err(BuddyError::SpeechQuotaExhausted),
            Err(BuddyError::SpeechQuotaExhausted),
        ]);
        let playback = Arc::new(PlaybackController::new(Arc::new(NullAudioOutput)));
        let session = session(agent, Some(synthesizer), playback.clone());

        let first = session.submit("q1").await;
        assert_eq!(
            first,
            TurnOutcome::Replied {
                audio: false,
                notice: Some(QUOTA_NOTICE.to_string())
            }
        );
        assert!(!playback.auto_play());
        assert!(session.history().await[1].audio.is_none());

        // The notice is one-time.
        let second = session.submit("q2").await;
        assert_eq!(
            second,
            TurnOutcome::Replied {
                audio: false,
                notice: None
            }
        );
    }

    #[tokio::test]
    async fn other_speech_failures_are_silent() {
        let agent = ScriptedAgent::replying(vec![Ok("r".to_string())]);
        let synthesizer =
            ScriptedSynthesizer::replying(vec![Err(BuddyError::speech("transient"))]);
        let playback = Arc::new(PlaybackController::new(Arc::new(NullAudioOutput)));
        let session = session(agent, Some(synthesizer), playback.clone());

        let outcome = session.submit("q").await;
        assert_eq!(
            outcome,
            TurnOutcome::Replied {
                audio: false,
                notice: None
            }
        );
        assert!(playback.auto_play(), "transient failures keep auto-play on");
    }

    #[tokio::test]
    async fn auto_play_starts_playback_only_when_enabled() {
        let output = Arc::new(CountingOutput::default());
        let playback = Arc::new(PlaybackController::new(output.clone()));
        let agent = ScriptedAgent::replying(vec![Ok("r1".to_string()), Ok("r2".to_string())]);
        let synthesizer = ScriptedSynthesizer::replying(vec![]);
        let session = session(agent, Some(synthesizer), playback.clone());

        let outcome = session.submit("q1").await;
        assert_eq!(
            outcome,
            TurnOutcome::Replied {
                audio: true,
                notice: None
            }
        );
        assert_eq!(output.plays.load(Ordering::SeqCst), 1);

        playback.toggle_auto_play();
        session.submit("q2").await;
        assert_eq!(output.plays.load(Ordering::SeqCst), 1, "no auto-play when off");
        assert!(session.history().await[3].audio.is_some(), "audio still stored");
    }

    #[tokio::test]
    async fn pending_attachment_rides_one_turn_and_clears() {
        let agent = ScriptedAgent::replying(vec![Ok("r1".to_string()), Ok("r2".to_string())]);
        let session = text_only_session(agent.clone());

        session
            .attach(UploadedFile {
                name: "notes.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            })
            .await;
        assert_eq!(session.pending_attachment().await.as_deref(), Some("notes.pdf"));

        session.submit("summarize this").await;
        let request = agent.last_request().unwrap();
        let attachment = request.attachment.expect("attachment forwarded");
        assert_eq!(attachment.mime_type, "application/pdf");
        assert_eq!(attachment.data, vec![1, 2, 3]);
        assert!(session.pending_attachment().await.is_none());

        session.submit("and now?").await;
        assert!(agent.last_request().unwrap().attachment.is_none());
    }

    #[tokio::test]
    async fn reset_clears_history_and_attachment() {
        let agent = ScriptedAgent::replying(vec![Ok("r".to_string())]);
        let session = text_only_session(agent);

        session.submit("q").await;
        session
            .attach(UploadedFile {
                name: "a.txt".to_string(),
                mime_type: "text/plain".to_string(),
                bytes: vec![],
            })
            .await;

        session.reset().await;
        assert!(session.history().await.is_empty());
        assert!(session.pending_attachment().await.is_none());
    }

    #[tokio::test]
    async fn prompt_excludes_the_message_being_submitted_from_history() {
        let agent = ScriptedAgent::replying(vec![Ok("r1".to_string()), Ok("r2".to_string())]);
        let session = text_only_session(agent.clone());

        session.submit("first question").await;
        session.submit("second question").await;

        let prompt = agent.last_request().unwrap().prompt;
        let question_pos = prompt.find("STUDENT'S QUESTION:").unwrap();
        // The current message appears only under the question heading.
        assert_eq!(prompt.matches("second question").count(), 1);
        assert!(prompt.find("second question").unwrap() > question_pos);
        // The previous turn is rendered as history.
        assert!(prompt.contains("Student: first question"));
        assert!(prompt.contains("You: r1"));
    }
}
