//! Session manager: runs the hotkey-to-paste pipeline.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use parle_audio::Recorder;
use parle_core::error::{ParleError, Result};
use parle_core::settings::{AppSettings, SettingsStore};
use parle_core::types::{DictationState, DictationUpdate, VocabularyEntry};
use parle_paste::Paster;
use parle_provider::{
    supports_prompt, ChatCompleter, HttpChatCompleter, HttpTranscriber, Transcriber,
};
use parle_vocab::{apply_replacements, build_prompt};

use crate::state::StateMachine;

/// Capacity of the update broadcast channel. Updates are small and lagging
/// subscribers only miss intermediate states.
const UPDATE_CHANNEL_CAPACITY: usize = 32;

/// Builds provider clients from the settings snapshot taken at session start,
/// so settings edits take effect on the next session without a restart.
pub trait ProviderFactory: Send + Sync {
    fn transcriber(&self, settings: &AppSettings) -> Result<Box<dyn Transcriber>>;
    fn completer(&self, settings: &AppSettings) -> Result<Box<dyn ChatCompleter>>;
}

/// Production factory for the OpenAI-compatible HTTP providers.
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn transcriber(&self, settings: &AppSettings) -> Result<Box<dyn Transcriber>> {
        Ok(Box::new(HttpTranscriber::new(
            &settings.base_url,
            &settings.api_key,
            &settings.model,
        )))
    }

    fn completer(&self, settings: &AppSettings) -> Result<Box<dyn ChatCompleter>> {
        Ok(Box::new(HttpChatCompleter::new(
            &settings.base_url,
            &settings.api_key,
        )?))
    }
}

/// Owns the session lifecycle and the subsystem ports.
///
/// `start` and `stop_and_transcribe` are the only session-mutating
/// operations; the state machine claim at the top of each makes overlapping
/// calls fail immediately instead of queueing. Every state transition is
/// published on the update channel in order.
pub struct DictationSessionManager {
    state: StateMachine,
    recorder: Arc<dyn Recorder>,
    paster: Arc<dyn Paster>,
    providers: Arc<dyn ProviderFactory>,
    settings: Arc<dyn SettingsStore>,
    updates: broadcast::Sender<DictationUpdate>,
}

impl DictationSessionManager {
    pub fn new(
        recorder: Arc<dyn Recorder>,
        paster: Arc<dyn Paster>,
        providers: Arc<dyn ProviderFactory>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            state: StateMachine::new(),
            recorder,
            paster,
            providers,
            settings,
            updates,
        }
    }

    /// Subscribe to the ordered stream of session updates.
    pub fn subscribe(&self) -> broadcast::Receiver<DictationUpdate> {
        self.updates.subscribe()
    }

    /// Current session state.
    pub fn state(&self) -> DictationState {
        self.state.current()
    }

    /// Begin capturing audio.
    ///
    /// Legal from `idle`, `done` and `error`; anything else means a session
    /// is in flight and the call fails with `AlreadyRecording`. A recorder
    /// start failure releases the session and reverts to idle.
    pub fn start(&self) -> Result<()> {
        if matches!(
            self.state.current(),
            DictationState::Done | DictationState::Error
        ) {
            self.state.reset();
        }
        self.state
            .transition(DictationState::Recording)
            .map_err(|_| ParleError::AlreadyRecording)?;

        if let Err(e) = self.recorder.start() {
            return Err(self.fail(e));
        }
        info!("Recording started");
        self.emit(DictationUpdate::new(DictationState::Recording));
        Ok(())
    }

    /// Stop capturing and run the rest of the pipeline: transcription,
    /// optional mode formatting, vocabulary correction, paste. Returns the
    /// final pasted text.
    ///
    /// Legal only from `recording` (`NotRecording` otherwise). A formatting
    /// failure is non-fatal and falls back to the raw transcript; every
    /// other failure emits an `error` update with the cause and reverts to
    /// idle.
    pub async fn stop_and_transcribe(&self) -> Result<String> {
        self.state
            .transition(DictationState::Transcribing)
            .map_err(|_| ParleError::NotRecording)?;
        self.emit(DictationUpdate::new(DictationState::Transcribing));

        let settings = self.settings.load();
        let audio = match self.recorder.stop() {
            Ok(audio) => audio,
            Err(e) => return Err(self.fail(e)),
        };
        debug!(bytes = audio.len(), "Recording captured");

        let hint = if supports_prompt(&settings.provider, &settings.model) {
            build_prompt(&settings.vocabulary)
        } else {
            debug!(
                provider = %settings.provider,
                model = %settings.model,
                "Model does not accept a prompt, skipping vocabulary hint"
            );
            None
        };

        let transcriber = match self.providers.transcriber(&settings) {
            Ok(t) => t,
            Err(e) => return Err(self.fail(e)),
        };
        let transcript = match transcriber.transcribe(audio, hint.as_deref()).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(e)),
        };
        info!(chars = transcript.len(), "Transcription complete");

        let text = match settings.active_mode() {
            Some(mode) => {
                if let Err(e) = self.advance(DictationState::Formatting) {
                    return Err(e);
                }
                self.emit(
                    DictationUpdate::new(DictationState::Formatting).message(mode.name.clone()),
                );
                self.format_with_mode(&settings, &mode.model, &mode.system_prompt, &transcript)
                    .await
            }
            None => transcript,
        };

        let corrected = apply_replacements(&text, &settings.vocabulary);

        if let Err(e) = self.advance(DictationState::Pasting) {
            return Err(e);
        }
        self.emit(DictationUpdate::new(DictationState::Pasting));

        let paster = self.paster.clone();
        let restore_clipboard = !settings.copy_to_clipboard_on_success;
        let to_paste = corrected.clone();
        let pasted =
            tokio::task::spawn_blocking(move || paster.paste(&to_paste, restore_clipboard)).await;
        match pasted {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.fail(e)),
            Err(e) => {
                return Err(self.fail(ParleError::Session(format!("Paste task failed: {e}"))))
            }
        }

        if let Err(e) = self.advance(DictationState::Done) {
            return Err(e);
        }
        info!(chars = corrected.len(), "Session complete");
        self.emit(DictationUpdate::new(DictationState::Done).text(corrected.clone()));

        // The session is over; return to ready without user action.
        let _ = self.state.transition(DictationState::Idle);
        self.emit(DictationUpdate::new(DictationState::Idle));
        Ok(corrected)
    }

    /// Persist an edited vocabulary list through the settings store.
    pub fn save_vocabulary(&self, vocabulary: Vec<VocabularyEntry>) -> Result<()> {
        let mut settings = self.settings.load();
        settings.vocabulary = vocabulary;
        self.settings.save(&settings)
    }

    /// Second-pass formatting. Never fatal: on any failure the raw
    /// transcript is kept.
    async fn format_with_mode(
        &self,
        settings: &AppSettings,
        model: &str,
        system_prompt: &str,
        transcript: &str,
    ) -> String {
        let completer = match self.providers.completer(settings) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Formatting unavailable, using raw transcript");
                return transcript.to_string();
            }
        };
        match completer.complete(model, system_prompt, transcript).await {
            Ok(formatted) => formatted,
            Err(e) => {
                warn!(error = %e, "Formatting failed, using raw transcript");
                transcript.to_string()
            }
        }
    }

    fn advance(&self, target: DictationState) -> Result<()> {
        if let Err(e) = self.state.transition(target) {
            return Err(self.fail(e));
        }
        Ok(())
    }

    /// Abort the session: emit the cause, revert to idle, hand the error back.
    fn fail(&self, err: ParleError) -> ParleError {
        warn!(error = %err, "Session failed");
        let _ = self.state.transition(DictationState::Error);
        self.emit(DictationUpdate::new(DictationState::Error).message(err.to_string()));
        self.state.reset();
        self.emit(DictationUpdate::new(DictationState::Idle));
        err
    }

    fn emit(&self, update: DictationUpdate) {
        debug!(state = %update.state, "Session update");
        // No subscribers is fine.
        let _ = self.updates.send(update);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use parle_core::types::Mode;

    #[derive(Default)]
    struct MockRecorder {
        fail_start: bool,
        started: Mutex<bool>,
    }

    impl Recorder for MockRecorder {
        fn start(&self) -> Result<()> {
            if self.fail_start {
                return Err(ParleError::Audio("No input device available".into()));
            }
            *self.started.lock().unwrap() = true;
            Ok(())
        }

        fn stop(&self) -> Result<Vec<u8>> {
            if !*self.started.lock().unwrap() {
                return Err(ParleError::Audio("No recording in progress".into()));
            }
            *self.started.lock().unwrap() = false;
            Ok(vec![0u8; 44])
        }
    }

    #[derive(Default)]
    struct MockPaster {
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl Paster for MockPaster {
        fn paste(&self, text: &str, restore_clipboard: bool) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), restore_clipboard));
            Ok(())
        }
    }

    struct MockTranscriber {
        reply: std::result::Result<String, String>,
        prompts: Arc<Mutex<Vec<Option<String>>>>,
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, _audio_wav: Vec<u8>, prompt: Option<&str>) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push(prompt.map(str::to_string));
            self.reply
                .clone()
                .map_err(ParleError::Provider)
        }
    }

    struct MockCompleter {
        reply: std::result::Result<String, String>,
        requests: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    #[async_trait]
    impl ChatCompleter for MockCompleter {
        async fn complete(
            &self,
            model: &str,
            system_prompt: &str,
            user_text: &str,
        ) -> Result<String> {
            self.requests.lock().unwrap().push((
                model.to_string(),
                system_prompt.to_string(),
                user_text.to_string(),
            ));
            self.reply.clone().map_err(ParleError::Provider)
        }
    }

    struct MockProviders {
        transcript: std::result::Result<String, String>,
        completion: std::result::Result<String, String>,
        prompts: Arc<Mutex<Vec<Option<String>>>>,
        completions: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    impl Default for MockProviders {
        fn default() -> Self {
            Self {
                transcript: Ok(String::new()),
                completion: Ok(String::new()),
                prompts: Arc::default(),
                completions: Arc::default(),
            }
        }
    }

    impl ProviderFactory for MockProviders {
        fn transcriber(&self, _settings: &AppSettings) -> Result<Box<dyn Transcriber>> {
            Ok(Box::new(MockTranscriber {
                reply: self.transcript.clone(),
                prompts: self.prompts.clone(),
            }))
        }

        fn completer(&self, _settings: &AppSettings) -> Result<Box<dyn ChatCompleter>> {
            Ok(Box::new(MockCompleter {
                reply: self.completion.clone(),
                requests: self.completions.clone(),
            }))
        }
    }

    struct MemorySettingsStore {
        settings: Mutex<AppSettings>,
    }

    impl MemorySettingsStore {
        fn new(settings: AppSettings) -> Self {
            Self {
                settings: Mutex::new(settings),
            }
        }
    }

    impl SettingsStore for MemorySettingsStore {
        fn load(&self) -> AppSettings {
            self.settings.lock().unwrap().clone()
        }

        fn save(&self, settings: &AppSettings) -> Result<()> {
            *self.settings.lock().unwrap() = settings.clone();
            Ok(())
        }
    }

    struct Harness {
        manager: DictationSessionManager,
        paster: Arc<MockPaster>,
        prompts: Arc<Mutex<Vec<Option<String>>>>,
        completions: Arc<Mutex<Vec<(String, String, String)>>>,
        store: Arc<MemorySettingsStore>,
    }

    fn harness(settings: AppSettings, providers: MockProviders) -> Harness {
        harness_with_recorder(settings, providers, MockRecorder::default())
    }

    fn harness_with_recorder(
        settings: AppSettings,
        providers: MockProviders,
        recorder: MockRecorder,
    ) -> Harness {
        let paster = Arc::new(MockPaster::default());
        let prompts = providers.prompts.clone();
        let completions = providers.completions.clone();
        let store = Arc::new(MemorySettingsStore::new(settings));
        let manager = DictationSessionManager::new(
            Arc::new(recorder),
            paster.clone(),
            Arc::new(providers),
            store.clone(),
        );
        Harness {
            manager,
            paster,
            prompts,
            completions,
            store,
        }
    }

    fn kubernetes_settings() -> AppSettings {
        let mut settings = AppSettings::default();
        settings.vocabulary = vec![VocabularyEntry::new(
            "Kubernetes",
            vec!["cube and eighties".into(), "kubernetties".into()],
        )];
        settings
    }

    fn drain(receiver: &mut broadcast::Receiver<DictationUpdate>) -> Vec<DictationState> {
        let mut states = Vec::new();
        while let Ok(update) = receiver.try_recv() {
            states.push(update.state);
        }
        states
    }

    #[tokio::test]
    async fn test_end_to_end_vocabulary_correction() {
        let h = harness(
            kubernetes_settings(),
            MockProviders {
                transcript: Ok("Deploy cube and eighties to the cluster".into()),
                ..Default::default()
            },
        );
        let mut updates = h.manager.subscribe();

        h.manager.start().unwrap();
        let text = h.manager.stop_and_transcribe().await.unwrap();

        assert_eq!(text, "Deploy Kubernetes to the cluster");
        assert_eq!(
            h.paster.calls.lock().unwrap().as_slice(),
            &[("Deploy Kubernetes to the cluster".to_string(), true)]
        );
        assert_eq!(h.manager.state(), DictationState::Idle);
        assert_eq!(
            drain(&mut updates),
            vec![
                DictationState::Recording,
                DictationState::Transcribing,
                DictationState::Pasting,
                DictationState::Done,
                DictationState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn test_vocabulary_hint_sent_when_model_accepts_prompts() {
        // Default settings are openai/whisper-1, which accepts prompts.
        let h = harness(
            kubernetes_settings(),
            MockProviders {
                transcript: Ok("ok".into()),
                ..Default::default()
            },
        );
        h.manager.start().unwrap();
        h.manager.stop_and_transcribe().await.unwrap();

        let prompts = h.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        let hint = prompts[0].as_deref().unwrap();
        assert!(hint.starts_with("Vocabulary: "));
        assert!(hint.contains("Kubernetes"));
    }

    #[tokio::test]
    async fn test_vocabulary_hint_skipped_for_non_prompt_model() {
        let mut settings = kubernetes_settings();
        settings.model = "gpt-4o-transcribe".into();
        let h = harness(
            settings,
            MockProviders {
                transcript: Ok("ok".into()),
                ..Default::default()
            },
        );
        h.manager.start().unwrap();
        h.manager.stop_and_transcribe().await.unwrap();

        assert_eq!(h.prompts.lock().unwrap().as_slice(), &[None]);
    }

    #[tokio::test]
    async fn test_active_mode_routes_through_chat_model() {
        let mut settings = AppSettings::default();
        settings.modes = vec![Mode {
            id: "email".into(),
            name: "Email".into(),
            system_prompt: "Rewrite as a polite email.".into(),
            model: "gpt-4o-mini".into(),
        }];
        settings.active_mode_id = Some("email".into());

        let h = harness(
            settings,
            MockProviders {
                transcript: Ok("send the report tomorrow".into()),
                completion: Ok("Hi, I will send the report tomorrow.".into()),
                ..Default::default()
            },
        );
        let mut updates = h.manager.subscribe();

        h.manager.start().unwrap();
        let text = h.manager.stop_and_transcribe().await.unwrap();

        assert_eq!(text, "Hi, I will send the report tomorrow.");
        let requests = h.completions.lock().unwrap();
        assert_eq!(
            requests.as_slice(),
            &[(
                "gpt-4o-mini".to_string(),
                "Rewrite as a polite email.".to_string(),
                "send the report tomorrow".to_string()
            )]
        );
        assert!(drain(&mut updates).contains(&DictationState::Formatting));
    }

    #[tokio::test]
    async fn test_formatting_failure_falls_back_to_raw_transcript() {
        let mut settings = kubernetes_settings();
        settings.modes = vec![Mode {
            id: "email".into(),
            name: "Email".into(),
            system_prompt: "Rewrite.".into(),
            model: "gpt-4o-mini".into(),
        }];
        settings.active_mode_id = Some("email".into());

        let h = harness(
            settings,
            MockProviders {
                transcript: Ok("ship kubernetties today".into()),
                completion: Err("chat model overloaded".into()),
                ..Default::default()
            },
        );
        h.manager.start().unwrap();
        let text = h.manager.stop_and_transcribe().await.unwrap();

        // Raw transcript survives, vocabulary correction still applies.
        assert_eq!(text, "ship Kubernetes today");
        assert_eq!(h.manager.state(), DictationState::Idle);
    }

    #[tokio::test]
    async fn test_copy_to_clipboard_on_success_skips_restore() {
        let mut settings = AppSettings::default();
        settings.copy_to_clipboard_on_success = true;
        let h = harness(
            settings,
            MockProviders {
                transcript: Ok("hello".into()),
                ..Default::default()
            },
        );
        h.manager.start().unwrap();
        h.manager.stop_and_transcribe().await.unwrap();

        assert_eq!(
            h.paster.calls.lock().unwrap().as_slice(),
            &[("hello".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_overlapping_start_is_rejected_immediately() {
        let h = harness(
            AppSettings::default(),
            MockProviders {
                transcript: Ok("ok".into()),
                ..Default::default()
            },
        );
        h.manager.start().unwrap();
        assert!(matches!(
            h.manager.start(),
            Err(ParleError::AlreadyRecording)
        ));
        // The in-flight session is untouched.
        assert_eq!(h.manager.state(), DictationState::Recording);
    }

    #[tokio::test]
    async fn test_stop_without_recording_is_rejected() {
        let h = harness(AppSettings::default(), MockProviders::default());
        assert!(matches!(
            h.manager.stop_and_transcribe().await,
            Err(ParleError::NotRecording)
        ));
        assert_eq!(h.manager.state(), DictationState::Idle);
    }

    #[tokio::test]
    async fn test_start_legal_again_after_completed_session() {
        let h = harness(
            AppSettings::default(),
            MockProviders {
                transcript: Ok("ok".into()),
                ..Default::default()
            },
        );
        h.manager.start().unwrap();
        h.manager.stop_and_transcribe().await.unwrap();
        h.manager.start().unwrap();
        assert_eq!(h.manager.state(), DictationState::Recording);
    }

    #[tokio::test]
    async fn test_transcription_failure_emits_error_and_reverts_to_idle() {
        let h = harness(
            AppSettings::default(),
            MockProviders {
                transcript: Err("401 Unauthorized".into()),
                ..Default::default()
            },
        );
        let mut updates = h.manager.subscribe();

        h.manager.start().unwrap();
        let err = h.manager.stop_and_transcribe().await.unwrap_err();

        assert!(matches!(err, ParleError::Provider(_)));
        assert!(h.paster.calls.lock().unwrap().is_empty());
        assert_eq!(h.manager.state(), DictationState::Idle);
        let states = drain(&mut updates);
        assert!(states.contains(&DictationState::Error));
        assert_eq!(states.last(), Some(&DictationState::Idle));
        // A new session can start right away.
        h.manager.start().unwrap();
    }

    #[tokio::test]
    async fn test_recorder_start_failure_releases_the_session() {
        let h = harness_with_recorder(
            AppSettings::default(),
            MockProviders::default(),
            MockRecorder {
                fail_start: true,
                ..Default::default()
            },
        );
        assert!(matches!(h.manager.start(), Err(ParleError::Audio(_))));
        assert_eq!(h.manager.state(), DictationState::Idle);
    }

    #[tokio::test]
    async fn test_save_vocabulary_persists_through_store() {
        let h = harness(AppSettings::default(), MockProviders::default());
        let entry = VocabularyEntry::new("Grafana", vec!["gra fauna".into()]);
        h.manager.save_vocabulary(vec![entry.clone()]).unwrap();
        assert_eq!(h.store.load().vocabulary, vec![entry]);
    }
}
