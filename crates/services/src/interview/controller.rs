use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use memoir_core::Clock;
use memoir_core::model::{
    AudioRef, InterviewSettings, NarrativeResult, PhotoContext, PromptPair, Question,
    QuestionPool, SessionId, StoryId, StoryMetadata, StoryRecord, TurnRecord, VoiceState,
};
use storage::repository::StoryRepository;

use super::plan::SequencePlanner;
use super::session::InterviewSession;
use crate::capabilities::{InterviewCapabilities, RecordingHandle};
use crate::error::InterviewError;
use crate::narrative::NarrativeSynthesizer;

const EVENT_CAPACITY: usize = 64;

//
// ─── PUBLIC TYPES ──────────────────────────────────────────────────────────────
//

/// Progress notifications broadcast to subscribers (UI, logs).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InterviewEvent {
    Started {
        session: SessionId,
        questions: usize,
    },
    /// A question is being presented. `number` is 1-based.
    Prompt {
        session: SessionId,
        number: usize,
        text: String,
    },
    Voice {
        session: SessionId,
        state: VoiceState,
    },
    CaptureFailed {
        session: SessionId,
        reason: String,
    },
    TurnRecorded {
        session: SessionId,
        number: usize,
        transcribed: bool,
    },
    Completed {
        session: SessionId,
    },
    Saved {
        session: SessionId,
        story: StoryId,
    },
    /// Finished with nothing recorded; no story was written.
    Discarded {
        session: SessionId,
    },
    Abandoned {
        session: SessionId,
    },
}

/// Result of asking the controller to stop listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was listening (already stopped, or a stale timer).
    Ignored,
    Recorded { turn: TurnRecord, complete: bool },
}

/// Result of `InterviewController::finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The transcript was empty; the session was discarded without a story.
    NoContent,
    Saved(StoryRecord),
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one interview at a time: question prompts, turn capture, transcript
/// accumulation and the final narrative.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct InterviewController {
    inner: Arc<Inner>,
}

struct Inner {
    clock: Clock,
    settings: InterviewSettings,
    pool: QuestionPool,
    capabilities: InterviewCapabilities,
    synthesizer: NarrativeSynthesizer,
    stories: Arc<dyn StoryRepository>,
    active: Mutex<Option<Active>>,
    events: broadcast::Sender<InterviewEvent>,
}

struct Active {
    session: InterviewSession,
    /// Bumped every time a turn starts listening.
    epoch: u64,
    starting: bool,
    finishing: bool,
    recording: Option<Recording>,
    timer: Option<JoinHandle<()>>,
    cancel: watch::Sender<bool>,
    narrative: Option<NarrativeResult>,
}

impl Active {
    fn new(session: InterviewSession, cancel: watch::Sender<bool>) -> Self {
        Self {
            session,
            epoch: 0,
            starting: false,
            finishing: false,
            recording: None,
            timer: None,
            cancel,
            narrative: None,
        }
    }

    fn busy(&self) -> bool {
        self.starting || self.finishing || self.session.voice() != VoiceState::Idle
    }
}

struct Recording {
    handle: RecordingHandle,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Manual,
    Timeout(u64),
}

impl InterviewController {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: InterviewSettings,
        pool: QuestionPool,
        capabilities: InterviewCapabilities,
        stories: Arc<dyn StoryRepository>,
    ) -> Self {
        let synthesizer = NarrativeSynthesizer::new(
            Arc::clone(&capabilities.generator),
            settings.fallback_photo_description(),
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                clock,
                settings,
                pool,
                capabilities,
                synthesizer,
                stories,
                active: Mutex::new(None),
                events,
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &InterviewSettings {
        &self.inner.settings
    }

    /// Current session state, if an interview is running.
    #[must_use]
    pub fn snapshot(&self) -> Option<InterviewSession> {
        self.inner.lock().as_ref().map(|a| a.session.clone())
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<InterviewEvent> {
        self.inner.events.subscribe()
    }

    /// Start an interview about `photo` and present the first question.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::SessionActive` if an interview is already
    /// running, or `InterviewError::EmptySequence` if no question was selected.
    #[instrument(skip_all, fields(photo = ?photo.as_ref().map(PhotoContext::id)))]
    pub async fn begin(
        &self,
        photo: Option<PhotoContext>,
    ) -> Result<InterviewSession, InterviewError> {
        let inner = &self.inner;
        let (snapshot, first, cancel) = {
            let mut guard = inner.lock();
            if guard.is_some() {
                return Err(InterviewError::SessionActive);
            }

            let category = photo.as_ref().and_then(PhotoContext::category);
            let mut rng = SequencePlanner::rng_for(inner.settings.selection_seed());
            let sequence =
                SequencePlanner::new(&inner.settings).build(&inner.pool, category, &mut rng)?;

            let session =
                InterviewSession::new(SessionId::random(), photo, sequence, inner.clock.now());
            let first = session.current_question().cloned();
            let (cancel, cancelled) = watch::channel(false);
            let snapshot = session.clone();
            *guard = Some(Active::new(session, cancel));
            (snapshot, first, cancelled)
        };

        info!(session = %snapshot.id(), questions = snapshot.total(), "interview started");
        inner.emit(InterviewEvent::Started {
            session: snapshot.id(),
            questions: snapshot.total(),
        });

        if let Some(question) = first {
            inner
                .present_prompt(snapshot.id(), 1, &question, &cancel)
                .await;
        }
        Ok(snapshot)
    }

    /// Begin capturing the answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `VoiceBusy` unless the voice is idle, `Completed` once every
    /// question has been answered, and `CaptureUnavailable` if the device
    /// cannot start (the voice stays idle).
    #[instrument(skip_all)]
    pub async fn start(&self) -> Result<(), InterviewError> {
        let inner = &self.inner;
        let session_id = {
            let mut guard = inner.lock();
            let active = guard.as_mut().ok_or(InterviewError::NoActiveSession)?;
            if active.session.is_complete() {
                return Err(InterviewError::Completed);
            }
            if active.busy() {
                return Err(InterviewError::VoiceBusy);
            }
            active.starting = true;
            active.session.id()
        };

        // Awaited to completion; a handle that arrives after teardown is
        // discarded below.
        let handle = match inner.capabilities.capture.start_recording().await {
            Err(err) => {
                warn!(session = %session_id, error = %err, "capture failed to start");
                inner.settle(session_id, |active| active.starting = false);
                inner.emit(InterviewEvent::CaptureFailed {
                    session: session_id,
                    reason: err.to_string(),
                });
                return Err(InterviewError::CaptureUnavailable(err));
            }
            Ok(handle) => handle,
        };

        let recording = Recording {
            handle,
            started_at: inner.clock.now(),
        };
        let armed = {
            let mut guard = inner.lock();
            match guard.as_mut() {
                Some(active) if active.session.id() == session_id => {
                    active.starting = false;
                    active.epoch += 1;
                    active.session.set_voice(VoiceState::Listening);
                    active.recording = Some(recording);
                    active.timer = Some(arm_timer(&self.inner, active.epoch));
                    Ok(active.epoch)
                }
                _ => Err(recording),
            }
        };

        match armed {
            Ok(epoch) => {
                debug!(session = %session_id, epoch, "listening");
                inner.emit(InterviewEvent::Voice {
                    session: session_id,
                    state: VoiceState::Listening,
                });
                Ok(())
            }
            Err(recording) => {
                debug!(session = %session_id, "interview ended while capture was starting");
                inner
                    .capabilities
                    .capture
                    .discard_recording(recording.handle)
                    .await;
                Err(InterviewError::Cancelled)
            }
        }
    }

    /// Stop listening and record the turn.
    ///
    /// Returns `StopOutcome::Ignored` when nothing is listening, for example
    /// after the turn timer already stopped it.
    ///
    /// # Errors
    ///
    /// Returns `CaptureUnavailable` if the device fails to stop (the turn is
    /// not recorded and the voice returns to idle), or `Cancelled` if the
    /// interview was abandoned meanwhile.
    #[instrument(skip_all)]
    pub async fn stop(&self) -> Result<StopOutcome, InterviewError> {
        self.inner.stop_turn(Trigger::Manual).await
    }

    /// Synthesize and save the story from the answers recorded so far.
    ///
    /// # Errors
    ///
    /// Returns `VoiceBusy` unless the voice is idle, `SynthesisFailed` when no
    /// narrative could be produced (the transcript is kept for a retry), and
    /// `Storage` if saving fails (the narrative is kept for a retry).
    #[instrument(skip_all)]
    pub async fn finish(&self) -> Result<FinishOutcome, InterviewError> {
        let inner = &self.inner;
        let pending = {
            let mut guard = inner.lock();
            let active = guard.as_mut().ok_or(InterviewError::NoActiveSession)?;
            if active.busy() {
                return Err(InterviewError::VoiceBusy);
            }

            let session_id = active.session.id();
            if active.session.transcript().is_empty() {
                *guard = None;
                info!(session = %session_id, "interview finished without answers");
                inner.emit(InterviewEvent::Discarded {
                    session: session_id,
                });
                return Ok(FinishOutcome::NoContent);
            }

            active.finishing = true;
            let transcript = active.session.transcript();
            PendingStory {
                session_id,
                photo: active.session.photo().cloned(),
                pairs: transcript.prompt_pairs(),
                duration: transcript.total_duration(),
                audio: transcript.turns().first().map(|t| t.audio().clone()),
                narrative: active.narrative.clone(),
                cancel: active.cancel.subscribe(),
            }
        };
        let session_id = pending.session_id;

        let narrative = match pending.narrative {
            Some(narrative) => narrative,
            None => {
                let synthesized = or_cancelled(
                    &pending.cancel,
                    inner
                        .synthesizer
                        .synthesize(pending.photo.as_ref(), &pending.pairs),
                )
                .await;
                match synthesized {
                    None => return Err(InterviewError::Cancelled),
                    Some(Err(err)) => {
                        warn!(session = %session_id, error = %err, "narrative synthesis failed");
                        inner.settle(session_id, |active| active.finishing = false);
                        return Err(err.into());
                    }
                    Some(Ok(narrative)) => narrative,
                }
            }
        };

        let people = pending
            .photo
            .as_ref()
            .map(|p| p.people().to_vec())
            .unwrap_or_default();
        let metadata = StoryMetadata {
            duration_secs: u32::try_from(pending.duration.num_seconds()).ok(),
            people,
            ..StoryMetadata::default()
        };
        let story = StoryRecord::new(
            StoryId::random(),
            narrative.clone(),
            pending.photo,
            pending.audio,
            metadata,
            inner.clock.now(),
        );

        if let Err(err) = inner.stories.save_story(&story).await {
            warn!(session = %session_id, error = %err, "failed to save story");
            inner.settle(session_id, |active| {
                active.finishing = false;
                active.narrative = Some(narrative);
            });
            return Err(err.into());
        }

        {
            let mut guard = inner.lock();
            if guard.as_ref().is_some_and(|a| a.session.id() == session_id) {
                *guard = None;
            }
        }
        info!(session = %session_id, story = %story.id(), "story saved");
        inner.emit(InterviewEvent::Saved {
            session: session_id,
            story: story.id(),
        });
        Ok(FinishOutcome::Saved(story))
    }

    /// Tear down the current interview, cancelling transcription, synthesis
    /// and playback in flight. Capture calls already in flight run to
    /// completion and release their handle. Nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` if no interview is running.
    #[instrument(skip_all)]
    pub async fn abandon(&self) -> Result<(), InterviewError> {
        let inner = &self.inner;
        let mut active = inner
            .lock()
            .take()
            .ok_or(InterviewError::NoActiveSession)?;

        if let Some(timer) = active.timer.take() {
            timer.abort();
        }
        let _ = active.cancel.send(true);
        active.session.mark_abandoned();

        if let Some(recording) = active.recording.take() {
            inner
                .capabilities
                .capture
                .discard_recording(recording.handle)
                .await;
        }
        inner.capabilities.playback.stop().await;

        let session_id = active.session.id();
        info!(session = %session_id, answered = active.session.position(), "interview abandoned");
        inner.emit(InterviewEvent::Abandoned {
            session: session_id,
        });
        Ok(())
    }
}

struct PendingStory {
    session_id: SessionId,
    photo: Option<PhotoContext>,
    pairs: Vec<PromptPair>,
    duration: chrono::Duration,
    audio: Option<AudioRef>,
    narrative: Option<NarrativeResult>,
    cancel: watch::Receiver<bool>,
}

//
// ─── TURN HANDLING ─────────────────────────────────────────────────────────────
//

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: InterviewEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Apply `f` to the active session if it is still `session_id`.
    fn settle(&self, session_id: SessionId, f: impl FnOnce(&mut Active)) {
        if let Some(active) = self
            .lock()
            .as_mut()
            .filter(|a| a.session.id() == session_id)
        {
            f(active);
        }
    }

    async fn present_prompt(
        &self,
        session_id: SessionId,
        number: usize,
        question: &Question,
        cancel: &watch::Receiver<bool>,
    ) {
        self.emit(InterviewEvent::Prompt {
            session: session_id,
            number,
            text: question.text().to_string(),
        });
        if !self.settings.auto_play() {
            return;
        }

        let speak = self
            .capabilities
            .playback
            .speak(question.text(), self.settings.voice_speed());
        if let Some(Err(err)) = or_cancelled(cancel, speak).await {
            warn!(session = %session_id, number, error = %err, "prompt playback failed");
        }
    }

    async fn stop_turn(&self, trigger: Trigger) -> Result<StopOutcome, InterviewError> {
        let (session_id, number, question, recording, cancel) = {
            let mut guard = self.lock();
            let Some(active) = guard.as_mut() else {
                return match trigger {
                    Trigger::Manual => Err(InterviewError::NoActiveSession),
                    Trigger::Timeout(_) => Ok(StopOutcome::Ignored),
                };
            };
            if active.session.voice() != VoiceState::Listening {
                return Ok(StopOutcome::Ignored);
            }
            if let Trigger::Timeout(epoch) = trigger {
                if epoch != active.epoch {
                    return Ok(StopOutcome::Ignored);
                }
            }
            let Some(question) = active.session.current_question().cloned() else {
                return Ok(StopOutcome::Ignored);
            };
            let Some(recording) = active.recording.take() else {
                return Ok(StopOutcome::Ignored);
            };

            match (trigger, active.timer.take()) {
                (Trigger::Manual, Some(timer)) => timer.abort(),
                // The timer task is the caller; dropping the handle detaches it.
                (Trigger::Timeout(_), _) | (Trigger::Manual, None) => {}
            }
            active.session.set_voice(VoiceState::Processing);

            (
                active.session.id(),
                active.session.position() + 1,
                question,
                recording,
                active.cancel.subscribe(),
            )
        };

        debug!(session = %session_id, number, ?trigger, "turn stopped");
        self.emit(InterviewEvent::Voice {
            session: session_id,
            state: VoiceState::Processing,
        });

        // The handle is released even if the interview is torn down meanwhile.
        let stopped = self
            .capabilities
            .capture
            .stop_recording(recording.handle)
            .await;
        if *cancel.borrow() {
            debug!(session = %session_id, number, "interview ended while capture was stopping");
            return Err(InterviewError::Cancelled);
        }
        let audio = match stopped {
            Err(err) => {
                warn!(session = %session_id, number, error = %err, "capture failed to stop");
                self.settle(session_id, |active| {
                    active.session.set_voice(VoiceState::Idle);
                });
                self.emit(InterviewEvent::CaptureFailed {
                    session: session_id,
                    reason: err.to_string(),
                });
                self.emit(InterviewEvent::Voice {
                    session: session_id,
                    state: VoiceState::Idle,
                });
                return Err(InterviewError::CaptureUnavailable(err));
            }
            Ok(audio) => audio,
        };

        let transcribed = or_cancelled(&cancel, self.capabilities.transcriber.transcribe(&audio)).await;
        let answer = match transcribed {
            None => return Err(InterviewError::Cancelled),
            Some(Ok(text)) if !text.trim().is_empty() => Some(text),
            Some(Ok(_)) => {
                warn!(session = %session_id, number, "transcription was empty, using fallback answer");
                None
            }
            Some(Err(err)) => {
                warn!(session = %session_id, number, error = %err, "transcription failed, using fallback answer");
                None
            }
        };

        let completed_at = self.clock.now();
        let turn = match answer {
            Some(text) => TurnRecord::transcribed(
                question.id().clone(),
                question.text(),
                text,
                audio,
                recording.started_at,
                completed_at,
            ),
            None => TurnRecord::untranscribed(
                number,
                question.id().clone(),
                question.text(),
                audio,
                recording.started_at,
                completed_at,
            ),
        };

        self.record_turn(session_id, number, turn, &cancel).await
    }

    /// Append the turn, then either present the next question or complete.
    async fn record_turn(
        &self,
        session_id: SessionId,
        number: usize,
        turn: TurnRecord,
        cancel: &watch::Receiver<bool>,
    ) -> Result<StopOutcome, InterviewError> {
        let now = turn.completed_at();
        let (complete, next) = {
            let mut guard = self.lock();
            let active = match guard.as_mut() {
                Some(active) if active.session.id() == session_id => active,
                _ => return Err(InterviewError::Cancelled),
            };
            if let Err(err) = active.session.record(turn.clone(), now) {
                active.session.set_voice(VoiceState::Idle);
                return Err(err.into());
            }
            (
                active.session.is_complete(),
                active.session.current_question().cloned(),
            )
        };

        info!(
            session = %session_id,
            number,
            transcribed = turn.is_transcribed(),
            "turn recorded"
        );
        self.emit(InterviewEvent::TurnRecorded {
            session: session_id,
            number,
            transcribed: turn.is_transcribed(),
        });

        if complete {
            info!(session = %session_id, "all questions answered");
            self.emit(InterviewEvent::Completed {
                session: session_id,
            });
        } else if let Some(question) = next {
            self.present_prompt(session_id, number + 1, &question, cancel)
                .await;
            self.settle(session_id, |active| {
                active.session.set_voice(VoiceState::Idle);
            });
        }

        self.emit(InterviewEvent::Voice {
            session: session_id,
            state: VoiceState::Idle,
        });
        Ok(StopOutcome::Recorded { turn, complete })
    }
}

/// Spawn the turn timeout. Holds only a weak reference so a dropped controller
/// lets the task end quietly.
fn arm_timer(inner: &Arc<Inner>, epoch: u64) -> JoinHandle<()> {
    let weak = Arc::downgrade(inner);
    let timeout = inner.settings.turn_timeout();
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        match inner.stop_turn(Trigger::Timeout(epoch)).await {
            Ok(StopOutcome::Recorded { .. }) => info!(epoch, "turn stopped by timeout"),
            Ok(StopOutcome::Ignored) => debug!(epoch, "turn timer fired after stop"),
            Err(err) => warn!(epoch, error = %err, "timed-out turn was not recorded"),
        }
    })
}

/// Resolve when the session's cancel flag is raised or its sender is gone.
async fn cancelled(mut flag: watch::Receiver<bool>) {
    loop {
        if *flag.borrow_and_update() {
            return;
        }
        if flag.changed().await.is_err() {
            return;
        }
    }
}

/// Run `work` unless the session is cancelled first.
async fn or_cancelled<F: Future>(flag: &watch::Receiver<bool>, work: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = cancelled(flag.clone()) => None,
        out = work => Some(out),
    }
}
