mod common;

use std::time::Duration;

use common::harness;
use memoir_core::model::{SessionStatus, VoiceState};
use services::{InterviewError, InterviewEvent, StopOutcome};
use tokio::sync::broadcast;
use tokio::time::sleep;

fn processing_transitions(events: &mut broadcast::Receiver<InterviewEvent>) -> usize {
    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(
            event,
            InterviewEvent::Voice {
                state: VoiceState::Processing,
                ..
            }
        ) {
            count += 1;
        }
    }
    count
}

#[tokio::test(start_paused = true)]
async fn timeout_stops_listening_once() {
    let h = harness(2);
    h.controller.begin(None).await.unwrap();
    h.controller.start().await.unwrap();

    sleep(Duration::from_secs(29)).await;
    assert_eq!(
        h.controller.snapshot().unwrap().voice(),
        VoiceState::Listening
    );

    sleep(Duration::from_secs(2)).await;
    let snapshot = h.controller.snapshot().unwrap();
    assert_eq!(snapshot.position(), 1);
    assert_eq!(snapshot.voice(), VoiceState::Idle);
    assert_eq!(h.capture.stopped(), 1);

    assert_eq!(h.controller.stop().await.unwrap(), StopOutcome::Ignored);
    assert_eq!(h.controller.snapshot().unwrap().position(), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_stop_cancels_pending_timeout() {
    let h = harness(2);
    h.controller.begin(None).await.unwrap();
    h.controller.start().await.unwrap();
    assert!(matches!(
        h.controller.stop().await.unwrap(),
        StopOutcome::Recorded { .. }
    ));

    sleep(Duration::from_secs(31)).await;
    let snapshot = h.controller.snapshot().unwrap();
    assert_eq!(snapshot.position(), 1);
    assert_eq!(snapshot.voice(), VoiceState::Idle);
    assert_eq!(h.capture.stopped(), 1);
    assert_eq!(h.transcriber.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn earlier_turn_timer_never_stops_a_later_turn() {
    let h = harness(3);
    h.controller.begin(None).await.unwrap();

    h.controller.start().await.unwrap();
    sleep(Duration::from_secs(10)).await;
    h.controller.stop().await.unwrap();

    // Second turn starts at t=10; the first turn's deadline would be t=30.
    h.controller.start().await.unwrap();
    sleep(Duration::from_secs(25)).await;
    let snapshot = h.controller.snapshot().unwrap();
    assert_eq!(snapshot.voice(), VoiceState::Listening);
    assert_eq!(snapshot.position(), 1);

    sleep(Duration::from_secs(6)).await;
    let snapshot = h.controller.snapshot().unwrap();
    assert_eq!(snapshot.voice(), VoiceState::Idle);
    assert_eq!(snapshot.position(), 2);
}

#[tokio::test(start_paused = true)]
async fn timeout_on_last_question_completes_session() {
    let h = harness(1);
    h.controller.begin(None).await.unwrap();
    h.controller.start().await.unwrap();

    sleep(Duration::from_secs(31)).await;
    let snapshot = h.controller.snapshot().unwrap();
    assert_eq!(snapshot.status(), SessionStatus::Complete);
    assert_eq!(snapshot.transcript().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn abandon_aborts_turn_timer() {
    let h = harness(2);
    h.controller.begin(None).await.unwrap();
    h.controller.start().await.unwrap();
    h.controller.abandon().await.unwrap();

    sleep(Duration::from_secs(31)).await;
    assert!(h.controller.snapshot().is_none());
    assert_eq!(h.capture.stopped(), 0);
    assert_eq!(h.capture.discarded(), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_stop_at_the_deadline_processes_the_turn_once() {
    let h = harness(2);
    h.controller.begin(None).await.unwrap();
    let mut events = h.controller.subscribe();
    h.controller.start().await.unwrap();

    // Timer task and manual stop both become ready at t=30.
    sleep(Duration::from_secs(30)).await;
    let outcome = h.controller.stop().await.unwrap();
    sleep(Duration::from_secs(1)).await;

    let snapshot = h.controller.snapshot().unwrap();
    assert_eq!(snapshot.position(), 1);
    assert_eq!(snapshot.voice(), VoiceState::Idle);
    assert_eq!(h.capture.stopped(), 1);
    assert_eq!(h.transcriber.calls(), 1);
    assert_eq!(processing_transitions(&mut events), 1);

    if outcome != StopOutcome::Ignored {
        assert!(matches!(outcome, StopOutcome::Recorded { complete: false, .. }));
    }
}

#[tokio::test(start_paused = true)]
async fn simultaneous_manual_stops_record_one_turn() {
    let h = harness(2);
    h.controller.begin(None).await.unwrap();
    let mut events = h.controller.subscribe();
    h.controller.start().await.unwrap();

    let (a, b) = tokio::join!(h.controller.stop(), h.controller.stop());
    let recorded = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(|o| matches!(o, StopOutcome::Recorded { .. }))
        .count();

    assert_eq!(recorded, 1);
    assert_eq!(h.capture.stopped(), 1);
    assert_eq!(h.transcriber.calls(), 1);
    assert_eq!(h.controller.snapshot().unwrap().position(), 1);
    assert_eq!(processing_transitions(&mut events), 1);
}

#[tokio::test(start_paused = true)]
async fn abandon_during_slow_stop_still_releases_capture() {
    let h = harness(2);
    h.capture.slow_stop(Duration::from_secs(5));
    h.controller.begin(None).await.unwrap();
    h.controller.start().await.unwrap();

    let controller = h.controller.clone();
    let stopping = tokio::spawn(async move { controller.stop().await });
    sleep(Duration::from_secs(1)).await;
    h.controller.abandon().await.unwrap();

    let result = stopping.await.unwrap();
    assert!(matches!(result, Err(InterviewError::Cancelled)));
    assert_eq!(h.capture.stopped(), 1);
    assert_eq!(h.transcriber.calls(), 0);
    assert!(h.controller.snapshot().is_none());
}

#[tokio::test(start_paused = true)]
async fn abandon_during_slow_start_discards_late_handle() {
    let h = harness(2);
    h.capture.slow_start(Duration::from_secs(5));
    h.controller.begin(None).await.unwrap();

    let controller = h.controller.clone();
    let starting = tokio::spawn(async move { controller.start().await });
    sleep(Duration::from_secs(1)).await;
    h.controller.abandon().await.unwrap();
    assert_eq!(h.capture.discarded(), 0);

    let result = starting.await.unwrap();
    assert!(matches!(result, Err(InterviewError::Cancelled)));
    assert_eq!(h.capture.started(), 1);
    assert_eq!(h.capture.discarded(), 1);
    assert_eq!(h.capture.stopped(), 0);

    // No stray timer from the late handle.
    sleep(Duration::from_secs(60)).await;
    assert_eq!(h.capture.stopped(), 0);
    assert!(h.controller.snapshot().is_none());
}
