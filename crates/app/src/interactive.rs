use std::error::Error;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use memoir_core::model::PhotoContext;
use services::{
    AppServices, FinishOutcome, InterviewCapabilities, InterviewController, InterviewError,
    OpenAiClient, StopOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use crate::console::{ConsolePlayback, TextFileTranscriber, TypedCapture};

type Input = Lines<BufReader<Stdin>>;

/// Shown when the turn timer stopped listening before Enter was pressed.
const TIMED_OUT_NOTICE: &str =
    "Time ran out for that answer; it was saved as a placeholder and the interview moved on.";

/// Run one interview in the terminal and save the resulting story.
pub async fn run_interview(
    services: &AppServices,
    photo: Option<PhotoContext>,
    recordings: PathBuf,
) -> Result<(), Box<dyn Error>> {
    let capture = Arc::new(TypedCapture::new(recordings));
    let openai = Arc::new(OpenAiClient::from_env());
    if !openai.enabled() {
        warn!("MEMOIR_AI_API_KEY is not set; the story cannot be written at the end");
    }

    let controller = services
        .interview(InterviewCapabilities {
            playback: Arc::new(ConsolePlayback),
            capture: capture.clone(),
            transcriber: Arc::new(TextFileTranscriber),
            generator: openai,
        })
        .await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let session = controller.begin(photo).await?;
    println!("Interview started: {} questions.", session.total());
    println!("Press Enter to answer, type 'finish' to write the story now, or 'quit' to stop.");

    while let Some(snapshot) = controller.snapshot() {
        let Some(question) = snapshot.current_question() else {
            break;
        };
        if !controller.settings().auto_play() {
            println!("  » {}", question.text());
        }
        prompt(&format!("[{}/{}] ", snapshot.position() + 1, snapshot.total()))?;
        match input.next_line().await?.as_deref().map(str::trim) {
            None | Some("finish") => break,
            Some("quit") => {
                controller.abandon().await?;
                println!("Interview discarded.");
                return Ok(());
            }
            Some(_) => {}
        }

        if let Err(err) = controller.start().await {
            println!("  Could not start recording: {err}");
            continue;
        }
        println!(
            "  (listening for up to {}s) type your answer and press Enter:",
            controller.settings().turn_timeout_secs()
        );
        let answer = input.next_line().await?.unwrap_or_default();
        capture.submit(answer);

        match controller.stop().await {
            Ok(StopOutcome::Recorded { turn, .. }) => println!("  recorded: {}", turn.answer()),
            Ok(StopOutcome::Ignored) => {
                println!("  {TIMED_OUT_NOTICE}");
            }
            Err(err) => println!("  {err}; please answer that question again."),
        }
    }

    finish(&controller, &mut input).await
}

async fn finish(controller: &InterviewController, input: &mut Input) -> Result<(), Box<dyn Error>> {
    loop {
        match controller.finish().await {
            Ok(FinishOutcome::Saved(story)) => {
                println!();
                println!("{}", story.title());
                println!();
                println!("{}", story.narrative());
                println!();
                println!("Saved as {}", story.id());
                return Ok(());
            }
            Ok(FinishOutcome::NoContent) => {
                println!("Nothing was recorded, so no story was saved.");
                return Ok(());
            }
            Err(
                err @ (InterviewError::SynthesisFailed(_)
                | InterviewError::Storage(_)
                | InterviewError::VoiceBusy),
            ) => {
                println!("Could not save the story: {err}");
                prompt("Press Enter to retry, or type 'quit' to discard the interview: ")?;
                if matches!(
                    input.next_line().await?.as_deref().map(str::trim),
                    None | Some("quit")
                ) {
                    controller.abandon().await?;
                    println!("Interview discarded.");
                    return Ok(());
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn prompt(text: &str) -> std::io::Result<()> {
    print!("{text}");
    std::io::stdout().flush()
}
