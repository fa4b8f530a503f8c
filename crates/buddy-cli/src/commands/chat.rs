//! `studybuddy chat` - the interactive chat loop.

use std::sync::Arc;

use anyhow::Result;
use buddy_core::{MessageRole, PersonalityRegistry, ProfileStore};
use buddy_infrastructure::{TomlProfileStore, UploadedFile};
use buddy_interaction::{
    ChatSession, ElevenLabsSynthesizer, GeminiAgent, ListenOutcome, NullAudioOutput,
    NullRecognizer, PlaybackController, RodioOutput, SecretConfig, SpeechSynthesizer,
    TurnOutcome, VoiceInputBridge,
};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

const HELP: &str = "\
Commands:
  /voice          toggle voice input
  /audio          toggle reply auto-play
  /replay         replay the latest spoken reply
  /stop           stop audio playback
  /attach <path>  attach a file to the next question
  /reset          clear the conversation
  /help           show this help
  /quit           leave the chat";

pub async fn run(personality_key: Option<&str>) -> Result<()> {
    let store = TomlProfileStore::new()?;
    let profile = store.load()?;

    if !profile.is_complete() {
        println!(
            "{} Your profile is incomplete. Run {} first.",
            "!".yellow(),
            "studybuddy setup".bold()
        );
        return Ok(());
    }

    let registry = PersonalityRegistry::with_defaults();
    let personality = registry.get(personality_key.unwrap_or_default()).clone();

    let config = SecretConfig::load()?;
    if !config.has_generation_credential() {
        warn!("no Gemini API key configured; chat requests will fail until one is set");
        println!(
            "{} No Gemini API key found (secret.json or GEMINI_API_KEY).",
            "!".yellow()
        );
    }

    let agent = Arc::new(GeminiAgent::from_config(&config));
    let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = config
        .elevenlabs
        .as_ref()
        .map(|cfg| Arc::new(ElevenLabsSynthesizer::new(cfg.api_key.clone())) as Arc<dyn SpeechSynthesizer>);

    let playback = Arc::new(PlaybackController::new(match RodioOutput::try_new() {
        Ok(output) => Arc::new(output) as Arc<dyn buddy_interaction::AudioOutput>,
        Err(err) => {
            warn!("audio output unavailable: {err}");
            Arc::new(NullAudioOutput)
        }
    }));

    let session = ChatSession::new(
        personality,
        profile.clone(),
        agent,
        synthesizer,
        playback.clone(),
    );
    let voice = VoiceInputBridge::new(Arc::new(NullRecognizer));

    println!(
        "Chatting with {} about {}. Type {} for commands.",
        session.personality().name.cyan().bold(),
        profile.topic.bold(),
        "/help".bold()
    );

    let mut editor = DefaultEditor::new()?;
    let mut prefill: Option<String> = None;

    loop {
        let line = match &prefill.take() {
            Some(text) => editor.readline_with_initial("you> ", (text, "")),
            None => editor.readline("you> "),
        };

        let line = match line {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if handle_command(command, &session, &playback, &voice, &mut prefill).await? {
                break;
            }
            continue;
        }

        let _ = editor.add_history_entry(&input);
        println!("{}", "Thinking...".dimmed());
        let outcome = session.submit(&input).await;
        render_outcome(&session, outcome).await;
    }

    Ok(())
}

/// Executes one slash command. Returns `true` when the loop should end.
async fn handle_command(
    command: &str,
    session: &ChatSession,
    playback: &PlaybackController,
    voice: &VoiceInputBridge,
    prefill: &mut Option<String>,
) -> Result<bool> {
    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" => return Ok(true),
        "help" => println!("{HELP}"),
        "audio" => {
            let enabled = playback.toggle_auto_play();
            println!(
                "Auto-play is now {}.",
                if enabled { "on".green() } else { "off".red() }
            );
        }
        "replay" => {
            let history = session.history().await;
            match playback.play_latest(&history) {
                Ok(true) => println!("{}", "Replaying...".dimmed()),
                Ok(false) => println!("Nothing to replay yet."),
                Err(err) => println!("{} {err}", "!".yellow()),
            }
        }
        "stop" => playback.stop(),
        "voice" => match voice.toggle_listening().await {
            Ok(ListenOutcome::Transcript(text)) => {
                // The transcript replaces the input buffer.
                *prefill = Some(text);
            }
            Ok(ListenOutcome::Stopped) => println!("Stopped listening."),
            Err(err) if err.is_capability_unavailable() => {
                println!(
                    "{} Speech recognition is not available in this environment.",
                    "!".yellow()
                );
            }
            Err(err) => println!("{} Voice input failed: {err}", "!".yellow()),
        },
        "attach" => {
            if arg.is_empty() {
                println!("Usage: /attach <path>");
            } else {
                match UploadedFile::from_path(arg) {
                    Ok(file) => {
                        println!("Attached {} ({}).", file.name.bold(), file.mime_type);
                        session.attach(file).await;
                    }
                    Err(err) => println!("{} {err}", "!".yellow()),
                }
            }
        }
        "reset" => {
            session.reset().await;
            println!("Conversation cleared.");
        }
        other => println!("Unknown command '/{other}'. Type /help for the list."),
    }

    Ok(false)
}

/// Prints the reply (or error) a finished turn appended to history.
async fn render_outcome(session: &ChatSession, outcome: TurnOutcome) {
    match outcome {
        TurnOutcome::Ignored => {}
        TurnOutcome::Replied { audio, notice } => {
            let history = session.history().await;
            if let Some(message) = history.last() {
                let speaker = session.personality().name.cyan().bold();
                let marker = if audio { " 🔊" } else { "" };
                println!("{speaker}{marker}: {}", message.content);
            }
            if let Some(notice) = notice {
                println!("{} {notice}", "!".yellow());
            }
        }
        TurnOutcome::Failed => {
            let history = session.history().await;
            if let Some(message) = history.iter().rev().find(|m| m.role == MessageRole::Error) {
                println!("{} {}", "error:".red().bold(), message.content);
            }
        }
    }
}
