//! Speech playback.
//!
//! The playback controller owns the auto-play preference and guarantees at
//! most one audio handle plays at a time: starting a new playback replaces
//! the previous one. The actual device sits behind the [`AudioOutput`]
//! trait; the production implementation drives rodio from a dedicated
//! thread, since the output stream cannot leave the thread it was created
//! on.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use buddy_core::{AudioHandle, BuddyError, ChatMessage, MessageRole, Result};
use crossbeam_channel::{bounded, unbounded, Sender};
use tracing::warn;

/// A device that can play one audio handle at a time.
///
/// `play` replaces whatever was playing before; `stop` halts playback and
/// resets the position.
pub trait AudioOutput: Send + Sync {
    fn play(&self, handle: &AudioHandle) -> Result<()>;
    fn stop(&self);
}

/// Coordinates playback and the auto-play preference.
pub struct PlaybackController {
    output: Arc<dyn AudioOutput>,
    auto_play: AtomicBool,
}

impl PlaybackController {
    /// Creates a controller with auto-play enabled.
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            auto_play: AtomicBool::new(true),
        }
    }

    /// Plays a specific handle, replacing any current playback.
    pub fn play(&self, handle: &AudioHandle) -> Result<()> {
        self.output.play(handle)
    }

    /// Plays the most recent assistant message that has audio.
    ///
    /// Returns `false` (and does nothing) when no such message exists.
    pub fn play_latest(&self, history: &[ChatMessage]) -> Result<bool> {
        let latest = history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && m.audio.is_some())
            .and_then(|m| m.audio.as_ref());

        match latest {
            Some(handle) => {
                self.output.play(handle)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Halts playback and resets the position.
    pub fn stop(&self) {
        self.output.stop();
    }

    /// Current auto-play preference.
    pub fn auto_play(&self) -> bool {
        self.auto_play.load(Ordering::SeqCst)
    }

    /// Flips the auto-play preference and returns the new value.
    ///
    /// Takes effect on the next completed turn; current playback is left
    /// alone.
    pub fn toggle_auto_play(&self) -> bool {
        !self.auto_play.fetch_xor(true, Ordering::SeqCst)
    }

    /// Forces auto-play off (used when the speech quota is exhausted).
    pub fn disable_auto_play(&self) {
        self.auto_play.store(false, Ordering::SeqCst);
    }
}

/// An output that discards everything. Used when no audio device exists.
pub struct NullAudioOutput;

impl AudioOutput for NullAudioOutput {
    fn play(&self, _handle: &AudioHandle) -> Result<()> {
        Ok(())
    }

    fn stop(&self) {}
}

enum PlayerCommand {
    Play(AudioHandle),
    Stop,
}

/// rodio-backed audio output.
///
/// A dedicated thread owns the output stream and the current sink; the
/// handle side only sends commands over a channel, so it is `Send + Sync`.
pub struct RodioOutput {
    tx: Sender<PlayerCommand>,
}

impl RodioOutput {
    /// Opens the default audio device.
    ///
    /// # Errors
    ///
    /// Returns an error if the playback thread cannot be spawned or the
    /// default output device cannot be opened.
    pub fn try_new() -> Result<Self> {
        let (tx, rx) = unbounded::<PlayerCommand>();
        let (ready_tx, ready_rx) = bounded::<std::result::Result<(), String>>(1);

        std::thread::Builder::new()
            .name("buddy-audio".to_string())
            .spawn(move || {
                let (_stream, stream_handle) = match rodio::OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = ready_tx.send(Ok(()));
                        pair
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };

                let mut sink: Option<rodio::Sink> = None;
                while let Ok(command) = rx.recv() {
                    match command {
                        PlayerCommand::Play(audio) => {
                            if let Some(previous) = sink.take() {
                                previous.stop();
                            }
                            let new_sink = match rodio::Sink::try_new(&stream_handle) {
                                Ok(s) => s,
                                Err(err) => {
                                    warn!("failed to open audio sink: {err}");
                                    continue;
                                }
                            };
                            match rodio::Decoder::new(Cursor::new(audio.bytes().to_vec())) {
                                Ok(source) => {
                                    new_sink.append(source);
                                    sink = Some(new_sink);
                                }
                                Err(err) => warn!("failed to decode audio: {err}"),
                            }
                        }
                        PlayerCommand::Stop => {
                            if let Some(current) = sink.take() {
                                current.stop();
                            }
                        }
                    }
                }
            })
            .map_err(|err| BuddyError::io(format!("Failed to spawn audio thread: {err}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { tx }),
            Ok(Err(message)) => Err(BuddyError::io(format!(
                "Failed to open audio output device: {message}"
            ))),
            Err(_) => Err(BuddyError::internal("Audio thread exited before ready")),
        }
    }
}

impl AudioOutput for RodioOutput {
    fn play(&self, handle: &AudioHandle) -> Result<()> {
        self.tx
            .send(PlayerCommand::Play(handle.clone()))
            .map_err(|_| BuddyError::internal("Audio thread is gone"))
    }

    fn stop(&self) {
        let _ = self.tx.send(PlayerCommand::Stop);
    }
}
