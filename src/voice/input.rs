use crate::voice::VoiceError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Quiet period after the last partial result that ends an utterance.
pub const SILENCE_THRESHOLD: Duration = Duration::from_millis(500);

/// Events emitted by a recognition session.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Interim transcript of the utterance so far.
    Partial(String),
    /// The engine ended the session on its own.
    End,
    /// The engine reported an error.
    Error(String),
}

/// Platform speech-recognition engine.
#[cfg_attr(test, mockall::automock)]
pub trait Recognizer {
    /// Starts a single-utterance session with interim results.
    fn start(&mut self) -> Result<(), VoiceError>;

    fn stop(&mut self);
}

/// Speech-to-text with silence detection.
pub struct VoiceInput<R> {
    recognizer: R,
    silence: Duration,
    listening: bool,
}

impl<R: Recognizer> VoiceInput<R> {
    pub fn new(recognizer: R) -> Self {
        Self::with_silence(recognizer, SILENCE_THRESHOLD)
    }

    pub fn with_silence(recognizer: R, silence: Duration) -> Self {
        Self { recognizer, silence, listening: false }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Stops an active session at the user's request.
    pub fn stop(&mut self) {
        if self.listening {
            self.recognizer.stop();
            self.listening = false;
        }
    }

    /// Runs one recognition session.
    ///
    /// Every partial result replaces the transcript and re-arms the silence
    /// timer. When the timer fires the recognizer is stopped and the last
    /// non-empty transcript is returned. An end or error event before that
    /// ends the session without an utterance.
    pub async fn listen(
        &mut self,
        events: &mut mpsc::Receiver<RecognitionEvent>,
    ) -> Result<Option<String>, VoiceError> {
        self.recognizer.start()?;
        self.listening = true;

        let mut transcript = String::new();
        let mut deadline: Option<Instant> = None;

        loop {
            let armed = deadline;
            let silence = async move {
                match armed {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                event = events.recv() => match event {
                    Some(RecognitionEvent::Partial(text)) => {
                        transcript = text;
                        deadline = Some(Instant::now() + self.silence);
                    }
                    Some(RecognitionEvent::End) | None => {
                        self.listening = false;
                        return Ok(None);
                    }
                    Some(RecognitionEvent::Error(message)) => {
                        log::error!("Speech recognition failed: {}", message);
                        self.listening = false;
                        return Err(VoiceError::Recognition(message));
                    }
                },
                _ = silence => {
                    self.recognizer.stop();
                    self.listening = false;
                    let utterance = transcript.trim();
                    log::debug!("Silence detected, utterance: {:?}", utterance);
                    return Ok((!utterance.is_empty()).then(|| utterance.to_string()));
                }
            }
        }
    }
}
