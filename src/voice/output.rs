use crate::voice::VoiceError;

/// Platform speech-synthesis engine.
#[cfg_attr(test, mockall::automock)]
pub trait Synthesizer {
    fn speak(&mut self, text: &str) -> Result<(), VoiceError>;

    /// Cancels the utterance currently being spoken.
    fn cancel(&mut self);
}

/// Speech output that never overlaps two utterances.
pub struct VoiceOutput {
    synthesizer: Box<dyn Synthesizer + Send>,
    speaking: bool,
}

impl VoiceOutput {
    pub fn new(synthesizer: Box<dyn Synthesizer + Send>) -> Self {
        Self { synthesizer, speaking: false }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn speak(&mut self, text: &str) {
        if self.speaking {
            self.synthesizer.cancel();
            self.speaking = false;
        }
        match self.synthesizer.speak(text) {
            Ok(()) => self.speaking = true,
            Err(e) => log::error!("Speech synthesis failed: {}", e),
        }
    }

    /// Utterance finished playing.
    pub fn on_end(&mut self) {
        self.speaking = false;
    }

    /// Utterance aborted by the engine.
    pub fn on_error(&mut self, message: &str) {
        log::error!("Speech synthesis error: {}", message);
        self.speaking = false;
    }
}
