//! Hands-free speech input and output.
//!
//! Platform speech engines sit behind the [`Recognizer`] and [`Synthesizer`]
//! traits; this module owns the timing and state around them.

pub mod input;
pub mod output;

pub use input::{RecognitionEvent, Recognizer, VoiceInput, SILENCE_THRESHOLD};
pub use output::{Synthesizer, VoiceOutput};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Speech recognition is not available")]
    Unavailable,
    #[error("Recognition error: {0}")]
    Recognition(String),
    #[error("Synthesis error: {0}")]
    Synthesis(String),
}
