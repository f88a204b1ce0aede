use crate::client::{ChatClient, ChatReply, ReplyHandler, SendOptions};
use crate::conversation::transcript::{ReplyId, Transcript};
use crate::entities::{ChatCompletionMessage, Role};
use crate::voice::{RecognitionEvent, Recognizer, VoiceInput, VoiceOutput};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use uuid::Uuid;

/// How the user produced the message being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOrigin {
    Keyboard,
    Voice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or another send was still in flight.
    Ignored,
    /// The assistant reply that was appended to history.
    Replied(String),
    /// The request failed and the apology was rendered.
    Failed,
}

/// Fixed message rendered when a send fails.
pub fn apology() -> String {
    t!("ui.apology").to_string()
}

/// Localized life-coach persona used as the first history entry.
pub fn system_prompt() -> String {
    t!("prompt.system").to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the in-flight flag for the duration of one send.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Re-renders the typing placeholder as fragments arrive.
struct LiveReply<'a, T> {
    transcript: &'a Mutex<T>,
    id: ReplyId,
    text: String,
}

impl<T: Transcript> ReplyHandler for LiveReply<'_, T> {
    fn on_chunk(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        lock(self.transcript).update_reply(self.id, &self.text);
    }
}

/// One user's chat session: history, in-flight flag and rendered transcript.
///
/// History is only mutated between settled states; the in-flight flag makes
/// a second send during an unsettled one a no-op.
pub struct Conversation<T> {
    client: ChatClient,
    options: SendOptions,
    history: Mutex<Vec<ChatCompletionMessage>>,
    in_flight: AtomicBool,
    transcript: Mutex<T>,
    voice: Mutex<Option<VoiceOutput>>,
}

impl<T: Transcript> Conversation<T> {
    /// Starts a session seeded with the localized system prompt.
    pub fn new(client: ChatClient, options: SendOptions, transcript: T) -> Self {
        Self::with_history(client, options, transcript, vec![ChatCompletionMessage::system(system_prompt())])
    }

    pub fn with_history(
        client: ChatClient,
        options: SendOptions,
        transcript: T,
        history: Vec<ChatCompletionMessage>,
    ) -> Self {
        Self {
            client,
            options,
            history: Mutex::new(history),
            in_flight: AtomicBool::new(false),
            transcript: Mutex::new(transcript),
            voice: Mutex::new(None),
        }
    }

    /// Enables spoken replies for voice-initiated sends.
    pub fn with_voice(self, voice: VoiceOutput) -> Self {
        *lock(&self.voice) = Some(voice);
        self
    }

    pub fn history(&self) -> Vec<ChatCompletionMessage> {
        lock(&self.history).clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn transcript(&self) -> MutexGuard<'_, T> {
        lock(&self.transcript)
    }

    pub fn voice(&self) -> MutexGuard<'_, Option<VoiceOutput>> {
        lock(&self.voice)
    }

    /// Sends one user message and renders the reply as it streams in.
    pub async fn send(&self, input: &str, origin: SendOrigin) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            log::debug!("Ignoring send while a request is in flight");
            return SendOutcome::Ignored;
        };

        let request_id = Uuid::new_v4();
        log::info!("[{}] Sending user message ({:?})", request_id, origin);

        self.transcript().push_message(Role::User, text);
        let snapshot = {
            let mut history = lock(&self.history);
            history.push(ChatCompletionMessage::user(text));
            history.clone()
        };
        let reply_id = self.transcript().begin_reply();

        let mut live = LiveReply { transcript: &self.transcript, id: reply_id, text: String::new() };
        let result = self.client.send_message(&snapshot, &self.options, &mut live).await;

        let content = match &result {
            Ok(ChatReply::Streamed { .. }) => Some(live.text),
            Ok(reply @ ChatReply::Completed(_)) => reply.content().map(str::to_owned),
            Err(_) => None,
        };

        let Some(content) = content else {
            if result.is_ok() {
                log::error!("[{}] Completion carried no message content", request_id);
            }
            let mut transcript = self.transcript();
            transcript.discard_reply(reply_id);
            transcript.push_message(Role::Assistant, &apology());
            return SendOutcome::Failed;
        };

        self.transcript().finish_reply(reply_id, &content);
        lock(&self.history).push(ChatCompletionMessage::assistant(content.clone()));
        log::info!("[{}] Reply settled ({} chars)", request_id, content.chars().count());

        if origin == SendOrigin::Voice {
            if let Some(voice) = self.voice().as_mut() {
                voice.speak(&content);
            }
        }

        SendOutcome::Replied(content)
    }

    /// Listens for one utterance and sends it as a voice-initiated message.
    pub async fn listen_and_send<R: Recognizer>(
        &self,
        input: &mut VoiceInput<R>,
        events: &mut mpsc::Receiver<RecognitionEvent>,
    ) -> SendOutcome {
        match input.listen(events).await {
            Ok(Some(utterance)) => self.send(&utterance, SendOrigin::Voice).await,
            Ok(None) => SendOutcome::Ignored,
            Err(e) => {
                log::warn!("Voice input ended without an utterance: {}", e);
                SendOutcome::Ignored
            }
        }
    }
}
