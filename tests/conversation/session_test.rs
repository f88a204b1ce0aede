#[path = "../common/mod.rs"]
mod common;

use coach_relay::client::{ChatClient, SendOptions};
use coach_relay::conversation::{apology, Conversation, ReplyId, SendOrigin, SendOutcome, Transcript};
use coach_relay::entities::Role;
use coach_relay::error::ErrorResponse;
use serde_json::json;
use coach_relay::voice::{RecognitionEvent, Recognizer, Synthesizer, VoiceError, VoiceInput, VoiceOutput};
use common::{start_relay, start_upstream};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Records every rendering call.
#[derive(Default)]
struct Rendered {
    messages: Vec<(Role, String)>,
    updates: Vec<String>,
    finished: Vec<String>,
    discarded: usize,
    open: Option<ReplyId>,
}

impl Transcript for Rendered {
    fn push_message(&mut self, role: Role, text: &str) {
        self.messages.push((role, text.to_string()));
    }

    fn begin_reply(&mut self) -> ReplyId {
        let id = ReplyId(self.messages.len() as u64);
        self.open = Some(id);
        id
    }

    fn update_reply(&mut self, id: ReplyId, text: &str) {
        assert_eq!(self.open, Some(id));
        self.updates.push(text.to_string());
    }

    fn finish_reply(&mut self, id: ReplyId, text: &str) {
        assert_eq!(self.open.take(), Some(id));
        self.finished.push(text.to_string());
    }

    fn discard_reply(&mut self, id: ReplyId) {
        assert_eq!(self.open.take(), Some(id));
        self.discarded += 1;
    }
}

fn conversation(endpoint: String, stream: bool) -> Conversation<Rendered> {
    let options = SendOptions { stream, ..SendOptions::default() };
    Conversation::new(ChatClient::new(endpoint), options, Rendered::default())
}

#[actix_web::test]
async fn test_streamed_reply_settles_into_history() {
    let (upstream, _seen) = start_upstream();
    let relay = start_relay(upstream.url("/complete"));
    let conversation = conversation(relay.url("/chat"), true);

    let outcome = conversation.send("  Hello  ", SendOrigin::Keyboard).await;
    assert_eq!(outcome, SendOutcome::Replied("Hi there你".to_string()));
    assert!(!conversation.is_in_flight());

    let history = conversation.history();
    let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    assert_eq!(history[1].content, "Hello");
    assert_eq!(history[2].content, "Hi there你");

    let transcript = conversation.transcript();
    assert_eq!(transcript.messages, vec![(Role::User, "Hello".to_string())]);
    assert_eq!(transcript.updates, vec!["Hi", "Hi there", "Hi there你"]);
    assert_eq!(transcript.finished, vec!["Hi there你"]);
    assert_eq!(transcript.discarded, 0);
}

#[actix_web::test]
async fn test_non_streamed_reply_finalizes_placeholder() {
    let (upstream, _seen) = start_upstream();
    let relay = start_relay(upstream.url("/complete"));
    let conversation = conversation(relay.url("/chat"), false);

    let outcome = conversation.send("Hello", SendOrigin::Keyboard).await;
    assert_eq!(outcome, SendOutcome::Replied("Hello from upstream".to_string()));

    let transcript = conversation.transcript();
    assert!(transcript.updates.is_empty());
    assert_eq!(transcript.finished, vec!["Hello from upstream"]);
    assert_eq!(conversation.history().len(), 3);
}

#[actix_web::test]
async fn test_failed_send_renders_one_apology() {
    let (upstream, seen) = start_upstream();
    let relay = start_relay(upstream.url("/limited"));
    let conversation = conversation(relay.url("/chat"), true);

    let outcome = conversation.send("Hello", SendOrigin::Keyboard).await;
    assert_eq!(outcome, SendOutcome::Failed);
    assert!(!conversation.is_in_flight());
    // Upstream was reached and answered 429
    assert_eq!(seen.hits(), 1);
    assert_eq!(seen.last_body()["messages"][1]["content"], "Hello");

    let transcript = conversation.transcript();
    assert_eq!(transcript.discarded, 1);
    assert!(transcript.finished.is_empty());
    let apologies = transcript
        .messages
        .iter()
        .filter(|(role, text)| *role == Role::Assistant && *text == apology())
        .count();
    assert_eq!(apologies, 1);
    drop(transcript);

    let roles: Vec<Role> = conversation.history().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User]);
}

#[actix_web::test]
async fn test_send_while_in_flight_is_a_no_op() {
    let (upstream, seen) = start_upstream();
    let relay = start_relay(upstream.url("/complete"));
    let conversation = conversation(relay.url("/chat"), true);

    let (first, second) = tokio::join!(
        conversation.send("first", SendOrigin::Keyboard),
        conversation.send("second", SendOrigin::Keyboard)
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|o| matches!(o, SendOutcome::Replied(_))).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| **o == SendOutcome::Ignored).count(), 1);
    assert_eq!(seen.hits(), 1);

    let users = conversation.history().into_iter().filter(|m| m.role == Role::User).count();
    assert_eq!(users, 1);
    assert_eq!(conversation.history().len(), 3);
}

struct StubRecognizer;

impl Recognizer for StubRecognizer {
    fn start(&mut self) -> Result<(), VoiceError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

struct Spoken(Arc<Mutex<Vec<String>>>);

impl Synthesizer for Spoken {
    fn speak(&mut self, text: &str) -> Result<(), VoiceError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn cancel(&mut self) {}
}

#[actix_web::test]
async fn test_voice_utterance_is_sent_and_spoken() {
    let (upstream, seen) = start_upstream();
    let relay = start_relay(upstream.url("/complete"));
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let conversation = conversation(relay.url("/chat"), true)
        .with_voice(VoiceOutput::new(Box::new(Spoken(spoken.clone()))));

    let (tx, mut rx) = mpsc::channel(4);
    tx.send(RecognitionEvent::Partial("Hel".to_string())).await.unwrap();
    tx.send(RecognitionEvent::Partial("Hello".to_string())).await.unwrap();

    let mut input = VoiceInput::with_silence(StubRecognizer, Duration::from_millis(50));
    let outcome = conversation.listen_and_send(&mut input, &mut rx).await;

    assert_eq!(outcome, SendOutcome::Replied("Hi there你".to_string()));
    assert_eq!(seen.last_body()["messages"][1]["content"], "Hello");
    assert_eq!(*spoken.lock().unwrap(), vec!["Hi there你".to_string()]);
    assert!(conversation.voice().as_ref().is_some_and(|voice| voice.is_speaking()));
}

#[actix_web::test]
async fn test_keyboard_reply_is_not_spoken() {
    let (upstream, _seen) = start_upstream();
    let relay = start_relay(upstream.url("/complete"));
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let conversation = conversation(relay.url("/chat"), false)
        .with_voice(VoiceOutput::new(Box::new(Spoken(spoken.clone()))));

    conversation.send("Hello", SendOrigin::Keyboard).await;
    assert!(spoken.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn test_unreachable_upstream_apologizes_once() {
    let relay = start_relay("http://127.0.0.1:1/v1/chat/completions".to_string());
    let conversation = conversation(relay.url("/chat"), true);

    let direct = reqwest::Client::new()
        .post(relay.url("/chat"))
        .json(&json!({"messages": [{"role": "user", "content": "Hello"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(direct.status().as_u16(), 500);
    let body: ErrorResponse = direct.json().await.unwrap();
    assert_eq!(body.code, 500);
    assert!(!body.error.is_empty());

    assert_eq!(conversation.send("Hello", SendOrigin::Keyboard).await, SendOutcome::Failed);
    assert_eq!(conversation.send("Again", SendOrigin::Keyboard).await, SendOutcome::Failed);

    let transcript = conversation.transcript();
    let apologies = transcript.messages.iter().filter(|(role, _)| *role == Role::Assistant).count();
    assert_eq!(apologies, 2, "one apology per failed send");
    assert_eq!(transcript.discarded, 2);
}
