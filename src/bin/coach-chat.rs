use anyhow::Context;
use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use coach_relay::client::{ChatClient, ChatReply, ReplyHandler, SendOptions, DEFAULT_ENDPOINT};
use coach_relay::conversation::{Conversation, ReplyId, SendOrigin, SendOutcome, Transcript};
use coach_relay::entities::{ChatCompletionMessage, Role};
use coach_relay::utils::init;

/// Terminal chat with the life coach through a running relay.
#[derive(Debug, Parser)]
#[command(name = "coach-chat", version, about)]
struct Args {
    /// Relay chat endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Sampling temperature sent with every request
    #[arg(long, default_value_t = 0.6)]
    temperature: f32,

    /// Ask for a single JSON completion instead of a stream
    #[arg(long)]
    no_stream: bool,

    /// Perform one non-streaming round trip and exit
    #[arg(long)]
    probe: bool,

    #[arg(long, default_value = "zh-CN")]
    locale: String,

    #[arg(long, default_value = "config/log4rs-chat.yml")]
    log_config: String,
}

/// Prints the conversation to stdout, appending only the unseen suffix of a
/// reply as it grows.
#[derive(Default)]
struct ConsoleTranscript {
    next_id: u64,
    printed: usize,
}

impl ConsoleTranscript {
    fn flush() {
        let _ = std::io::stdout().flush();
    }
}

impl Transcript for ConsoleTranscript {
    fn push_message(&mut self, role: Role, text: &str) {
        match role {
            Role::User => {}
            _ => println!("{}> {}\n", role, text),
        }
    }

    fn begin_reply(&mut self) -> ReplyId {
        self.next_id += 1;
        self.printed = 0;
        print!("assistant> ...");
        Self::flush();
        ReplyId(self.next_id)
    }

    fn update_reply(&mut self, _id: ReplyId, text: &str) {
        if self.printed == 0 {
            print!("\rassistant> ");
        }
        if let Some(suffix) = text.get(self.printed..) {
            print!("{}", suffix);
            self.printed = text.len();
        }
        Self::flush();
    }

    fn finish_reply(&mut self, id: ReplyId, text: &str) {
        self.update_reply(id, text);
        println!("\n");
    }

    fn discard_reply(&mut self, _id: ReplyId) {
        if self.printed == 0 {
            print!("\r{:14}\r", "");
        } else {
            println!();
        }
        Self::flush();
    }
}

struct Silent;

impl ReplyHandler for Silent {
    fn on_chunk(&mut self, _fragment: &str) {}
}

async fn probe(client: &ChatClient, temperature: f32) -> anyhow::Result<()> {
    let options = SendOptions { temperature, stream: false };
    let history = [ChatCompletionMessage::user("你好")];

    let reply = client
        .send_message(&history, &options, &mut Silent)
        .await
        .with_context(|| format!("Probe request to {} failed", client.endpoint()))?;

    match &reply {
        ChatReply::Completed(completion) => println!("{}", serde_json::to_string_pretty(completion)?),
        ChatReply::Streamed { raw, .. } => println!("{}", raw),
    }
    println!("\n{}", reply.content().unwrap_or_default());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init::init_logging(&args.log_config)
        .with_context(|| format!("Failed to load logging config {}", args.log_config))?;
    init::set_locale(&args.locale);

    let client = ChatClient::new(args.endpoint.clone());
    if args.probe {
        return probe(&client, args.temperature).await;
    }

    let options = SendOptions { temperature: args.temperature, stream: !args.no_stream };
    let conversation = Conversation::new(client, options, ConsoleTranscript::default());
    log::info!("coach-chat connected to {}", args.endpoint);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        ConsoleTranscript::flush();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if let SendOutcome::Failed = conversation.send(&line, SendOrigin::Keyboard).await {
            log::warn!("Reply failed for input of {} chars", line.chars().count());
        }
    }

    Ok(())
}
