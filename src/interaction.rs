use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use tracing::info;

/// Dialog template identifiers. The core speaks through these; a
/// presentation layer owns the actual wording and localization.
pub mod dialog {
    /// `{name}`, `{number}`, `{article}` — per-feed new-article count.
    pub const FEED_COUNT: &str = "feed.count";
    /// `{name}` — announcing that a feed is about to be read.
    pub const FEED_READ: &str = "feed.read";
    /// Confirmation after forwarding an article by email.
    pub const FEED_EMAIL: &str = "feed.email";
    /// `{name}` — a feed could not be fetched this session.
    pub const FEED_UNAVAILABLE: &str = "feed.unavailable";
    /// Prompt for the next per-article command.
    pub const CHOICE_PROMPT: &str = "choice.prompt";
    /// Spoken when a command was not understood.
    pub const CHOICE_ERROR: &str = "choice.error";
    /// Fatal session error (nothing configured, nothing resolved).
    pub const FEEDS_ERROR: &str = "feeds.error";
}

/// The speech/display collaborator. The core never performs raw I/O itself.
#[async_trait]
pub trait Interaction: Send {
    /// Speak or display a plain line of text.
    async fn present_text(&mut self, text: &str);

    /// Speak or display a templated dialog with its data fields.
    async fn present_dialog(&mut self, template: &str, data: &HashMap<String, String>);

    /// Block for one command utterance, re-prompting with `error` up to
    /// `max_retries` times on empty input. `None` means the retries were
    /// exhausted without a usable answer.
    async fn request_command(
        &mut self,
        prompt: &str,
        error: &str,
        max_retries: u32,
    ) -> Option<String>;
}

/// Outbound delivery for the forward-by-email command.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(&self, subject: &str, body: &str);
}

/// Stdin/stdout interaction for the CLI binary.
pub struct ConsoleInteraction;

fn field<'a>(data: &'a HashMap<String, String>, key: &str) -> &'a str {
    data.get(key).map(String::as_str).unwrap_or("")
}

fn render_dialog(template: &str, data: &HashMap<String, String>) -> String {
    match template {
        dialog::FEED_COUNT => format!(
            "You have {} new {} in your {} feed",
            field(data, "number"),
            field(data, "article"),
            field(data, "name")
        ),
        dialog::FEED_READ => format!("Starting to read your {} feed", field(data, "name")),
        dialog::FEED_EMAIL => "The article has been sent to your inbox".to_string(),
        dialog::FEED_UNAVAILABLE => {
            format!("Your {} feed is unavailable right now", field(data, "name"))
        }
        dialog::CHOICE_PROMPT => {
            "What next? (next, repeat, author, summary, sync, email, stop)".to_string()
        }
        dialog::CHOICE_ERROR => "Sorry, I did not catch that".to_string(),
        dialog::FEEDS_ERROR => "Sorry, I could not find any feeds to read".to_string(),
        other => format!("{} {:?}", other, data),
    }
}

#[async_trait]
impl Interaction for ConsoleInteraction {
    async fn present_text(&mut self, text: &str) {
        println!("{}", text);
    }

    async fn present_dialog(&mut self, template: &str, data: &HashMap<String, String>) {
        println!("{}", render_dialog(template, data));
    }

    async fn request_command(
        &mut self,
        prompt: &str,
        error: &str,
        max_retries: u32,
    ) -> Option<String> {
        for attempt in 0..=max_retries {
            if attempt > 0 {
                println!("{}", render_dialog(error, &HashMap::new()));
            }
            print!("{} ", render_dialog(prompt, &HashMap::new()));
            let _ = io::stdout().flush();

            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                // EOF: the user is gone, no point re-prompting.
                Ok(0) => return None,
                Ok(_) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        return Some(line.to_string());
                    }
                }
                Err(_) => return None,
            }
        }
        None
    }
}

/// Delivery stand-in that logs instead of sending. Wiring a real SMTP or
/// notification backend is the embedding application's job.
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn send(&self, subject: &str, body: &str) {
        info!("delivering email '{}' ({} bytes)", subject, body.len());
    }
}
