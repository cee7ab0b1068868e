use crate::interaction::{dialog, Delivery, Interaction};
use crate::source::FeedSource;
use crate::types::Item;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

/// Canonical command keys. User-facing phrases map onto these through a
/// [`Vocabulary`]; handlers are looked up in an explicit table, never
/// resolved from raw user text.
pub const STOP: &str = "stop";
pub const NEXT: &str = "next";
pub const AUTHOR: &str = "author";
pub const REPEAT: &str = "repeat";
pub const SUMMARY: &str = "summary";
pub const SYNC: &str = "sync";
pub const EMAIL: &str = "email";

/// Ordered mapping from localized user phrase to canonical command key.
/// A translation layer supplies the phrases in the user's language; the
/// engine only looks for them inside the utterance, first match wins.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    phrases: Vec<(String, &'static str)>,
}

impl Vocabulary {
    pub fn new(phrases: Vec<(String, &'static str)>) -> Self {
        Self { phrases }
    }

    /// Built-in English phrases. `stop` and `next` come first so they take
    /// precedence inside ambiguous utterances.
    pub fn english() -> Self {
        Self::new(vec![
            ("stop".to_string(), STOP),
            ("next".to_string(), NEXT),
            ("author".to_string(), AUTHOR),
            ("repeat".to_string(), REPEAT),
            ("summary".to_string(), SUMMARY),
            ("sync".to_string(), SYNC),
            ("email".to_string(), EMAIL),
        ])
    }

    /// First phrase found inside the utterance wins.
    pub fn recognize(&self, utterance: &str) -> Option<&'static str> {
        let utterance = utterance.to_lowercase();
        self.phrases
            .iter()
            .find(|(phrase, _)| utterance.contains(phrase.as_str()))
            .map(|(_, key)| *key)
    }
}

/// Context handed to a per-article command handler.
pub struct CommandContext<'a> {
    pub feed: &'a mut FeedSource,
    pub article: &'a Item,
    pub io: &'a mut dyn Interaction,
    pub mailer: &'a dyn Delivery,
}

/// One per-article action. Handlers may read the article and advance the
/// feed watermark; only the traversal loop removes items from the queue.
/// Command-level problems are absorbed with a spoken notice, so `invoke`
/// does not return an error.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn invoke(&self, ctx: &mut CommandContext<'_>);
}

/// Explicit dispatch table from canonical command key to handler, built at
/// startup. Unrecognized input goes to the fallback handler.
pub struct CommandTable {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
    fallback: Box<dyn CommandHandler>,
}

impl CommandTable {
    /// The built-in per-article actions. `stop` and `next` never reach the
    /// table; the traversal loop handles them directly.
    pub fn standard() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn CommandHandler>> = HashMap::new();
        handlers.insert(AUTHOR, Box::new(SpeakAuthor));
        handlers.insert(REPEAT, Box::new(RepeatTitle));
        handlers.insert(SUMMARY, Box::new(SpeakSummary));
        handlers.insert(SYNC, Box::new(MarkReadNow));
        handlers.insert(EMAIL, Box::new(ForwardByEmail));
        Self {
            handlers,
            fallback: Box::new(InvalidChoice),
        }
    }

    pub fn register(&mut self, key: &'static str, handler: Box<dyn CommandHandler>) {
        self.handlers.insert(key, handler);
    }

    pub async fn dispatch(&self, key: &'static str, ctx: &mut CommandContext<'_>) {
        match self.handlers.get(key) {
            Some(handler) => handler.invoke(ctx).await,
            None => self.fallback.invoke(ctx).await,
        }
    }

    pub async fn dispatch_fallback(&self, ctx: &mut CommandContext<'_>) {
        self.fallback.invoke(ctx).await;
    }
}

struct SpeakAuthor;

#[async_trait]
impl CommandHandler for SpeakAuthor {
    async fn invoke(&self, ctx: &mut CommandContext<'_>) {
        ctx.io.present_text(&ctx.article.author).await;
    }
}

struct RepeatTitle;

#[async_trait]
impl CommandHandler for RepeatTitle {
    async fn invoke(&self, ctx: &mut CommandContext<'_>) {
        ctx.io.present_text(&ctx.article.title).await;
    }
}

struct SpeakSummary;

#[async_trait]
impl CommandHandler for SpeakSummary {
    async fn invoke(&self, ctx: &mut CommandContext<'_>) {
        ctx.io.present_text(&ctx.article.summary).await;
    }
}

struct MarkReadNow;

#[async_trait]
impl CommandHandler for MarkReadNow {
    async fn invoke(&self, ctx: &mut CommandContext<'_>) {
        // Pins the feed to wall-clock time, not the article's publish time:
        // everything published up to this moment counts as read.
        ctx.feed.advance_watermark(Utc::now());
    }
}

struct ForwardByEmail;

#[async_trait]
impl CommandHandler for ForwardByEmail {
    async fn invoke(&self, ctx: &mut CommandContext<'_>) {
        let head: String = ctx.article.title.chars().take(20).collect();
        let subject = format!("{} feed - {}...", ctx.feed.name(), head);
        let body = format!(
            "<p>From your <i>{0}</i> feed:</p>\n<p><b>{1}</b><br>\n<a href=\"{2}\">{2}</a></p>",
            ctx.feed.name(),
            ctx.article.title,
            ctx.article.link
        );

        ctx.mailer.send(&subject, &body).await;
        ctx.io
            .present_dialog(dialog::FEED_EMAIL, &HashMap::new())
            .await;
    }
}

struct InvalidChoice;

#[async_trait]
impl CommandHandler for InvalidChoice {
    async fn invoke(&self, ctx: &mut CommandContext<'_>) {
        debug!(
            "unrecognized command while reading '{}'",
            ctx.article.title
        );
        ctx.io
            .present_dialog(dialog::CHOICE_ERROR, &HashMap::new())
            .await;
    }
}
