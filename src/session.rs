use crate::commands::{self, CommandContext, CommandTable, Vocabulary};
use crate::config::FeedSlot;
use crate::feed_set::FeedSet;
use crate::fetcher::FetchFeed;
use crate::interaction::{dialog, Delivery, Interaction};
use crate::store::WatermarkStore;
use crate::types::{ReaderError, Result};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Extra prompts allowed per command before giving up on the user.
const COMMAND_RETRIES: u32 = 2;

/// Why a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every selected feed was drained.
    Exhausted,
    /// The user stopped, explicitly or by exhausting input retries. Later
    /// feeds were not presented even if they still had items.
    Stopped,
}

/// One interactive request end to end: resolve the query to feeds, walk
/// their new articles under user command, then commit the watermarks.
///
/// A session is transient; build one per request and drop it afterwards.
pub struct ReaderSession<'a> {
    config: Vec<FeedSlot>,
    fetcher: &'a dyn FetchFeed,
    io: &'a mut dyn Interaction,
    mailer: &'a dyn Delivery,
    vocabulary: Vocabulary,
    commands: CommandTable,
}

impl<'a> ReaderSession<'a> {
    pub fn new(
        config: Vec<FeedSlot>,
        fetcher: &'a dyn FetchFeed,
        io: &'a mut dyn Interaction,
        mailer: &'a dyn Delivery,
    ) -> Self {
        Self {
            config,
            fetcher,
            io,
            mailer,
            vocabulary: Vocabulary::english(),
            commands: CommandTable::standard(),
        }
    }

    /// Replace the built-in English phrases with a localized vocabulary.
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    /// Count-only request: report how many new articles each resolved feed
    /// has, without consuming anything. Nothing is committed.
    pub async fn check_feeds(&mut self, query: &str, store: &mut WatermarkStore) -> Result<()> {
        let set = self.resolve(query, store).await?;
        for (name, count) in set.new_counts() {
            self.speak_count(&name, count).await;
        }
        store.close()?;
        Ok(())
    }

    /// Full read request. The commit runs whatever way the traversal ended:
    /// drained, stopped early, or a queue invariant violation.
    pub async fn read_feeds(&mut self, query: &str, store: &mut WatermarkStore) -> Result<Outcome> {
        let mut set = self.resolve(query, store).await?;
        let outcome = self.traverse(&mut set).await;
        store.commit(&set.sources);
        store.close()?;
        outcome
    }

    async fn resolve(&mut self, query: &str, store: &WatermarkStore) -> Result<FeedSet> {
        let set = match FeedSet::resolve(query, &self.config, store, self.fetcher).await {
            Ok(set) => set,
            Err(e) => {
                error!("session failed to resolve feeds: {}", e);
                self.io
                    .present_dialog(dialog::FEEDS_ERROR, &HashMap::new())
                    .await;
                return Err(e);
            }
        };

        for failure in &set.unavailable {
            if let ReaderError::Fetch { name, .. } = failure {
                self.io
                    .present_dialog(dialog::FEED_UNAVAILABLE, &feed_data(name))
                    .await;
            }
        }
        Ok(set)
    }

    /// The consume-one, wait-for-command, act loop, across all feeds in set
    /// order.
    async fn traverse(&mut self, set: &mut FeedSet) -> Result<Outcome> {
        for source in &mut set.sources {
            if source.count() == 0 {
                // The user still hears that a quiet feed had nothing new.
                let name = source.name().to_string();
                self.speak_count(&name, 0).await;
                continue;
            }

            info!("reading feed '{}' ({} new)", source.name(), source.count());
            self.io
                .present_dialog(dialog::FEED_READ, &feed_data(source.name()))
                .await;

            while source.count() != 0 {
                let article = source.next()?;
                self.io.present_text(&article.title).await;

                // Presenting an article marks it as consumed, even if the
                // user stops before interacting with it further.
                if article.published_at > source.watermark() {
                    source.advance_watermark(article.published_at);
                }

                loop {
                    let Some(utterance) = self
                        .io
                        .request_command(dialog::CHOICE_PROMPT, dialog::CHOICE_ERROR, COMMAND_RETRIES)
                        .await
                    else {
                        debug!("command retries exhausted, stopping session");
                        return Ok(Outcome::Stopped);
                    };

                    match self.vocabulary.recognize(&utterance) {
                        Some(commands::STOP) => return Ok(Outcome::Stopped),
                        Some(commands::NEXT) => break,
                        Some(key) => {
                            let mut ctx = CommandContext {
                                feed: &mut *source,
                                article: &article,
                                io: &mut *self.io,
                                mailer: self.mailer,
                            };
                            self.commands.dispatch(key, &mut ctx).await;
                        }
                        None => {
                            let mut ctx = CommandContext {
                                feed: &mut *source,
                                article: &article,
                                io: &mut *self.io,
                                mailer: self.mailer,
                            };
                            self.commands.dispatch_fallback(&mut ctx).await;
                        }
                    }
                }
            }
        }
        Ok(Outcome::Exhausted)
    }

    async fn speak_count(&mut self, name: &str, count: usize) {
        let mut data = feed_data(name);
        data.insert("number".to_string(), count.to_string());
        data.insert(
            "article".to_string(),
            if count == 1 { "article" } else { "articles" }.to_string(),
        );
        self.io.present_dialog(dialog::FEED_COUNT, &data).await;
    }
}

fn feed_data(name: &str) -> HashMap<String, String> {
    HashMap::from([("name".to_string(), name.to_string())])
}
