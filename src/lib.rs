pub mod commands;
pub mod config;
pub mod feed_set;
pub mod fetcher;
pub mod interaction;
pub mod parser;
pub mod session;
pub mod source;
pub mod store;
pub mod types;

pub use commands::{CommandContext, CommandHandler, CommandTable, Vocabulary};
pub use config::{FeedSlot, ReaderConfig};
pub use feed_set::FeedSet;
pub use fetcher::{FetchConfig, FetchFeed, Fetcher};
pub use interaction::{ConsoleInteraction, Delivery, Interaction, LogDelivery};
pub use session::{Outcome, ReaderSession};
pub use source::FeedSource;
pub use store::WatermarkStore;
pub use types::{Item, RawEntry, ReaderError, Result};
