use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rss_reader::interaction::dialog;
use rss_reader::{
    Delivery, FeedSlot, FetchFeed, Interaction, Outcome, RawEntry, ReaderError, ReaderSession,
    Result, WatermarkStore,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tempfile::tempdir;

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

fn entry(title: &str, secs: i64) -> RawEntry {
    RawEntry {
        title: title.to_string(),
        summary: format!("<p>About {}</p>", title),
        author: Some("Alice".to_string()),
        link: format!("http://example.com/{}", title),
        published_at: Some(ts(secs)),
    }
}

fn slot(name: &str) -> FeedSlot {
    FeedSlot {
        name: name.to_string(),
        url: format!("http://example.com/{}.xml", name.to_lowercase()),
    }
}

struct CannedFetcher {
    feeds: HashMap<String, Vec<RawEntry>>,
}

impl CannedFetcher {
    fn single(url: &str, entries: Vec<RawEntry>) -> Self {
        Self {
            feeds: HashMap::from([(url.to_string(), entries)]),
        }
    }
}

#[async_trait]
impl FetchFeed for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        match self.feeds.get(url) {
            Some(entries) => Ok(entries.clone()),
            None => Err(ReaderError::Parse(format!("connection refused: {}", url))),
        }
    }
}

/// Interaction double: replays a scripted command sequence and records
/// everything the session speaks. An exhausted script acts like a user who
/// stopped answering (retries run out, `request_command` yields `None`).
#[derive(Default)]
struct ScriptedInteraction {
    responses: VecDeque<String>,
    spoken: Vec<String>,
    dialogs: Vec<(String, HashMap<String, String>)>,
}

impl ScriptedInteraction {
    fn with_responses(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn dialog_count(&self, template: &str) -> usize {
        self.dialogs.iter().filter(|(t, _)| t == template).count()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn present_text(&mut self, text: &str) {
        self.spoken.push(text.to_string());
    }

    async fn present_dialog(&mut self, template: &str, data: &HashMap<String, String>) {
        self.dialogs.push((template.to_string(), data.clone()));
    }

    async fn request_command(
        &mut self,
        _prompt: &str,
        _error: &str,
        _max_retries: u32,
    ) -> Option<String> {
        self.responses.pop_front()
    }
}

#[derive(Default)]
struct RecordingDelivery {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send(&self, subject: &str, body: &str) {
        self.sent
            .lock()
            .expect("delivery lock")
            .push((subject.to_string(), body.to_string()));
    }
}

fn open_store(dir: &tempfile::TempDir) -> WatermarkStore {
    WatermarkStore::open(dir.path().join("feed-data.json")).expect("open store")
}

#[tokio::test]
async fn stop_after_first_article_commits_only_its_time() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("alpha", 100), entry("beta", 200), entry("gamma", 300)],
    );
    let mut io = ScriptedInteraction::with_responses(&["stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    let outcome = session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(outcome, Outcome::Stopped);
    assert_eq!(io.spoken, ["alpha"], "only the first article is presented");
    assert_eq!(store.read("News"), ts(100), "commit reflects only article 1");
}

#[tokio::test]
async fn next_steps_to_the_following_article() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("alpha", 100), entry("beta", 200), entry("gamma", 300)],
    );
    let mut io = ScriptedInteraction::with_responses(&["next", "stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    let outcome = session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(outcome, Outcome::Stopped);
    assert_eq!(io.spoken, ["alpha", "beta"], "gamma stays unconsumed");
    // Presenting an article marks it read, even when the user stops there.
    assert_eq!(store.read("News"), ts(200));
}

#[tokio::test]
async fn exhausted_retries_behave_like_stop_with_partial_commit() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("alpha", 100), entry("beta", 200)],
    );
    // No usable answer at all: request_command yields None immediately.
    let mut io = ScriptedInteraction::with_responses(&[]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    let outcome = session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(outcome, Outcome::Stopped);
    assert_eq!(io.spoken, ["alpha"]);
    assert_eq!(store.read("News"), ts(100), "partial advancement still committed");
}

#[tokio::test]
async fn unrecognized_command_stays_on_the_same_article() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("alpha", 100), entry("beta", 200)],
    );
    let mut io = ScriptedInteraction::with_responses(&["make me a sandwich", "next", "stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(
        io.dialog_count(dialog::CHOICE_ERROR),
        1,
        "invalid input gets the error dialog"
    );
    // alpha was neither skipped nor re-presented; next still moves to beta.
    assert_eq!(io.spoken, ["alpha", "beta"]);
}

#[tokio::test]
async fn per_article_commands_do_not_advance() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("alpha", 100)],
    );
    let mut io =
        ScriptedInteraction::with_responses(&["author", "repeat", "summary", "stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(io.spoken, ["alpha", "Alice", "alpha", "About alpha"]);
}

#[tokio::test]
async fn sync_marks_the_feed_read_as_of_now() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("alpha", 100)],
    );
    let mut io = ScriptedInteraction::with_responses(&["sync", "stop"]);
    let mailer = RecordingDelivery::default();

    let before = Utc::now();
    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    let committed = store.read("News");
    assert!(
        committed >= before,
        "sync pins the watermark to wall-clock time, got {}",
        committed
    );
}

#[tokio::test]
async fn email_command_forwards_the_article() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("a very long headline about rockets", 100)],
    );
    let mut io = ScriptedInteraction::with_responses(&["email", "stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    let sent = mailer.sent.lock().expect("delivery lock");
    assert_eq!(sent.len(), 1);
    let (subject, body) = &sent[0];
    assert_eq!(subject, "News feed - a very long headline...");
    assert!(body.contains("http://example.com/a very long headline about rockets"));
    assert_eq!(io.dialog_count(dialog::FEED_EMAIL), 1);
}

#[tokio::test]
async fn empty_feed_reports_no_new_articles_and_moves_on() {
    let dir = tempdir().expect("tempdir");
    let fetcher = CannedFetcher {
        feeds: HashMap::from([
            // Everything in the news feed predates the stored watermark.
            ("http://example.com/news.xml".to_string(), vec![entry("stale", 5)]),
            ("http://example.com/weather.xml".to_string(), vec![entry("storm", 100)]),
        ]),
    };
    {
        let mut seed = open_store(&dir);
        let mut primed =
            rss_reader::FeedSource::new("News", "http://example.com/news.xml", ts(0), vec![]);
        primed.advance_watermark(ts(50));
        seed.commit(&[primed]);
        seed.close().expect("seed close");
    }
    let mut store = open_store(&dir);
    let mut io = ScriptedInteraction::with_responses(&["stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(
        vec![slot("News"), slot("Weather")],
        &fetcher,
        &mut io,
        &mailer,
    );
    session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(io.dialog_count(dialog::FEED_COUNT), 1, "quiet feed is announced");
    assert_eq!(io.spoken, ["storm"], "traversal proceeds to the next feed");
}

#[tokio::test]
async fn stop_exits_all_remaining_feeds() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher {
        feeds: HashMap::from([
            ("http://example.com/news.xml".to_string(), vec![entry("alpha", 100)]),
            ("http://example.com/weather.xml".to_string(), vec![entry("storm", 200)]),
        ]),
    };
    let mut io = ScriptedInteraction::with_responses(&["stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(
        vec![slot("News"), slot("Weather")],
        &fetcher,
        &mut io,
        &mailer,
    );
    let outcome = session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(outcome, Outcome::Stopped);
    assert_eq!(io.spoken, ["alpha"], "the weather feed is never presented");
    assert_eq!(store.read("News"), ts(100));
    assert_eq!(
        store.read("Weather"),
        DateTime::UNIX_EPOCH,
        "untouched feed keeps its starting watermark"
    );
}

#[tokio::test]
async fn failed_fetch_degrades_to_unavailable_notice() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    // Only the weather feed is reachable.
    let fetcher = CannedFetcher::single(
        "http://example.com/weather.xml",
        vec![entry("storm", 100)],
    );
    let mut io = ScriptedInteraction::with_responses(&["stop"]);
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(
        vec![slot("News"), slot("Weather")],
        &fetcher,
        &mut io,
        &mailer,
    );
    let outcome = session
        .read_feeds("hello", &mut store)
        .await
        .expect("read_feeds");

    assert_eq!(outcome, Outcome::Stopped);
    assert_eq!(io.dialog_count(dialog::FEED_UNAVAILABLE), 1);
    assert_eq!(io.spoken, ["storm"], "the healthy feed still gets presented");
}

#[tokio::test]
async fn check_feeds_reports_counts_without_consuming() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher::single(
        "http://example.com/news.xml",
        vec![entry("alpha", 100), entry("beta", 200)],
    );
    let mut io = ScriptedInteraction::default();
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![slot("News")], &fetcher, &mut io, &mailer);
    session
        .check_feeds("hello", &mut store)
        .await
        .expect("check_feeds");

    assert_eq!(io.dialog_count(dialog::FEED_COUNT), 1);
    let (_, data) = &io.dialogs[0];
    assert_eq!(data.get("number").map(String::as_str), Some("2"));
    assert_eq!(
        store.read("News"),
        DateTime::UNIX_EPOCH,
        "counting commits nothing"
    );
}

#[tokio::test]
async fn empty_configuration_is_a_spoken_fatal_error() {
    let dir = tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    let fetcher = CannedFetcher {
        feeds: HashMap::new(),
    };
    let mut io = ScriptedInteraction::default();
    let mailer = RecordingDelivery::default();

    let mut session = ReaderSession::new(vec![], &fetcher, &mut io, &mailer);
    let result = session.read_feeds("hello", &mut store).await;

    assert!(matches!(result, Err(ReaderError::EmptyConfiguration)));
    assert_eq!(io.dialog_count(dialog::FEEDS_ERROR), 1);
}
