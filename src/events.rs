// Crawl event bus.
// Fans crawl progress out to subscribers (TUI console, contacts tab) and the log.

use std::sync::{Arc, Mutex, MutexGuard};

use log::Level;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::contacts::{Contact, ContactRow};
use crate::openai::TokenUsage;

/// Progress reported by the pipeline and agents.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// An agent fetched a page that was not cached.
    Visiting { url: String },
    Log { level: Level, message: String },
    /// First-pass contacts for a start URL.
    ContactsFound {
        start_url: String,
        contacts: Vec<Contact>,
    },
    /// The crawl completed and produced these rows.
    Finished {
        rows: Vec<ContactRow>,
        usage: TokenUsage,
    },
    /// The crawl could not run at all.
    Failed { error: String },
}

#[derive(Debug, Default)]
struct Subscribers {
    next_id: u64,
    senders: Vec<(u64, UnboundedSender<CrawlEvent>)>,
}

/// Handle to the event bus. Clones publish to the same subscribers.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Subscribers>>,
}

/// A live subscription. Dropping it also ends delivery.
#[derive(Debug)]
pub struct Subscription {
    pub id: u64,
    receiver: UnboundedReceiver<CrawlEvent>,
}

impl Subscription {
    /// Next event without blocking.
    pub fn try_next(&mut self) -> Option<CrawlEvent> {
        self.receiver.try_recv().ok()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = unbounded_channel();
        let mut subs = self.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.senders.push((id, sender));
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&self, id: u64) {
        self.lock().senders.retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().senders.len()
    }

    /// Deliver an event to every live subscriber, pruning closed ones.
    pub fn publish(&self, event: CrawlEvent) {
        self.lock()
            .senders
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    /// Log a message and forward it to subscribers.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        log::log!(level, "{}", message);
        self.publish(CrawlEvent::Log { level, message });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
