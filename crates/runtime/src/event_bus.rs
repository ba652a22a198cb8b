use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Events an [`EventBus`] retains before dropping the oldest.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

/// One entry in the observability stream.
///
/// `kind` is a stable dotted tag (`"lookup.failed"`) that tests and tooling
/// match on; `message` is free text for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub level: Level,
    pub kind: &'static str,
    pub message: String,
}

/// Bounded event history: a ring of the most recent `capacity` events.
///
/// Sequence numbers keep counting across evictions and drains, so a gap in
/// `seq` shows how many events were dropped.
#[derive(Debug)]
pub struct EventBus {
    next_seq: u64,
    capacity: usize,
    events: VecDeque<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            next_seq: 0,
            capacity,
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn emit(&mut self, level: Level, kind: &'static str, message: impl Into<String>) -> &Event {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            seq,
            level,
            kind,
            message: message.into(),
        });
        &self.events[self.events.len() - 1]
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

/// Extra destination for events, e.g. the browser console.
pub type EventSink = Rc<dyn Fn(&Event)>;

/// Cloneable handle to a shared [`EventBus`].
///
/// Every event is recorded on the bus, forwarded to `tracing`, and passed to
/// the optional sink. Handles are cheap to clone into spawned tasks.
#[derive(Clone, Default)]
pub struct EventLog {
    bus: Rc<RefCell<EventBus>>,
    sink: Option<EventSink>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.bus.borrow().len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bus: Rc::new(RefCell::new(EventBus::with_capacity(capacity))),
            sink: None,
        }
    }

    pub fn with_sink(sink: EventSink) -> Self {
        Self {
            bus: Rc::default(),
            sink: Some(sink),
        }
    }

    pub fn emit(&self, level: Level, kind: &'static str, message: impl Into<String>) {
        let event = self.bus.borrow_mut().emit(level, kind, message).clone();
        match level {
            Level::Debug => tracing::debug!(kind, "{}", event.message),
            Level::Info => tracing::info!(kind, "{}", event.message),
            Level::Warn => tracing::warn!(kind, "{}", event.message),
            Level::Error => tracing::error!(kind, "{}", event.message),
        }
        if let Some(sink) = &self.sink {
            sink(&event);
        }
    }

    pub fn debug(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Debug, kind, message);
    }

    pub fn info(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Info, kind, message);
    }

    pub fn warn(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Warn, kind, message);
    }

    pub fn error(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Error, kind, message);
    }

    pub fn events(&self) -> Vec<Event> {
        self.bus.borrow().events().cloned().collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.bus
            .borrow()
            .events()
            .filter(|e| e.kind == kind)
            .count()
    }

    pub fn drain(&self) -> Vec<Event> {
        self.bus.borrow_mut().drain()
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_EVENT_CAPACITY, EventBus, EventLog, Level};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn records_events_with_sequence() {
        let mut bus = EventBus::new();
        bus.emit(Level::Info, "test", "hello");
        bus.emit(Level::Warn, "test", "again");
        let events: Vec<_> = bus.events().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].seq, 1);
        assert_eq!(events[1].level, Level::Warn);
    }

    #[test]
    fn drain_clears_events_but_keeps_sequence() {
        let mut bus = EventBus::new();
        bus.emit(Level::Info, "k", "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());
        assert_eq!(bus.emit(Level::Info, "k", "m").seq, 1);
    }

    #[test]
    fn clones_share_one_bus_and_sink() {
        let seen = Rc::new(Cell::new(0));
        let seen_in_sink = Rc::clone(&seen);
        let log = EventLog::with_sink(Rc::new(move |_| seen_in_sink.set(seen_in_sink.get() + 1)));
        let other = log.clone();

        log.info("a", "one");
        other.error("b", "two");

        assert_eq!(log.events().len(), 2);
        assert_eq!(other.count("b"), 1);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn oldest_events_are_evicted_at_capacity() {
        let mut bus = EventBus::with_capacity(8);
        for i in 0..1000 {
            bus.emit(Level::Info, "tick", format!("event {i}"));
        }
        assert_eq!(bus.len(), 8);
        let seqs: Vec<u64> = bus.events().map(|e| e.seq).collect();
        assert_eq!(seqs, (992..1000).collect::<Vec<u64>>());
    }

    #[test]
    fn default_log_is_bounded() {
        let log = EventLog::new();
        for _ in 0..(DEFAULT_EVENT_CAPACITY * 4) {
            log.info("lookup.succeeded", "x".repeat(1024));
        }
        assert_eq!(log.events().len(), DEFAULT_EVENT_CAPACITY);
        assert_eq!(log.count("lookup.succeeded"), DEFAULT_EVENT_CAPACITY);
    }
}
