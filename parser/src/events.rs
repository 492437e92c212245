//! Event & Notification Surface (C7, §4.6, §5).
//!
//! Three channels, all invoked only after a tracker `Execute` succeeds:
//! an observer fan-out, a typed event bus, and a UI callback trait whose
//! methods receive freshly-read rows rather than in-memory tracker state.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use kinded::Kinded;
use tracing::{error, warn};

use crate::store::{PlayerStatsRow, PortRow, SectorRow, TraderRow};
use crate::types::{Message, SectorIndex};

/// Wall-clock milliseconds since the epoch, used to stamp events fired
/// with `timestamp_ms: 0` (§4.6: "Events carry a timestamp, set on fire
/// if zero").
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A notification fired after a successful tracker `Execute` (§4.6, §9:
/// "tagged variant event types; each variant carries a typed record").
#[derive(Debug, Clone, Kinded)]
pub enum Event {
    CurrentSectorChanged {
        sector: SectorIndex,
        timestamp_ms: i64,
        source: &'static str,
    },
    SectorUpdated {
        sector: SectorIndex,
        timestamp_ms: i64,
        source: &'static str,
    },
    PortUpdated {
        sector: SectorIndex,
        timestamp_ms: i64,
        source: &'static str,
    },
    PlayerStatsUpdated {
        timestamp_ms: i64,
        source: &'static str,
    },
    TraderDataUpdated {
        sector: SectorIndex,
        timestamp_ms: i64,
        source: &'static str,
    },
    MessageReceived {
        message: Message,
        timestamp_ms: i64,
        source: &'static str,
    },
}

impl Event {
    pub fn timestamp_ms(&self) -> i64 {
        match self {
            Event::CurrentSectorChanged { timestamp_ms, .. }
            | Event::SectorUpdated { timestamp_ms, .. }
            | Event::PortUpdated { timestamp_ms, .. }
            | Event::PlayerStatsUpdated { timestamp_ms, .. }
            | Event::TraderDataUpdated { timestamp_ms, .. }
            | Event::MessageReceived { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

type Handler = dyn Fn(&Event) + Send + Sync;

/// Subscriber map protected by a single readers-writer lock (§5). `fire`
/// reads under the read lock, snapshots the handlers for the event kind,
/// and releases the lock *before* calling them, so a handler may
/// re-subscribe without deadlocking.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<(u64, Arc<Handler>)>>>,
    next_id: AtomicU64,
}

pub struct SubscriptionId(u64);

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subs = self.subscribers.write().expect("event bus lock poisoned");
        subs.entry(kind).or_default().push((id, Arc::new(handler)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        let mut subs = self.subscribers.write().expect("event bus lock poisoned");
        if let Some(handlers) = subs.get_mut(&kind) {
            handlers.retain(|(existing, _)| *existing != id.0);
        }
    }

    /// Fires synchronously, in subscription order.
    pub fn fire(&self, event: &Event) {
        let snapshot: Vec<Arc<Handler>> = {
            let subs = self.subscribers.read().expect("event bus lock poisoned");
            subs.get(&event.kind())
                .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            handler(event);
        }
    }

    /// Fires asynchronously: spawns one thread per handler after
    /// snapshotting, so a slow subscriber never blocks the parser thread
    /// or its siblings.
    pub fn fire_async(&self, event: Event) {
        let snapshot: Vec<Arc<Handler>> = {
            let subs = self.subscribers.read().expect("event bus lock poisoned");
            subs.get(&event.kind())
                .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        let event = Arc::new(event);
        for handler in snapshot {
            let event = event.clone();
            std::thread::spawn(move || handler(&event));
        }
    }
}

/// Synchronous observer fan-out (§4.6 point 1). Mutated only from the
/// parser thread (§5).
pub trait Observer: Send {
    fn on_event(&mut self, event: &Event);
}

#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Box<dyn Observer>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn detach_all(&mut self) {
        self.observers.clear();
    }

    /// Notifies every observer in registration order. A panicking observer
    /// is caught, logged, and does not interrupt the remaining observers
    /// (§4.6, §7: "Panic inside a handler").
    pub fn notify(&mut self, event: &Event) {
        for (index, observer) in self.observers.iter_mut().enumerate() {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(event)));
            if result.is_err() {
                error!(observer_index = index, "observer panicked; isolated and continuing");
            }
        }
    }
}

/// UI callback surface (§4.6 point 3). Every method receives freshly-read
/// data, never the in-memory tracker, so the UI only ever sees committed
/// state.
pub trait UiCallbacks: Send {
    fn on_current_sector_changed(&mut self, sector: &SectorRow) {
        let _ = sector;
    }
    fn on_sector_updated(&mut self, sector: &SectorRow) {
        let _ = sector;
    }
    fn on_port_updated(&mut self, port: &PortRow) {
        let _ = port;
    }
    fn on_player_stats_updated(&mut self, stats: &PlayerStatsRow) {
        let _ = stats;
    }
    fn on_trader_data_updated(&mut self, sector: SectorIndex, traders: &[TraderRow]) {
        let _ = (sector, traders);
    }
}

/// Logs a `StoreError` from a tracker `Execute` and suppresses the UI
/// event for that flush, matching §7: "the UI event for that flush is
/// suppressed (callbacks only fire on success)".
pub fn log_store_failure(context: &'static str, err: &crate::error::StoreError) {
    warn!(context, error = %err, "tracker execute failed; suppressing UI event");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct PanickyObserver;
    impl Observer for PanickyObserver {
        fn on_event(&mut self, _event: &Event) {
            panic!("boom");
        }
    }

    struct CountingObserver(Arc<AtomicUsize>);
    impl Observer for CountingObserver {
        fn on_event(&mut self, _event: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn observer_panic_is_isolated() {
        let mut list = ObserverList::new();
        let count = Arc::new(AtomicUsize::new(0));
        list.attach(Box::new(PanickyObserver));
        list.attach(Box::new(CountingObserver(count.clone())));

        list.notify(&Event::PlayerStatsUpdated { timestamp_ms: 0, source: "test" });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_bus_fire_calls_subscribed_handlers() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        bus.subscribe(EventKind::PlayerStatsUpdated, move |_event| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        bus.fire(&Event::PlayerStatsUpdated { timestamp_ms: 1, source: "test" });
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Different kind, should not trigger the handler.
        bus.fire(&Event::SectorUpdated {
            sector: SectorIndex(1),
            timestamp_ms: 1,
            source: "test",
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_future_deliveries() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let id = bus.subscribe(EventKind::PlayerStatsUpdated, move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        bus.unsubscribe(EventKind::PlayerStatsUpdated, id);
        bus.fire(&Event::PlayerStatsUpdated { timestamp_ms: 1, source: "test" });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
