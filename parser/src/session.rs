//! Top-level orchestration: the `Parser` value that owns C1 through C7 for
//! one proxy session (§9: "Global parser state -> encapsulated in one
//! Parser value owned by the proxy session; no process-wide state").

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;

use tracing::{error, span, trace, Level};

use crate::assembler::{AssembledLine, LineAssembler};
use crate::config::ParserConfig;
use crate::display::{DisplayState, PendingMessage};
use crate::dispatch;
use crate::events::{log_store_failure, Event, EventBus, ObserverList, UiCallbacks};
use crate::store::Store;
use crate::trackers::{
    PlanetsTracker, PlayerStatsTracker, PortTracker, SectorTracker, ShipsTracker, TraderRecord,
    TradersTracker,
};
use crate::types::{Message, SectorIndex};

/// Owns every piece of the extractor for one proxy session: the line
/// assembler, display state machine, in-flight trackers, store handle, and
/// notification surface.
pub struct Parser<U: UiCallbacks> {
    pub(crate) config: ParserConfig,
    pub(crate) assembler: LineAssembler,
    pub(crate) display: DisplayState,
    pub(crate) store: Store,
    pub(crate) observers: ObserverList,
    pub(crate) bus: EventBus,
    pub(crate) ui: U,
    pub(crate) messages: VecDeque<Message>,
    pub(crate) stardock_sector: Option<SectorIndex>,

    pub(crate) sector_tracker: Option<SectorTracker>,
    pub(crate) port_tracker: Option<PortTracker>,
    pub(crate) ships_tracker: Option<ShipsTracker>,
    pub(crate) traders_tracker: Option<TradersTracker>,
    pub(crate) planets_tracker: Option<PlanetsTracker>,
    pub(crate) pending_trader: Option<TraderRecord>,
    pub(crate) player_stats_tracker: PlayerStatsTracker,
    pub(crate) quickstats_active: bool,
    pub(crate) info_active: bool,
}

impl<U: UiCallbacks> Parser<U> {
    pub fn new(config: ParserConfig, store: Store, ui: U) -> Self {
        let max_line_length = config.max_line_length;
        Self {
            config,
            assembler: LineAssembler::new(max_line_length),
            display: DisplayState::new(),
            store,
            observers: ObserverList::new(),
            bus: EventBus::new(),
            ui,
            messages: VecDeque::new(),
            stardock_sector: None,
            sector_tracker: None,
            port_tracker: None,
            ships_tracker: None,
            traders_tracker: None,
            planets_tracker: None,
            pending_trader: None,
            player_stats_tracker: PlayerStatsTracker::new(),
            quickstats_active: false,
            info_active: false,
        }
    }

    pub fn observers_mut(&mut self) -> &mut ObserverList {
        &mut self.observers
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Main entry point: feeds a byte chunk from the transport (§4.1, §5).
    /// Calls must be serialized by the caller; there is no internal
    /// locking because the parser is single-threaded cooperative.
    pub fn feed(&mut self, bytes: &[u8]) {
        let span = span!(Level::TRACE, "feed", bytes = bytes.len());
        let _enter = span.enter();

        let lines = self.assembler.feed(bytes);
        for line in lines {
            self.handle_complete_line(line);
        }
        self.handle_prompt();
    }

    /// Flushes any trailing partial line and completes a pending sector.
    /// Call when the underlying transport closes (§5 "Cancellation").
    pub fn finalize(&mut self) {
        if let Some(line) = self.assembler.finalize() {
            self.handle_complete_line(line);
        }
        if !self.display.context.sector_saved && self.display.context.current_sector_index.is_some() {
            self.complete_sector();
        }
    }

    fn handle_complete_line(&mut self, line: AssembledLine) {
        self.with_recovery("complete_line", move |session| {
            dispatch::dispatch_line(session, &line.text, &line.with_ansi);
        });
    }

    fn handle_prompt(&mut self) {
        let prompt = self.assembler.prompt().to_string();
        if prompt.is_empty() {
            return;
        }
        self.with_recovery("prompt", move |session| {
            dispatch::dispatch_prompt(session, &prompt);
        });
    }

    /// Explicit scoped error handler around each top-level handler call
    /// (§9: replaces "panic-for-control-flow" with a recoverable
    /// boundary). On panic: log, reset to the safe baseline (§7), and keep
    /// the parser running.
    fn with_recovery(&mut self, name: &'static str, f: impl FnOnce(&mut Self)) {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        if result.is_err() {
            error!(handler = name, "handler panicked; resetting parser state to baseline");
            self.discard_in_flight_trackers();
            self.display.reset_to_baseline();
        }
    }

    /// Discards any in-flight trackers without executing them, logging the
    /// discard (§4.2 invariant: "every transition that abandons an
    /// in-flight tracker logs the discard and discards it cleanly").
    pub(crate) fn discard_in_flight_trackers(&mut self) {
        if self.sector_tracker.take().is_some() {
            trace!("discarding in-flight sector tracker");
        }
        if self.port_tracker.take().is_some() {
            trace!("discarding in-flight port tracker");
        }
        if self.ships_tracker.take().is_some() {
            trace!("discarding in-flight ships tracker");
        }
        if self.traders_tracker.take().is_some() {
            trace!("discarding in-flight traders tracker");
        }
        if self.planets_tracker.take().is_some() {
            trace!("discarding in-flight planets tracker");
        }
        self.pending_trader = None;
    }

    pub(crate) fn ensure_sector_tracker(&mut self, sector: SectorIndex) -> &mut SectorTracker {
        if self.sector_tracker.as_ref().map(|t| t.sector_index()) != Some(sector) {
            self.sector_tracker = Some(SectorTracker::new(sector));
        }
        self.sector_tracker.as_mut().unwrap()
    }

    pub(crate) fn ensure_port_tracker(&mut self, sector: SectorIndex) -> &mut PortTracker {
        if self.port_tracker.as_ref().map(|t| t.sector_index()) != Some(sector) {
            self.port_tracker = Some(PortTracker::new(sector));
        }
        self.port_tracker.as_mut().unwrap()
    }

    pub(crate) fn ensure_ships_tracker(&mut self, sector: SectorIndex) -> &mut ShipsTracker {
        self.ships_tracker.get_or_insert_with(|| ShipsTracker::new(sector))
    }

    pub(crate) fn ensure_traders_tracker(&mut self, sector: SectorIndex) -> &mut TradersTracker {
        self.traders_tracker.get_or_insert_with(|| TradersTracker::new(sector))
    }

    pub(crate) fn ensure_planets_tracker(&mut self, sector: SectorIndex) -> &mut PlanetsTracker {
        self.planets_tracker.get_or_insert_with(|| PlanetsTracker::new(sector))
    }

    /// Flushes a trader accumulated without an explicit ship-line (§4.4.1:
    /// "A pending trader without ship-line detail is flushed when a new
    /// sector starts or the section ends").
    pub(crate) fn flush_pending_trader(&mut self, sector: SectorIndex) {
        if let Some(trader) = self.pending_trader.take() {
            self.ensure_traders_tracker(sector).push_trader(trader);
        }
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        if self.messages.len() >= self.config.max_message_history {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub(crate) fn set_pending_message(&mut self, pending: PendingMessage) {
        self.display.context.current_message = Some(pending);
    }

    /// Completes the sector currently being parsed: executes every
    /// in-flight tracker, fires the corresponding UI/observer/event-bus
    /// notifications from fresh reads, and resets sector-scoped state
    /// (§4.2, §4.5, §4.6).
    pub(crate) fn complete_sector(&mut self) {
        let Some(sector) = self.display.context.current_sector_index else {
            return;
        };

        self.flush_pending_trader(sector);

        let mut sector_changed = false;
        if let Some(tracker) = self.sector_tracker.take() {
            match tracker.execute(&self.store.conn) {
                Ok(true) => sector_changed = true,
                Ok(false) => {}
                Err(e) => log_store_failure("sector tracker", &e),
            }
        }
        if let Some(tracker) = self.port_tracker.take() {
            match tracker.execute(&self.store.conn) {
                Ok(true) => self.notify_port_updated(sector),
                Ok(false) => {}
                Err(e) => log_store_failure("port tracker", &e),
            }
        }
        if let Some(tracker) = self.ships_tracker.take() {
            let _ = tracker.execute(&mut self.store.conn);
        }
        if let Some(tracker) = self.traders_tracker.take() {
            match tracker.execute(&mut self.store.conn) {
                Ok(true) => self.notify_trader_data_updated(sector),
                Ok(false) => {}
                Err(e) => log_store_failure("traders tracker", &e),
            }
        }
        if let Some(tracker) = self.planets_tracker.take() {
            let _ = tracker.execute(&mut self.store.conn);
        }

        if sector_changed {
            self.notify_sector_updated(sector);
            if !self.display.context.suppresses_sector_changed(sector) {
                self.notify_current_sector_changed(sector);
            }
        }

        self.display.context.sector_saved = true;
        self.display.context.current_sector_index = None;
    }

    /// Executes and clears the sector/port trackers for one CIM row
    /// immediately (§4.4.4): a CIM dump touches many sectors in one screen,
    /// none of which is "the current sector" waiting on a prompt.
    pub(crate) fn complete_cim_row(&mut self, sector: SectorIndex) {
        if let Some(tracker) = self.sector_tracker.take() {
            match tracker.execute(&self.store.conn) {
                Ok(true) => self.notify_sector_updated(sector),
                Ok(false) => {}
                Err(e) => log_store_failure("cim sector row", &e),
            }
        }
        if let Some(tracker) = self.port_tracker.take() {
            match tracker.execute(&self.store.conn) {
                Ok(true) => self.notify_port_updated(sector),
                Ok(false) => {}
                Err(e) => log_store_failure("cim port row", &e),
            }
        }
    }

    pub(crate) fn notify_sector_updated(&mut self, sector: SectorIndex) {
        match self.store.load_sector(sector) {
            Ok(Some(row)) => {
                self.ui.on_sector_updated(&row);
                let event = Event::SectorUpdated {
                    sector,
                    timestamp_ms: crate::events::now_ms(),
                    source: "parser",
                };
                self.observers.notify(&event);
                self.bus.fire(&event);
            }
            Ok(None) => {}
            Err(e) => log_store_failure("fresh read: sector", &e),
        }
    }

    pub(crate) fn notify_current_sector_changed(&mut self, sector: SectorIndex) {
        match self.store.load_sector(sector) {
            Ok(Some(row)) => {
                self.ui.on_current_sector_changed(&row);
                let event = Event::CurrentSectorChanged {
                    sector,
                    timestamp_ms: crate::events::now_ms(),
                    source: "parser",
                };
                self.observers.notify(&event);
                self.bus.fire(&event);
            }
            Ok(None) => {}
            Err(e) => log_store_failure("fresh read: current sector", &e),
        }
    }

    pub(crate) fn notify_port_updated(&mut self, sector: SectorIndex) {
        match self.store.load_port(sector) {
            Ok(Some(row)) => {
                self.ui.on_port_updated(&row);
                let event = Event::PortUpdated {
                    sector,
                    timestamp_ms: crate::events::now_ms(),
                    source: "parser",
                };
                self.observers.notify(&event);
                self.bus.fire(&event);
            }
            Ok(None) => {}
            Err(e) => log_store_failure("fresh read: port", &e),
        }
    }

    pub(crate) fn notify_trader_data_updated(&mut self, sector: SectorIndex) {
        match self.store.load_traders(sector) {
            Ok(rows) => {
                self.ui.on_trader_data_updated(sector, &rows);
                let event = Event::TraderDataUpdated {
                    sector,
                    timestamp_ms: crate::events::now_ms(),
                    source: "parser",
                };
                self.observers.notify(&event);
                self.bus.fire(&event);
            }
            Err(e) => log_store_failure("fresh read: traders", &e),
        }
    }

    pub(crate) fn flush_player_stats(&mut self) {
        let tracker = std::mem::replace(&mut self.player_stats_tracker, PlayerStatsTracker::new());
        match tracker.execute(&self.store.conn) {
            Ok(true) => match self.store.load_player_stats() {
                Ok(Some(row)) => {
                    self.ui.on_player_stats_updated(&row);
                    let event = Event::PlayerStatsUpdated {
                        timestamp_ms: crate::events::now_ms(),
                        source: "parser",
                    };
                    self.observers.notify(&event);
                    self.bus.fire(&event);
                }
                Ok(None) => {}
                Err(e) => log_store_failure("fresh read: player stats", &e),
            },
            Ok(false) => {}
            Err(e) => log_store_failure("player stats tracker", &e),
        }
    }

    pub(crate) fn fire_message_received(&mut self, message: Message) {
        self.push_message(message.clone());
        let event = Event::MessageReceived {
            message,
            timestamp_ms: crate::events::now_ms(),
            source: "parser",
        };
        self.observers.notify(&event);
        self.bus.fire(&event);
    }

    pub(crate) fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// "Citadel treasury contains" (§B): the planet list for this sector
    /// was almost always already parsed earlier in the same screen, so the
    /// record usually still lives in the in-flight tracker. Fall back to a
    /// direct UPDATE for the rarer case where it was already persisted on a
    /// prior visit to the sector.
    pub(crate) fn mark_planet_citadel(&mut self, sector: SectorIndex, owner: &str) {
        if let Some(tracker) = self.planets_tracker.as_mut() {
            tracker.mark_citadel(owner);
        }
        let _ = self.store.conn.execute(
            "UPDATE planets SET citadel = 1 WHERE sector_index = ?1 AND owner = ?2",
            (sector.raw(), owner),
        );
    }
}
