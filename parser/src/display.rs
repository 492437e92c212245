//! Display State Machine (C2, §4.2) and `ParseContext` (§3).

use std::collections::HashSet;

use tracing::debug;

use crate::types::SectorIndex;

/// The parser's current belief about what kind of screen the server is
/// emitting (§3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DisplayMode {
    None,
    Sector,
    Density,
    WarpLane,
    Cim,
    PortCim,
    PortCr,
    Port,
    WarpCim,
    FigScan,
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::None
    }
}

/// Sub-state while `DisplayMode::Sector` is active (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SectorPosition {
    Normal,
    Ports,
    Planets,
    Ships,
    Mines,
    Traders,
}

impl Default for SectorPosition {
    fn default() -> Self {
        SectorPosition::Normal
    }
}

/// Scratch state threaded through one parse session (§3 ParseContext).
#[derive(Debug, Default)]
pub struct ParseContext {
    pub current_sector_index: Option<SectorIndex>,
    pub port_sector_index: Option<SectorIndex>,
    pub current_trading_commodity: Option<crate::types::Commodity>,
    pub last_warp: Option<SectorIndex>,
    pub probe_mode: bool,
    pub probe_discovered_sectors: HashSet<SectorIndex>,
    pub sector_saved: bool,
    /// Non-empty means the next non-empty line is a message continuation
    /// (§3, §4.4.9).
    pub current_message: Option<PendingMessage>,
}

#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub kind: crate::types::MessageKind,
    pub sender: Option<String>,
    pub channel: Option<u32>,
}

impl ParseContext {
    pub fn enter_sector(&mut self, sector: SectorIndex) {
        self.current_sector_index = Some(sector);
        self.sector_saved = false;
    }

    /// Clears probe suppression state on reaching a normal command prompt
    /// (§4.6 suppression rules).
    pub fn clear_probe_state_on_prompt(&mut self) {
        if self.probe_mode {
            debug!("clearing probe mode on command prompt");
        }
        self.probe_mode = false;
        self.probe_discovered_sectors.clear();
    }

    /// Whether `OnCurrentSectorChanged` should be suppressed for `sector`
    /// (§4.6): suppressed while probing, or if this sector was only seen
    /// via a probe trace.
    pub fn suppresses_sector_changed(&self, sector: SectorIndex) -> bool {
        self.probe_mode || self.probe_discovered_sectors.contains(&sector)
    }
}

/// The combined C2 state: current display mode, sector sub-state, and
/// scratch parse context.
#[derive(Debug, Default)]
pub struct DisplayState {
    pub mode: DisplayMode,
    pub sector_position: SectorPosition,
    pub context: ParseContext,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions to `mode`, logging the change. Does not itself complete
    /// any in-flight sector — that's the caller's responsibility so it can
    /// run tracker `Execute`s first (§4.2: "Entering a new sector while one
    /// is unsaved first completes the previous sector").
    pub fn transition(&mut self, mode: DisplayMode) {
        if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "display mode transition");
        }
        self.mode = mode;
        if mode != DisplayMode::Sector {
            self.sector_position = SectorPosition::Normal;
        }
    }

    /// Resets to the safe baseline used by both normal sector-completion
    /// and the panic-recovery handler (§7, §9): `currentDisplay=None`,
    /// `sectorPosition=Normal`, current sector discarded.
    pub fn reset_to_baseline(&mut self) {
        self.mode = DisplayMode::None;
        self.sector_position = SectorPosition::Normal;
        self.context.current_sector_index = None;
        self.context.sector_saved = false;
    }
}
