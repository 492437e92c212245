//! Pattern Dispatcher (C3, §4.3): the ordered registry that routes a
//! complete line, or a partial prompt candidate, to the right grammar
//! sub-parser. Two matching strategies coexist: prefix/substring matches
//! (most lines) and a position-anchored matcher for the handful of
//! screens that are only recognizable by byte offset (§4.3).

use crate::display::DisplayMode;
use crate::events::UiCallbacks;
use crate::grammar::{cim, citadel, density, figscan, info, port, probe, quickstats, sector, stardock, transmission};
use crate::session::Parser;
use crate::types::SectorIndex;

/// Prompts that complete the in-flight sector and drop display state back
/// to `None` (§4.2). Two of them (`Probe entering sector`, `Citadel
/// treasury contains`) also carry their own side effect, handled before
/// the generic completion.
const COMPLETING_PROMPTS: &[&str] = &[
    "Command [TL=",
    "Computer command",
    "Probe entering sector",
    "Stop in this sector",
    "Engage the Autopilot?",
    citadel::PROMPT,
];

/// Routes one complete line (terminated by CR) through the ordered
/// pattern registry (§4.3).
pub fn dispatch_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str, _with_ansi: &str) {
    // A pending transmission body takes priority over everything else:
    // whatever this line says, it's consumed as message content.
    if session.display.context.current_message.is_some() {
        transmission::handle_body_line(session, text);
        return;
    }

    // Sector-start patterns are registered ahead of the CIM `": "` pattern
    // so `"Sector  : …"` is never mis-routed (§4.3).
    if sector::is_header(text) {
        sector::handle_line(session, text);
        return;
    }

    if citadel::is_entry(text) {
        if let Some(sector) = current_sector_for_interrupt(session) {
            citadel::handle_line(session, sector, text);
        }
        finish_current_screen(session);
        return;
    }

    if probe::is_entry(text) {
        // Records the probe hop and marks the destination suppressed; the
        // suppression itself outlives this screen reset and only lifts on
        // a genuine command prompt (`dispatch_prompt`), not here.
        probe::handle_line(session, text);
        finish_current_screen(session);
        return;
    }

    if stardock::is_entry(text) {
        stardock::handle_line(session, text);
        return;
    }

    if density::is_entry(text) {
        // A pure mode switch; the line that carries it is never itself a
        // data row (§4.2).
        density::handle_entry(session, text);
        return;
    }

    if transmission::is_entry(text) {
        transmission::handle_entry(session, text);
        return;
    }

    if cim::is_entry(text) {
        cim::handle_entry(session, text);
        return;
    }

    if quickstats::is_bar_line(text) {
        quickstats::handle_line(session, text);
        return;
    }

    if info::is_entry(text) {
        info::handle_entry(session, text);
        return;
    }

    if figscan::is_row(text) {
        figscan::handle_line(session, text);
        return;
    }

    if port::is_trigger(text) {
        enter_port_mode(session);
        port::handle_line(session, text);
        return;
    }

    match session.display.mode {
        DisplayMode::Sector => sector::handle_line(session, text),
        DisplayMode::Density => density::handle_line(session, text),
        DisplayMode::Cim | DisplayMode::PortCim | DisplayMode::WarpCim => route_cim_row(session, text),
        DisplayMode::Port | DisplayMode::PortCr => port::handle_line(session, text),
        DisplayMode::FigScan => figscan::handle_line(session, text),
        DisplayMode::WarpLane | DisplayMode::None => {
            if session.quickstats_active {
                quickstats::handle_line(session, text);
            } else if session.info_active {
                info::handle_line(session, text);
            }
        }
    }
}

/// Routes a trailing partial line (no CR yet) seen while the assembler is
/// waiting for more input (§4.1, §4.3): typically a command prompt, but
/// handlers may short-circuit based on whether a sector is already saved.
pub fn dispatch_prompt<U: UiCallbacks>(session: &mut Parser<U>, prompt: &str) {
    // Defensive fallback: these normally arrive as complete lines through
    // `dispatch_line`, but a transport without a trailing CR could still
    // surface one here.
    if citadel::is_entry(prompt) {
        if let Some(sector) = current_sector_for_interrupt(session) {
            citadel::handle_line(session, sector, prompt);
        }
    } else if probe::is_entry(prompt) {
        probe::handle_line(session, prompt);
    }

    if COMPLETING_PROMPTS.iter().any(|pattern| prompt.contains(pattern)) {
        finish_current_screen(session);
    }

    // A genuine command prompt always clears probe suppression (§4.6),
    // independent of whether this prompt also matched a completing
    // pattern above.
    session.display.context.clear_probe_state_on_prompt();

    maybe_version_script_event(session, prompt);
}

/// Finishes any in-flight sector/port bookkeeping and returns the display
/// state to its baseline (§4.2). Also ends any open quick-stats or info
/// session. Does not touch probe suppression state — that only clears on
/// a genuine command prompt (`dispatch_prompt`).
fn finish_current_screen<U: UiCallbacks>(session: &mut Parser<U>) {
    if session.display.context.current_sector_index.is_some() {
        session.complete_sector();
    } else {
        flush_orphan_port_tracker(session);
    }
    quickstats::end_session(session);
    if session.info_active {
        session.info_active = false;
        session.flush_player_stats();
    }
    session.display.transition(DisplayMode::None);
}

/// A port screen can close without a sector ever having been opened in
/// this stream (e.g. the session was attached mid-trade). `complete_sector`
/// is a no-op in that case, so flush the port tracker directly.
fn flush_orphan_port_tracker<U: UiCallbacks>(session: &mut Parser<U>) {
    let Some(tracker) = session.port_tracker.take() else {
        return;
    };
    let sector = tracker.sector_index();
    match tracker.execute(&session.store().conn) {
        Ok(true) => session.notify_port_updated(sector),
        Ok(false) => {}
        Err(e) => crate::events::log_store_failure("orphan port tracker", &e),
    }
}

fn current_sector_for_interrupt<U: UiCallbacks>(session: &Parser<U>) -> Option<SectorIndex> {
    session
        .display
        .context
        .port_sector_index
        .or(session.display.context.current_sector_index)
}

fn enter_port_mode<U: UiCallbacks>(session: &mut Parser<U>) {
    if !matches!(session.display.mode, DisplayMode::Port | DisplayMode::PortCr) {
        session.display.transition(DisplayMode::Port);
    }
}

/// Updates the cosmetic `PortCim`/`WarpCim` sub-mode before delegating row
/// parsing to `cim::handle_line`, which already branches on `%` itself
/// (§4.2: "the presence of `%` … identifies `PortCIM`; its absence
/// identifies `WarpCIM`").
fn route_cim_row<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let sub_mode = if text.contains('%') { DisplayMode::PortCim } else { DisplayMode::WarpCim };
    session.display.transition(sub_mode);
    cim::handle_line(session, text);
}

/// Open Question (§9): "keep the hook but gate it on a script engine being
/// attached." No script engine ships with the parser itself, so this only
/// fires the ordinary event bus — a no-op in practice unless something
/// subscribes to it.
fn maybe_version_script_event<U: UiCallbacks>(session: &mut Parser<U>, prompt: &str) {
    const VERSION_PROMPT: &str = "Selection (? for menu):";
    if prompt.contains(VERSION_PROMPT) {
        tracing::trace!("version-detection prompt seen; no script engine attached");
        let _ = session;
    }
}
