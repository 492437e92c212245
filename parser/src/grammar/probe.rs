//! Probe trace parser (§3, §4.2, §4.6): `"Probe entering sector : N"`.
//!
//! A probe hop is not a player visit. It records a forward warp edge from
//! the last known sector to `N` and marks `N` as probe-discovered so the
//! next `OnCurrentSectorChanged` for it is suppressed, without ever
//! touching `current_sector_index` itself. Suppression lifts the moment a
//! normal command prompt is seen (`ParseContext::clear_probe_state_on_prompt`).

use tracing::trace;

use crate::events::UiCallbacks;
use crate::fields::{clamp_sector, parse_int_commas};
use crate::session::Parser;
use crate::trackers::SectorTracker;
use crate::types::SectorIndex;

const PREFIX: &str = "Probe entering sector : ";

pub fn is_entry(text: &str) -> bool {
    text.starts_with(PREFIX)
}

pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let rest = &text[PREFIX.len()..];
    let bound = session.config().sector_validation_bound;
    let Some(raw) = parse_int_commas("probe_sector", rest.trim()) else {
        return;
    };
    let dest = SectorIndex(clamp_sector("probe_sector", raw, bound));
    if dest.raw() == 0 {
        return;
    }

    if let Some(source) = session.display.context.last_warp.or(session.display.context.current_sector_index) {
        record_probe_warp(session, source, dest);
    }

    session.display.context.probe_mode = true;
    session.display.context.probe_discovered_sectors.insert(dest);
    session.display.context.last_warp = Some(dest);
}

/// Mirrors `sector::reverse_warp` but in the forward direction: the probe's
/// last known position gains a warp edge to the sector it just entered.
fn record_probe_warp<U: UiCallbacks>(session: &mut Parser<U>, source: SectorIndex, dest: SectorIndex) {
    let existing = session.store().load_sector(source).ok().flatten();
    let mut warps = existing.map(|r| r.warps).unwrap_or_default();
    if !warps.insert(dest) {
        return;
    }

    let mut tracker = SectorTracker::new(source);
    tracker.set_warps(&warps);
    match tracker.execute(&session.store().conn) {
        Ok(true) => {
            trace!(source = %source, dest = %dest, "probe warp recorded");
            session.notify_sector_updated(source);
        }
        Ok(false) => {}
        Err(e) => crate::events::log_store_failure("probe warp", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::events::UiCallbacks as _;
    use crate::store::Store;

    #[derive(Default)]
    struct NoopUi;
    impl UiCallbacks for NoopUi {}

    fn new_parser() -> Parser<NoopUi> {
        Parser::new(ParserConfig::default(), Store::open_in_memory().unwrap(), NoopUi)
    }

    #[test]
    fn first_hop_with_known_last_warp_records_edge_and_suppresses() {
        let mut parser = new_parser();
        parser.display.context.last_warp = Some(SectorIndex(500));

        assert!(is_entry("Probe entering sector : 510"));
        handle_line(&mut parser, "Probe entering sector : 510");

        let source = parser.store().load_sector(SectorIndex(500)).unwrap().unwrap();
        assert!(source.warps.as_slice().contains(&SectorIndex(510)));
        assert!(parser.display.context.suppresses_sector_changed(SectorIndex(510)));
        assert_eq!(parser.display.context.last_warp, Some(SectorIndex(510)));
    }

    #[test]
    fn prompt_clears_suppression_for_later_real_visit() {
        let mut parser = new_parser();
        parser.display.context.last_warp = Some(SectorIndex(500));
        handle_line(&mut parser, "Probe entering sector : 510");
        assert!(parser.display.context.suppresses_sector_changed(SectorIndex(510)));

        parser.display.context.clear_probe_state_on_prompt();
        assert!(!parser.display.context.suppresses_sector_changed(SectorIndex(510)));
    }

    #[test]
    fn first_hop_with_no_known_position_only_marks_discovered() {
        let mut parser = new_parser();
        handle_line(&mut parser, "Probe entering sector : 200");
        assert!(parser.display.context.suppresses_sector_changed(SectorIndex(200)));
        assert_eq!(parser.display.context.last_warp, Some(SectorIndex(200)));
    }
}
