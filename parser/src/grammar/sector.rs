//! Sector screen parser (§4.4.1) and reverse-warp bookkeeping (§4.4.2).

use tracing::trace;

use crate::display::DisplayMode;
use crate::events::UiCallbacks;
use crate::fields::{clamp_sector, parse_int_commas, parse_int_with_suffix, parse_percent};
use crate::session::Parser;
use crate::trackers::{PlanetRecord, ShipRecord, TraderRecord};
use crate::types::{derive_port_class, ExplorationStatus, SectorIndex};

use super::warps::parse_warp_list;

const HEADER_PREFIX: &str = "Sector  : ";

pub fn is_header(text: &str) -> bool {
    text.starts_with(HEADER_PREFIX)
}

/// Entry point for `Sector  : <N> in <constellation>` (§4.2, §4.4.1).
/// Completes any previously unsaved sector first (§4.2: "Entering a new
/// sector while one is unsaved first completes the previous sector").
pub fn handle_header<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    if session.display.context.current_sector_index.is_some() && !session.display.context.sector_saved {
        session.complete_sector();
    }

    let rest = &text[HEADER_PREFIX.len()..];
    let mut split = rest.splitn(2, " in ");
    let sector_part = split.next().unwrap_or("").trim();
    let constellation = split.next().map(|s| s.trim().trim_end_matches('.').to_string());

    let Some(raw) = parse_int_commas("sector", sector_part) else {
        return;
    };
    let bound = session.config().sector_validation_bound;
    let sector = SectorIndex(clamp_sector("sector", raw, bound));
    if sector.raw() == 0 {
        return;
    }

    session.display.transition(DisplayMode::Sector);
    session.display.context.enter_sector(sector);

    let tracker = session.ensure_sector_tracker(sector);
    if let Some(constellation) = constellation {
        tracker.set_constellation(constellation);
    }
    // A sector screen is an actual visit, the strongest exploration level.
    tracker.set_explored(ExplorationStatus::Holo);
}

/// Routes every other line seen while `DisplayMode::Sector` is active.
pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    if is_header(text) {
        handle_header(session, text);
        return;
    }
    let Some(sector) = session.display.context.current_sector_index else {
        return;
    };

    if let Some(rest) = text.strip_prefix("Beacon  : ") {
        session.ensure_sector_tracker(sector).set_beacon(rest.trim());
        return;
    }
    if let Some(rest) = text.strip_prefix("NavHaz  : ") {
        let pct = parse_percent("nav_haz", rest.trim());
        session.ensure_sector_tracker(sector).set_nav_haz(pct);
        return;
    }
    if let Some(rest) = text.strip_prefix("Warps to Sector(s) : ") {
        handle_warps(session, sector, rest);
        return;
    }
    if let Some(rest) = text.strip_prefix("Ports   : ") {
        use crate::display::SectorPosition;
        session.display.sector_position = SectorPosition::Ports;
        handle_port_line(session, sector, rest);
        return;
    }
    if let Some(rest) = text.strip_prefix("Planets : ") {
        use crate::display::SectorPosition;
        session.display.sector_position = SectorPosition::Planets;
        handle_planet_line(session, sector, rest);
        return;
    }
    if let Some(rest) = text.strip_prefix("Traders : ") {
        use crate::display::SectorPosition;
        session.display.sector_position = SectorPosition::Traders;
        handle_trader_line(session, sector, rest);
        return;
    }
    if let Some(rest) = text.strip_prefix("Ships   : ") {
        use crate::display::SectorPosition;
        session.display.sector_position = SectorPosition::Ships;
        handle_ship_line(session, sector, rest);
        return;
    }
    if text.starts_with("Mines   : ") {
        use crate::display::SectorPosition;
        session.display.sector_position = SectorPosition::Mines;
        return;
    }
    if text.starts_with("Fighters: ") {
        return;
    }

    if let Some(rest) = text.strip_prefix("        ") {
        handle_continuation(session, sector, rest);
    }
}

fn handle_continuation<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex, rest: &str) {
    use crate::display::SectorPosition;
    match session.display.sector_position {
        SectorPosition::Ports => handle_port_line(session, sector, rest),
        SectorPosition::Planets => handle_planet_line(session, sector, rest),
        SectorPosition::Traders => handle_trader_line(session, sector, rest),
        SectorPosition::Ships => handle_ship_line(session, sector, rest),
        SectorPosition::Mines | SectorPosition::Normal => {}
    }
}

fn handle_warps<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex, rest: &str) {
    let bound = session.config().sector_validation_bound;
    let warps = parse_warp_list(rest, bound);
    session.ensure_sector_tracker(sector).set_warps(&warps);

    let destinations: Vec<SectorIndex> = warps.as_slice().to_vec();
    for dest in destinations {
        reverse_warp(session, dest, sector);
    }
}

/// Mirrors a newly-discovered warp back onto its destination (§4.4.2):
/// sorted-insert into the destination's warp list, and bump `None` to
/// `Calc` (never downgrading an already-explored sector).
fn reverse_warp<U: UiCallbacks>(session: &mut Parser<U>, dest: SectorIndex, source: SectorIndex) {
    let existing = session.store().load_sector(dest).ok().flatten();
    let mut warps = existing.as_ref().map(|r| r.warps.clone()).unwrap_or_default();
    let status = existing
        .as_ref()
        .map(|r| ExplorationStatus::from_db_value(r.explored))
        .unwrap_or(ExplorationStatus::None);

    let changed = warps.insert(source);

    let mut tracker = crate::trackers::SectorTracker::new(dest);
    if changed {
        tracker.set_warps(&warps);
    }
    if status == ExplorationStatus::None {
        tracker.set_explored(ExplorationStatus::Calc);
    }
    if tracker.is_empty() {
        return;
    }
    match tracker.execute(&session.store().conn) {
        Ok(true) => {
            trace!(dest = %dest, source = %source, "reverse warp recorded");
            session.notify_sector_updated(dest);
        }
        Ok(false) => {}
        Err(e) => crate::events::log_store_failure("reverse warp", &e),
    }
}

/// Parses `"<name>, Class <d> <BSB-triple> [<=-DANGER-=>]"` (§4.4.1).
/// The digit and the derived triple are cross-checked only informally here
/// (no literal byte-offset capture transcript survives to pin the exact
/// column rule); the triple is authoritative since §4.4 states class is
/// *derived* from it.
fn handle_port_line<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex, rest: &str) {
    let dead = rest.contains("<=-DANGER-=>");
    let Some(idx) = rest.find(", Class ") else {
        return;
    };
    let name = rest[..idx].trim();
    if name.is_empty() {
        return;
    }
    let after = &rest[idx + ", Class ".len()..];
    let mut tokens = after.split_whitespace();
    tokens.next(); // class digit, superseded by the derived triple below
    let triple = tokens.next().unwrap_or("").replace(['(', ')'], "");
    let mut chars = triple.chars();
    let ore_buying = chars.next() == Some('B');
    let org_buying = chars.next() == Some('B');
    let equip_buying = chars.next() == Some('B');

    session.display.context.port_sector_index = Some(sector);
    let tracker = session.ensure_port_tracker(sector);
    tracker.set_name(name);
    tracker.set_dead(dead);
    if triple.len() == 3 {
        tracker.set_class(derive_port_class(ore_buying, org_buying, equip_buying));
    }
}

/// Planet lines carry no literal grammar beyond "switch sub-state and
/// parse accordingly"; this treats each non-empty line as one planet's
/// display name plus an optional trailing `Fighters: N` field.
fn handle_planet_line<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex, rest: &str) {
    let rest = rest.trim();
    if rest.is_empty() {
        return;
    }
    let (name, fighters) = split_trailing_fighters(rest);
    let owner = extract_owner(rest);
    let planet = PlanetRecord {
        name: name.to_string(),
        owner,
        fighters,
        citadel: false,
        stardock: false,
    };
    session.ensure_planets_tracker(sector).push_planet(planet);
}

fn handle_trader_line<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex, rest: &str) {
    let rest = rest.trim();
    if rest.is_empty() {
        return;
    }
    session.flush_pending_trader(sector);
    let (name, fighters) = split_trailing_fighters(rest);
    let ship_type = extract_ship_type(rest);
    session.ensure_traders_tracker(sector).push_trader(TraderRecord {
        name: name.to_string(),
        ship_type,
        ship_name: String::new(),
        fighters,
    });
}

fn handle_ship_line<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex, rest: &str) {
    let rest = rest.trim();
    if rest.is_empty() {
        return;
    }
    let (name, fighters) = split_trailing_fighters(rest);
    let owner = extract_owner(rest);
    let ship_type = extract_ship_type(rest);
    session.ensure_ships_tracker(sector).push_ship(ShipRecord {
        name: name.to_string(),
        owner,
        ship_type,
        fighters,
    });
}

fn split_trailing_fighters(line: &str) -> (&str, i64) {
    if let Some(idx) = line.find("w/") {
        let name = line[..idx].trim_end_matches(',').trim();
        let tail = &line[idx + 2..];
        let qty = tail
            .split_whitespace()
            .next()
            .and_then(|tok| parse_int_with_suffix("fighters", tok))
            .unwrap_or(0);
        return (name, qty);
    }
    (line.trim_end_matches(','), 0)
}

fn extract_owner(line: &str) -> String {
    if let Some(idx) = line.find("Owned by ") {
        let tail = &line[idx + "Owned by ".len()..];
        let owner = tail.split(',').next().unwrap_or("").trim();
        return owner.to_string();
    }
    "nobody's".to_string()
}

fn extract_ship_type(line: &str) -> String {
    for part in line.split(',') {
        let part = part.trim();
        if part.starts_with("a ") || part.starts_with("an ") {
            return part.trim_start_matches("a ").trim_start_matches("an ").to_string();
        }
    }
    "Unknown".to_string()
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
    fn header_sets_holo_and_constellation() {
        let mut parser = new_parser();
        handle_header(&mut parser, "Sector  : 1234 in Test System.");
        assert_eq!(
            parser.display.context.current_sector_index,
            Some(SectorIndex(1234))
        );
        parser.complete_sector();
        let row = parser.store().load_sector(SectorIndex(1234)).unwrap().unwrap();
        assert_eq!(row.constellation.as_deref(), Some("Test System"));
        assert_eq!(row.explored, ExplorationStatus::Holo.as_db_value());
    }

    #[test]
    fn port_line_derives_class_and_dead_flag() {
        let mut parser = new_parser();
        handle_header(&mut parser, "Sector  : 1 in Sol.");
        handle_line(&mut parser, "Ports   : Sol Trading Post, Class 1 BBS <=-DANGER-=>");
        parser.complete_sector();
        let port = parser.store().load_port(SectorIndex(1)).unwrap().unwrap();
        assert_eq!(port.name.as_deref(), Some("Sol Trading Post"));
        assert_eq!(port.class_index, Some(1));
        assert!(port.dead);
    }

    #[test]
    fn port_line_derives_class_from_parenthesized_triple() {
        let mut parser = new_parser();
        handle_header(&mut parser, "Sector  : 2 in Sol.");
        handle_line(&mut parser, "Ports   : Trading Post, Class 2 (BSB)");
        parser.complete_sector();
        let port = parser.store().load_port(SectorIndex(2)).unwrap().unwrap();
        assert_eq!(port.class_index, Some(2)); // BSB
    }

    #[test]
    fn warps_update_both_directions() {
        let mut parser = new_parser();
        handle_header(&mut parser, "Sector  : 1234 in Test System.");
        handle_line(&mut parser, "NavHaz  : 15%");
        handle_line(&mut parser, "Warps to Sector(s) :  (2) - 3");
        parser.complete_sector();

        let sector = parser.store().load_sector(SectorIndex(1234)).unwrap().unwrap();
        assert_eq!(sector.nav_haz, Some(15));
        assert_eq!(sector.warps.as_slice(), &[SectorIndex(2), SectorIndex(3)]);
        assert_eq!(sector.explored, ExplorationStatus::Holo.as_db_value());

        let dest2 = parser.store().load_sector(SectorIndex(2)).unwrap().unwrap();
        assert!(dest2.warps.as_slice().contains(&SectorIndex(1234)));
        assert_eq!(dest2.explored, ExplorationStatus::Calc.as_db_value());
    }
}
