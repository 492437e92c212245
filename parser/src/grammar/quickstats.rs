//! Quick-stats status bar parser (§4.4.7): `key value│key value│…`.

use crate::events::UiCallbacks;
use crate::fields::{parse_int_commas, parse_int_with_suffix};
use crate::session::Parser;

pub fn is_bar_line(text: &str) -> bool {
    text.contains('│')
}

/// One bar line (there may be several before the session ends); a blank
/// line or command prompt ends the session and flushes the tracker.
pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    if is_bar_line(text) {
        session.quickstats_active = true;
        for segment in text.split('│') {
            apply_segment(session, segment.trim());
        }
        return;
    }
    if session.quickstats_active && text.trim().is_empty() {
        end_session(session);
    }
}

/// Called by the dispatcher when a command prompt is seen while a
/// quick-stats session is open.
pub fn end_session<U: UiCallbacks>(session: &mut Parser<U>) {
    if session.quickstats_active {
        session.quickstats_active = false;
        session.flush_player_stats();
    }
}

fn int_field(rest: &[&str]) -> Option<i64> {
    rest.first().and_then(|tok| parse_int_commas("quickstats_field", tok))
}

fn apply_segment<U: UiCallbacks>(session: &mut Parser<U>, segment: &str) {
    let mut tokens = segment.split_whitespace();
    let Some(key) = tokens.next() else { return };
    let rest: Vec<&str> = tokens.collect();
    let tracker = &mut session.player_stats_tracker;

    match key {
        "Sect" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_current_sector(v);
            }
        }
        "Turns" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_turns(v);
            }
        }
        "Creds" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_credits(v);
            }
        }
        "Figs" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_fighters(v);
            }
        }
        "Shlds" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_shields(v);
            }
        }
        "Crbo" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_holds_empty(v);
            }
        }
        "Hlds" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_holds_total(v);
            }
        }
        "Ore" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_ore_holds(v);
            }
        }
        "Org" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_org_holds(v);
            }
        }
        "Equ" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_equip_holds(v);
            }
        }
        "Col" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_colonist_holds(v);
            }
        }
        "Phot" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_photon_torps(v);
            }
        }
        "Armd" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_armor_mines(v);
            }
        }
        "Lmpt" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_limpet_mines(v);
            }
        }
        "GTorp" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_genesis_torps(v);
            }
        }
        "Clks" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_cloaks(v);
            }
        }
        "Beacns" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_beacons(v);
            }
        }
        "AtmDt" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_atmos_detonators(v);
            }
        }
        "EPrb" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_ether_probes(v);
            }
        }
        "MDis" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_mine_deflectors(v);
            }
        }
        "Aln" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_alignment(v);
            }
        }
        "Exp" => {
            if let Some(v) = int_field(&rest) {
                tracker.set_experience(v);
            }
        }
        "Corp" => {
            if !rest.is_empty() {
                tracker.set_corp(rest.join(" "));
            }
        }
        "TWarp" => {
            let value = match rest.first() {
                Some(&"No") => Some(0),
                Some(tok) => parse_int_with_suffix("turbo_warp", tok),
                None => None,
            };
            if let Some(v) = value {
                tracker.set_turbo_warp(v);
            }
        }
        "PsPrb" => {
            tracker.set_psychic_probe(rest.first() == Some(&"Yes"));
        }
        "PlScn" => {
            tracker.set_planet_scanner(rest.first() == Some(&"Yes"));
        }
        "LRS" => {
            let value = match rest.first() {
                Some(&"None") => Some(0),
                Some(&"Dens") => Some(1),
                Some(&"Holo") => Some(2),
                _ => None,
            };
            if let Some(v) = value {
                tracker.set_long_range_scan(v);
            }
        }
        "Ship" => {
            if let Some(number) = int_field(&rest) {
                tracker.set_ship_number(number);
            }
            if rest.len() > 1 {
                tracker.set_ship_class(rest[1..].join(" "));
            }
        }
        _ => {}
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
    fn bar_line_populates_named_fields_and_skips_absent_ones() {
        let mut parser = new_parser();
        handle_line(
            &mut parser,
            " Sect 1234│Turns 150│Creds 50,000│Figs 1000│Ship 1 MerCru",
        );
        end_session(&mut parser);

        let row = parser.store().load_player_stats().unwrap().unwrap();
        assert_eq!(row.current_sector, Some(1234));
        assert_eq!(row.turns, Some(150));
        assert_eq!(row.credits, Some(50_000));
        assert_eq!(row.fighters, Some(1000));
        assert_eq!(row.ship_number, Some(1));
        assert_eq!(row.ship_class.as_deref(), Some("MerCru"));
        assert_eq!(row.shields, None);
    }
}
