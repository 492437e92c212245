//! Density scanner parser (§4.4.5).

use crate::events::UiCallbacks;
use crate::fields::{clamp_sector, parse_int_commas, parse_percent, positional_params};
use crate::session::Parser;
use crate::types::{ExplorationStatus, SectorIndex};

const HEADER_COLUMN: usize = 27;
const HEADER_TEXT: &str = "Relative Density";

/// `Relative Density` at byte offset 27 (§4.2, §4.3): a pure mode switch,
/// the line that carries it is never itself treated as a data row.
pub fn is_entry(text: &str) -> bool {
    crate::fields::bounded_substring(text, HEADER_COLUMN, HEADER_COLUMN + HEADER_TEXT.len()) == HEADER_TEXT
}

pub fn handle_entry<U: UiCallbacks>(session: &mut Parser<U>, _text: &str) {
    use crate::display::DisplayMode;
    session.display.transition(DisplayMode::Density);
}

fn field_after<'a>(params: &[&'a str], keyword: &str) -> Option<&'a str> {
    let pos = params.iter().position(|p| *p == keyword)?;
    params.get(pos + 1).copied()
}

/// `"Sector  NNNN  ==>   D  Density: X, NavHaz: Y%, Warps: Z, Anomaly: Yes/No"`.
/// Fields are located by the keyword that precedes them rather than a
/// literal column offset, since the exact spacing of this line did not
/// survive into any retrievable reference transcript.
pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let params = positional_params(text);
    let Some(sector_tok) = params.get(1).copied() else { return };
    let Some(raw_sector) = parse_int_commas("density_sector", sector_tok) else {
        return;
    };
    let bound = session.config().sector_validation_bound;
    let sector = SectorIndex(clamp_sector("density_sector", raw_sector, bound));
    if sector.raw() == 0 {
        return;
    }

    let density = field_after(&params, "Density:")
        .and_then(|t| parse_int_commas("density", t.trim_end_matches(',')));
    let nav_haz = field_after(&params, "NavHaz:").map(|t| parse_percent("nav_haz", t.trim_end_matches(',')));
    let anomaly = field_after(&params, "Anomaly:").map(|t| t.trim_end_matches(',').eq_ignore_ascii_case("Yes"));

    let tracker = session.ensure_sector_tracker(sector);
    if let Some(density) = density {
        tracker.set_density(density);
    }
    if let Some(nav_haz) = nav_haz {
        tracker.set_nav_haz(nav_haz);
    }
    if let Some(anomaly) = anomaly {
        tracker.set_anomaly(anomaly);
    }

    let is_current = session.display.context.current_sector_index == Some(sector);
    if !is_current {
        let status = session
            .store()
            .load_sector(sector)
            .ok()
            .flatten()
            .map(|r| ExplorationStatus::from_db_value(r.explored))
            .unwrap_or(ExplorationStatus::None);
        if matches!(status, ExplorationStatus::None | ExplorationStatus::Calc) {
            let tracker = session.ensure_sector_tracker(sector);
            tracker.set_explored(ExplorationStatus::Density);
            tracker.set_constellation("??? (Density only)");
        }
        session.complete_cim_row(sector);
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
    fn other_sector_marked_density_only() {
        let mut parser = new_parser();
        handle_line(
            &mut parser,
            "Sector 1000 ( ) Density: 1500, NavHaz: 5%, Warps: 3, Anomaly: No",
        );
        let row = parser.store().load_sector(SectorIndex(1000)).unwrap().unwrap();
        assert_eq!(row.density, Some(1500));
        assert_eq!(row.nav_haz, Some(5));
        assert_eq!(row.anomaly, Some(false));
        assert_eq!(row.explored, ExplorationStatus::Density.as_db_value());
        assert_eq!(row.constellation.as_deref(), Some("??? (Density only)"));
    }

    #[test]
    fn previously_holo_sector_keeps_status() {
        let mut parser = new_parser();
        let mut tracker = crate::trackers::SectorTracker::new(SectorIndex(1000));
        tracker.set_explored(ExplorationStatus::Holo);
        tracker.execute(&parser.store().conn).unwrap();

        handle_line(
            &mut parser,
            "Sector 1000 ( ) Density: 1500, NavHaz: 5%, Warps: 3, Anomaly: No",
        );
        let row = parser.store().load_sector(SectorIndex(1000)).unwrap().unwrap();
        assert_eq!(row.density, Some(1500));
        assert_eq!(row.explored, ExplorationStatus::Holo.as_db_value());
    }
}
