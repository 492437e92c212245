//! V-screen Stardock detection (§4.4.10). Position-anchored, not prefix
//! matched: the entry condition is checked by `dispatch` alongside the
//! other byte-offset anchors in §4.3.

use crate::events::UiCallbacks;
use crate::fields::bounded_substring;
use crate::session::Parser;
use crate::types::{ExplorationStatus, SectorIndex, STARDOCK_CLASS};

const NAME_COLUMN: std::ops::Range<usize> = 13..21;
const SECTOR_WORD_COLUMN: std::ops::Range<usize> = 36..46;
const STARDOCK_NAME: &str = "StarDock";
const STARDOCK_PORT_NAME: &str = "Stargate Alpha I";

/// `line[13:21] == "StarDock"` and `"sector"` occurs in `line[36:46]`.
pub fn is_entry(text: &str) -> bool {
    bounded_substring(text, NAME_COLUMN.start, NAME_COLUMN.end) == STARDOCK_NAME
        && bounded_substring(text, SECTOR_WORD_COLUMN.start, SECTOR_WORD_COLUMN.end).contains("sector")
}

fn extract_sector(text: &str, bound: u32) -> Option<SectorIndex> {
    let before_dot = text.rsplit_once('.')?.0;
    let token = before_dot.split_whitespace().last()?;
    let raw = crate::fields::parse_int_commas("stardock_sector", token)?;
    let clamped = crate::fields::clamp_sector("stardock_sector", raw, bound);
    (clamped != 0).then(|| SectorIndex(clamped))
}

/// Subsequent detections are ignored once `$STARDOCK` is persisted.
pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    if session
        .store()
        .script_variable("$STARDOCK")
        .ok()
        .flatten()
        .is_some()
    {
        return;
    }

    let bound = session.config().sector_validation_bound;
    let Some(sector) = extract_sector(text, bound) else {
        return;
    };

    session
        .ensure_sector_tracker(sector)
        .set_constellation("The Federation")
        .set_beacon("FedSpace, FedLaw Enforced")
        .set_explored(ExplorationStatus::Calc);

    session
        .ensure_port_tracker(sector)
        .set_name(STARDOCK_PORT_NAME)
        .set_class(STARDOCK_CLASS);

    session.complete_cim_row(sector);
    session.stardock_sector = Some(sector);
    let _ = session.store().set_script_variable("$STARDOCK", &sector.raw().to_string());
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

    fn v_screen_line() -> String {
        let mut line = String::new();
        line.push_str(&" ".repeat(13));
        line.push_str("StarDock");
        line.push_str(&" ".repeat(28));
        line.push_str("is in sector 9999.");
        line
    }

    #[test]
    fn detects_and_persists_once() {
        let line = v_screen_line();
        assert!(is_entry(&line));

        let mut parser = new_parser();
        handle_line(&mut parser, &line);

        assert_eq!(parser.stardock_sector, Some(SectorIndex(9999)));
        let sector_row = parser.store().load_sector(SectorIndex(9999)).unwrap().unwrap();
        assert_eq!(sector_row.constellation.as_deref(), Some("The Federation"));
        let port_row = parser.store().load_port(SectorIndex(9999)).unwrap().unwrap();
        assert_eq!(port_row.name.as_deref(), Some(STARDOCK_PORT_NAME));
        assert_eq!(port_row.class_index, Some(9));
        assert_eq!(
            parser.store().script_variable("$STARDOCK").unwrap().as_deref(),
            Some("9999")
        );
    }

    #[test]
    fn second_detection_is_ignored() {
        let line = v_screen_line();
        let mut parser = new_parser();
        handle_line(&mut parser, &line);

        let other = {
            let mut s = String::new();
            s.push_str(&" ".repeat(13));
            s.push_str("StarDock");
            s.push_str(&" ".repeat(28));
            s.push_str("is in sector 1.");
            s
        };
        handle_line(&mut parser, &other);
        assert_eq!(parser.stardock_sector, Some(SectorIndex(9999)));
    }
}
