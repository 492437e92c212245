//! Citadel treasury prompt (§4.2/§B supplement). Not given a dedicated
//! §4.4 subsection in the distilled spec, but named in the component
//! table; marks the owner's planet citadel flag before the generic
//! sector-completing prompt handling takes over.

use crate::events::UiCallbacks;
use crate::session::Parser;
use crate::types::SectorIndex;

pub const PROMPT: &str = "Citadel treasury contains";

pub fn is_entry(text: &str) -> bool {
    text.contains(PROMPT)
}

const OWNER: &str = "yours";

pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex, _text: &str) {
    session.mark_planet_citadel(sector, OWNER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::events::UiCallbacks as _;
    use crate::store::Store;
    use crate::trackers::PlanetRecord;

    #[derive(Default)]
    struct NoopUi;
    impl UiCallbacks for NoopUi {}

    fn new_parser() -> Parser<NoopUi> {
        Parser::new(ParserConfig::default(), Store::open_in_memory().unwrap(), NoopUi)
    }

    #[test]
    fn marks_in_flight_planet_record() {
        let mut parser = new_parser();
        let sector = SectorIndex(500);
        parser.ensure_planets_tracker(sector).push_planet(PlanetRecord {
            name: "Homeworld".into(),
            owner: "yours".into(),
            fighters: 0,
            citadel: false,
            stardock: false,
        });

        handle_line(&mut parser, sector, "Citadel treasury contains 10,000 credits.");

        let tracker = parser.planets_tracker.take().unwrap();
        tracker.execute(&mut parser.store.conn).unwrap();
        let citadel: bool = parser
            .store()
            .conn
            .query_row(
                "SELECT citadel FROM planets WHERE sector_index = 500",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(citadel);
    }

    #[test]
    fn marks_already_persisted_planet() {
        let mut parser = new_parser();
        let sector = SectorIndex(501);
        parser
            .store()
            .conn
            .execute(
                "INSERT INTO planets (sector_index, name, owner, fighters, citadel, stardock) \
                 VALUES (501, 'Homeworld', 'yours', 0, 0, 0)",
                [],
            )
            .unwrap();

        handle_line(&mut parser, sector, "Citadel treasury contains 10,000 credits.");

        let citadel: bool = parser
            .store()
            .conn
            .query_row(
                "SELECT citadel FROM planets WHERE sector_index = 501",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(citadel);
    }
}
