//! End-to-end scenarios against an in-memory store, one per literal
//! input/output pair a proxy session is expected to produce, plus an
//! idempotence check. These feed bytes through the public `Parser` API
//! exactly as a proxy session would, rather than calling grammar
//! sub-parsers directly.

use std::sync::{Arc, Mutex};

use twist_parser::config::ParserConfig;
use twist_parser::events::UiCallbacks;
use twist_parser::store::{PlayerStatsRow, PortRow, SectorRow, Store, TraderRow};
use twist_parser::types::{ExplorationStatus, SectorIndex};
use twist_parser::Parser;

#[derive(Clone, Default)]
struct RecordingUi {
    current_sector_changes: Arc<Mutex<Vec<SectorIndex>>>,
    port_updates: Arc<Mutex<Vec<PortRow>>>,
}

impl UiCallbacks for RecordingUi {
    fn on_current_sector_changed(&mut self, sector: &SectorRow) {
        self.current_sector_changes.lock().unwrap().push(sector.sector_index);
    }

    fn on_port_updated(&mut self, port: &PortRow) {
        self.port_updates.lock().unwrap().push(port.clone());
    }

    fn on_player_stats_updated(&mut self, _stats: &PlayerStatsRow) {}
    fn on_sector_updated(&mut self, _sector: &SectorRow) {}
    fn on_trader_data_updated(&mut self, _sector: SectorIndex, _traders: &[TraderRow]) {}
}

fn new_parser() -> Parser<RecordingUi> {
    Parser::new(ParserConfig::default(), Store::open_in_memory().unwrap(), RecordingUi::default())
}

/// Builds a parser alongside the shared handles into its `RecordingUi`, so
/// the test can inspect fired events without any access into `Parser`'s
/// private fields.
fn new_parser_with_ui() -> (Parser<RecordingUi>, RecordingUi) {
    let ui = RecordingUi::default();
    let parser = Parser::new(ParserConfig::default(), Store::open_in_memory().unwrap(), ui.clone());
    (parser, ui)
}

/// Feeds each line through the parser a byte at a time, to prove the
/// outcome is independent of how the transport chunked the stream.
fn feed_lines<U: UiCallbacks>(parser: &mut Parser<U>, lines: &[&str]) {
    for line in lines {
        for byte in line.as_bytes() {
            parser.feed(&[*byte]);
        }
    }
}

#[test]
fn scenario_1_sector_with_navhaz_and_warps() {
    let mut parser = new_parser();
    feed_lines(
        &mut parser,
        &[
            "Sector  : 1234 in Test System\r",
            "NavHaz  : 15%\r",
            "Warps to Sector(s) :  (2) - 3\r",
            "Command [TL=00:00:00]:[1234] (?=Help)? : ",
        ],
    );

    let sector = parser.store().load_sector(SectorIndex(1234)).unwrap().unwrap();
    assert_eq!(sector.nav_haz, Some(15));
    assert_eq!(sector.warps.as_slice(), &[SectorIndex(2), SectorIndex(3)]);
    assert_eq!(sector.explored, ExplorationStatus::Holo.as_db_value());

    let reverse_a = parser.store().load_sector(SectorIndex(2)).unwrap().unwrap();
    assert!(reverse_a.warps.as_slice().contains(&SectorIndex(1234)));
    let reverse_b = parser.store().load_sector(SectorIndex(3)).unwrap().unwrap();
    assert!(reverse_b.warps.as_slice().contains(&SectorIndex(1234)));
}

#[test]
fn scenario_2_quick_stats_bar() {
    let mut parser = new_parser();
    feed_lines(&mut parser, &[" Sect 1234\u{2502}Turns 150\u{2502}Creds 50,000\u{2502}Figs 1000\u{2502}Ship 1 MerCru\r"]);

    let stats = parser.store().load_player_stats().unwrap().unwrap();
    assert_eq!(stats.turns, Some(150));
    assert_eq!(stats.credits, Some(50_000));
    assert_eq!(stats.fighters, Some(1000));
    assert_eq!(stats.ship_number, Some(1));
    assert_eq!(stats.ship_class.as_deref(), Some("MerCru"));
    assert_eq!(stats.current_sector, Some(1234));
    assert_eq!(stats.shields, None);
}

#[test]
fn scenario_3_port_commerce_exit_fires_port_updated_once() {
    let (mut parser, ui) = new_parser_with_ui();
    feed_lines(
        &mut parser,
        &[
            "Sector  : 77 in Test System\r",
            "Ports   : Trading Post, Class 2 (BSB)\r",
            "Command [TL=00:00:00]:[77] (?=Help)? : ",
        ],
    );
    ui.port_updates.lock().unwrap().clear();

    feed_lines(
        &mut parser,
        &[
            "Fuel Ore       Buying       1,000      50%\r",
            "Organics       Selling        500      40%\r",
            "Equipment      Buying        250      30%\r",
            "Command [TL=00:00:01]:[77] (?=Help)? : ",
        ],
    );

    let port = parser.store().load_port(SectorIndex(77)).unwrap().unwrap();
    assert!(port.ore_amount.is_some());
    assert!(port.org_amount.is_some());
    assert!(port.equip_amount.is_some());
    assert_eq!(port.class_index, Some(2)); // BSB
    assert_eq!(ui.port_updates.lock().unwrap().len(), 1);
}

#[test]
fn scenario_4_cim_warp_bulk_forces_calc_only_when_unknown() {
    let mut parser = new_parser();
    feed_lines(&mut parser, &[": Computer on-line.\r", "1234 5678 9012 0 0 0 0\r"]);

    let sector = parser.store().load_sector(SectorIndex(1234)).unwrap().unwrap();
    assert_eq!(sector.warps.as_slice(), &[SectorIndex(5678), SectorIndex(9012)]);
    assert_eq!(sector.explored, ExplorationStatus::Calc.as_db_value());
}

#[test]
fn scenario_4b_cim_never_downgrades_an_already_holo_sector() {
    let mut parser = new_parser();
    feed_lines(
        &mut parser,
        &["Sector  : 1234 in Test System\r", "Command [TL=00:00:00]:[1234] (?=Help)? : "],
    );
    feed_lines(&mut parser, &[": Computer on-line.\r", "1234 5678 9012 0 0 0 0\r"]);

    let sector = parser.store().load_sector(SectorIndex(1234)).unwrap().unwrap();
    assert_eq!(sector.explored, ExplorationStatus::Holo.as_db_value());
}

#[test]
fn scenario_5_density_on_previously_visited_sector_preserves_holo() {
    let mut parser = new_parser();
    feed_lines(
        &mut parser,
        &["Sector  : 1000 in Test System\r", "Command [TL=00:00:00]:[1000] (?=Help)? : "],
    );

    feed_lines(
        &mut parser,
        &[
            "                           Relative Density Scan\r",
            "Sector 1000 ( ) Density: 1500, NavHaz: 5%, Warps: 3, Anomaly: No\r",
        ],
    );

    let sector = parser.store().load_sector(SectorIndex(1000)).unwrap().unwrap();
    assert_eq!(sector.density, Some(1500));
    assert_eq!(sector.explored, ExplorationStatus::Holo.as_db_value());
    assert_eq!(sector.constellation.as_deref(), Some("Test System"));
}

#[test]
fn scenario_6_probe_sequence_suppresses_then_unsuppresses() {
    let (mut parser, ui) = new_parser_with_ui();

    // Still inside sector 500's screen (no command prompt yet) when the
    // probe trace arrives, so `current_sector_index` serves as the probe's
    // last-known position (mirrors `last_warp` in the grammar unit tests).
    feed_lines(&mut parser, &["Sector  : 500 in Test System\r", "Probe entering sector : 510\r"]);

    let source = parser.store().load_sector(SectorIndex(500)).unwrap().unwrap();
    assert!(source.warps.as_slice().contains(&SectorIndex(510)));
    assert!(!ui.current_sector_changes.lock().unwrap().contains(&SectorIndex(510)));

    feed_lines(&mut parser, &["Command [TL=00:00:01]:[500] (?=Help)? : "]);

    feed_lines(
        &mut parser,
        &["Sector  : 510 in Test System\r", "Command [TL=00:00:02]:[510] (?=Help)? : "],
    );
    assert!(ui.current_sector_changes.lock().unwrap().contains(&SectorIndex(510)));
}

#[test]
fn navhaz_garbage_inputs_clamp_to_zero_without_crashing() {
    for input in ["NavHaz  : -5%\r", "NavHaz  : high%\r", "NavHaz  : %\r"] {
        let mut parser = new_parser();
        feed_lines(&mut parser, &["Sector  : 1 in Test System\r", input]);
        let sector = parser.store().load_sector(SectorIndex(1)).unwrap().unwrap();
        assert_eq!(sector.nav_haz, Some(0));
    }
}

#[test]
fn reparsing_identical_sector_screen_is_idempotent() {
    let screen = [
        "Sector  : 42 in Sol\r",
        "NavHaz  : 10%\r",
        "Warps to Sector(s) :  (1) - 2 - 3\r",
        "Command [TL=00:00:00]:[42] (?=Help)? : ",
    ];

    let mut parser = new_parser();
    feed_lines(&mut parser, &screen);
    let first = parser.store().load_sector(SectorIndex(42)).unwrap().unwrap();

    feed_lines(&mut parser, &screen);
    let second = parser.store().load_sector(SectorIndex(42)).unwrap().unwrap();

    assert_eq!(first, second);

    let reverse_1 = parser.store().load_sector(SectorIndex(1)).unwrap().unwrap();
    assert_eq!(reverse_1.warps.as_slice(), &[SectorIndex(42)]);
}

#[test]
fn byte_at_a_time_feed_matches_whole_chunk_feed() {
    let screen = "Sector  : 9 in Sol\rNavHaz  : 20%\rCommand [TL=00:00:00]:[9] (?=Help)? : ";

    let mut byte_fed = new_parser();
    for b in screen.as_bytes() {
        byte_fed.feed(&[*b]);
    }
    let byte_fed_row = byte_fed.store().load_sector(SectorIndex(9)).unwrap().unwrap();

    let mut chunk_fed = new_parser();
    chunk_fed.feed(screen.as_bytes());
    let chunk_fed_row = chunk_fed.store().load_sector(SectorIndex(9)).unwrap().unwrap();

    assert_eq!(byte_fed_row, chunk_fed_row);
}
