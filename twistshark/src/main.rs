//! `twistshark`: a thin CLI that exercises `twist_parser` against a
//! captured BBS session transcript instead of a live telnet socket (the
//! transport itself is out of scope). Two operations: stream a transcript
//! through the parser, or inspect the resulting store.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{App, Arg, SubCommand};
use twist_parser::config::ParserConfig;
use twist_parser::events::UiCallbacks;
use twist_parser::store::{PlayerStatsRow, PortRow, SectorRow, TraderRow};
use twist_parser::types::SectorIndex;
use twist_parser::{Parser, store::Store};

/// Feeds the transcript in bounded chunks rather than all at once, so the
/// same run exercises the line assembler's partial-line/partial-ANSI
/// handling instead of only ever seeing whole lines.
const FEED_CHUNK_BYTES: usize = 256;

struct JsonUi;

impl UiCallbacks for JsonUi {
    fn on_current_sector_changed(&mut self, sector: &SectorRow) {
        print_event("current_sector_changed", sector_json(sector));
    }

    fn on_sector_updated(&mut self, sector: &SectorRow) {
        print_event("sector_updated", sector_json(sector));
    }

    fn on_port_updated(&mut self, port: &PortRow) {
        print_event("port_updated", port_json(port));
    }

    fn on_player_stats_updated(&mut self, stats: &PlayerStatsRow) {
        print_event("player_stats_updated", player_stats_json(stats));
    }

    fn on_trader_data_updated(&mut self, sector: SectorIndex, traders: &[TraderRow]) {
        let rows: Vec<_> = traders.iter().map(trader_json).collect();
        print_event(
            "trader_data_updated",
            serde_json::json!({ "sector": sector.raw(), "traders": rows }),
        );
    }
}

fn print_event(kind: &str, data: serde_json::Value) {
    let envelope = serde_json::json!({ "event": kind, "data": data });
    println!("{}", envelope);
}

fn sector_json(row: &SectorRow) -> serde_json::Value {
    serde_json::json!({
        "sector_index": row.sector_index.raw(),
        "constellation": row.constellation,
        "beacon": row.beacon,
        "nav_haz": row.nav_haz,
        "warps": row.warps.as_slice().iter().map(|s| s.raw()).collect::<Vec<_>>(),
        "density": row.density,
        "anomaly": row.anomaly,
        "explored": row.explored,
    })
}

fn port_json(row: &PortRow) -> serde_json::Value {
    serde_json::json!({
        "sector_index": row.sector_index.raw(),
        "name": row.name,
        "class_index": row.class_index,
        "dead": row.dead,
        "buy_ore": row.buy_ore,
        "buy_org": row.buy_org,
        "buy_equip": row.buy_equip,
        "ore_amount": row.ore_amount,
        "org_amount": row.org_amount,
        "equip_amount": row.equip_amount,
        "ore_percent": row.ore_percent,
        "org_percent": row.org_percent,
        "equip_percent": row.equip_percent,
    })
}

fn player_stats_json(row: &PlayerStatsRow) -> serde_json::Value {
    serde_json::json!({
        "turns": row.turns,
        "credits": row.credits,
        "fighters": row.fighters,
        "shields": row.shields,
        "holds_total": row.holds_total,
        "holds_empty": row.holds_empty,
        "ore_holds": row.ore_holds,
        "org_holds": row.org_holds,
        "equip_holds": row.equip_holds,
        "colonist_holds": row.colonist_holds,
        "experience": row.experience,
        "ship_number": row.ship_number,
        "ship_class": row.ship_class,
        "current_sector": row.current_sector,
        "player_name": row.player_name,
    })
}

fn trader_json(row: &TraderRow) -> serde_json::Value {
    serde_json::json!({
        "name": row.name,
        "ship_type": row.ship_type,
        "ship_name": row.ship_name,
        "fighters": row.fighters,
    })
}

fn feed_transcript(transcript: &PathBuf, db: &PathBuf) -> Result<()> {
    let bytes = fs::read(transcript)
        .with_context(|| format!("failed to read transcript {}", transcript.display()))?;
    let store = Store::open(db).with_context(|| format!("failed to open store {}", db.display()))?;
    let mut parser = Parser::new(ParserConfig::default(), store, JsonUi);

    for chunk in bytes.chunks(FEED_CHUNK_BYTES) {
        parser.feed(chunk);
    }
    parser.finalize();
    Ok(())
}

fn dump_db(db: &PathBuf, sector: Option<u32>) -> Result<()> {
    let store = Store::open(db).with_context(|| format!("failed to open store {}", db.display()))?;

    if let Some(sector) = sector {
        let sector = SectorIndex(sector);
        match store.load_sector(sector)? {
            Some(row) => println!("{}", sector_json(&row)),
            None => println!("sector {sector} not in store"),
        }
        match store.load_port(sector)? {
            Some(row) => println!("{}", port_json(&row)),
            None => {}
        }
        return Ok(());
    }

    if let Some(row) = store.load_player_stats()? {
        println!("{}", player_stats_json(&row));
    } else {
        println!("no player stats recorded yet");
    }

    let mut stmt = store
        .conn
        .prepare("SELECT sector_index, explored FROM sectors ORDER BY sector_index")?;
    let rows = stmt.query_map([], |row| {
        let sector: i64 = row.get(0)?;
        let explored: i64 = row.get(1)?;
        Ok((sector, explored))
    })?;
    for row in rows {
        let (sector, explored) = row?;
        println!("sector {sector}: explored={explored}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = App::new("twistshark")
        .author("twist contributors")
        .about("Feeds a captured Trade Wars 2002 session transcript through twist_parser")
        .subcommand(
            SubCommand::with_name("feed")
                .about("Stream a transcript through the parser, printing fired UI events as JSON")
                .arg(
                    Arg::with_name("TRANSCRIPT")
                        .help("Raw byte transcript captured from a BBS session")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("db")
                        .long("db")
                        .takes_value(true)
                        .default_value("twist.db")
                        .help("SQLite store to write discovered fields into"),
                ),
        )
        .subcommand(
            SubCommand::with_name("dump-db")
                .about("Print the current sectors/ports/player row for inspection")
                .arg(
                    Arg::with_name("DB")
                        .help("SQLite store to read")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("sector")
                        .long("sector")
                        .takes_value(true)
                        .help("Print only this sector and its port"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("feed") {
        let transcript = PathBuf::from(matches.value_of("TRANSCRIPT").unwrap());
        let db = PathBuf::from(matches.value_of("db").unwrap());
        feed_transcript(&transcript, &db)?;
    } else if let Some(matches) = matches.subcommand_matches("dump-db") {
        let db = PathBuf::from(matches.value_of("DB").unwrap());
        let sector = matches
            .value_of("sector")
            .map(|s| s.parse::<u32>().context("sector must be a positive integer"))
            .transpose()?;
        dump_db(&db, sector)?;
    } else {
        eprintln!("no subcommand given; try `twistshark feed --help` or `twistshark dump-db --help`");
    }

    Ok(())
}
