//! Computer Interrogation Mode parser (§4.4.4): bulk warp and port dumps,
//! one row per entity, entered via a strictly-anchored `": "` prefix.

use crate::events::UiCallbacks;
use crate::fields::{clamp_percent, clamp_sector, parse_int_commas, positional_params};
use crate::session::Parser;
use crate::types::{derive_port_class, ExplorationStatus, SectorIndex};

/// The CIM entry pattern is exactly `": "` at line start (§4.2) — a
/// frequent false-positive source, so it must not be a general substring
/// match.
pub fn is_entry(text: &str) -> bool {
    text.starts_with(": ")
}

pub fn handle_entry<U: UiCallbacks>(session: &mut Parser<U>, _text: &str) {
    use crate::display::DisplayMode;
    session.display.transition(DisplayMode::Cim);
}

/// Routes one CIM data row once in `Cim`/`PortCim`/`WarpCim` mode. The
/// presence of `%` distinguishes a port row from a warp row (§4.2).
pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    if text.contains('%') {
        handle_port_row(session, text);
    } else {
        handle_warp_row(session, text);
    }
}

fn mark_calc_if_unknown<U: UiCallbacks>(session: &mut Parser<U>, sector: SectorIndex) {
    let status = session
        .store()
        .load_sector(sector)
        .ok()
        .flatten()
        .map(|r| ExplorationStatus::from_db_value(r.explored))
        .unwrap_or(ExplorationStatus::None);
    if status == ExplorationStatus::None {
        session.ensure_sector_tracker(sector).set_explored(ExplorationStatus::Calc);
    }
}

fn handle_warp_row<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let params = positional_params(text);
    let Some(sector_tok) = params.first() else { return };
    let Some(raw_sector) = parse_int_commas("cim_sector", sector_tok) else {
        return;
    };
    let bound = session.config().sector_validation_bound;
    let sector = SectorIndex(clamp_sector("cim_sector", raw_sector, bound));
    if sector.raw() == 0 {
        return;
    }

    use crate::types::WarpList;
    let mut warps = WarpList::new();
    for tok in params.iter().skip(1).take(6) {
        if let Some(v) = parse_int_commas("cim_warp", tok) {
            if v > 0 && v <= bound as i64 {
                warps.insert(SectorIndex(v as u32));
            }
        }
    }

    mark_calc_if_unknown(session, sector);
    session.ensure_sector_tracker(sector).set_warps(&warps);
    session.complete_cim_row(sector);
}

/// `"<sector> <ore> <orePct>% <org> <orgPct>% <equip> <equipPct>%"`, a
/// leading `-` on a quantity marks that commodity as buying (§4.4.4).
fn handle_port_row<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let cleaned = text.replace('%', "");
    let params = positional_params(&cleaned);
    if params.len() < 7 {
        return;
    }
    let Some(raw_sector) = parse_int_commas("cim_sector", params[0]) else {
        return;
    };
    let bound = session.config().sector_validation_bound;
    let sector = SectorIndex(clamp_sector("cim_sector", raw_sector, bound));
    if sector.raw() == 0 {
        return;
    }

    let Some((ore_amount, ore_buying)) = parse_signed_amount(params[1]) else { return };
    let Some(ore_pct) = parse_int_commas("cim_pct", params[2]) else { return };
    let Some((org_amount, org_buying)) = parse_signed_amount(params[3]) else { return };
    let Some(org_pct) = parse_int_commas("cim_pct", params[4]) else { return };
    let Some((equip_amount, equip_buying)) = parse_signed_amount(params[5]) else { return };
    let Some(equip_pct) = parse_int_commas("cim_pct", params[6]) else { return };

    use crate::types::Commodity;
    let tracker = session.ensure_port_tracker(sector);
    tracker.set_amount(Commodity::Ore, ore_amount);
    tracker.set_percent(Commodity::Ore, clamp_percent("cim_pct", ore_pct));
    tracker.set_buying(Commodity::Ore, ore_buying);
    tracker.set_amount(Commodity::Organics, org_amount);
    tracker.set_percent(Commodity::Organics, clamp_percent("cim_pct", org_pct));
    tracker.set_buying(Commodity::Organics, org_buying);
    tracker.set_amount(Commodity::Equipment, equip_amount);
    tracker.set_percent(Commodity::Equipment, clamp_percent("cim_pct", equip_pct));
    tracker.set_buying(Commodity::Equipment, equip_buying);
    tracker.set_class(derive_port_class(ore_buying, org_buying, equip_buying));

    mark_calc_if_unknown(session, sector);
    session.complete_cim_row(sector);
}

fn parse_signed_amount(tok: &str) -> Option<(u32, bool)> {
    let (buying, digits) = match tok.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, tok),
    };
    let value = parse_int_commas("cim_amount", digits)?;
    Some((value.max(0) as u32, buying))
}
