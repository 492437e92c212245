//! Port commerce parser (§4.4.3): active while `DisplayMode::Port` or
//! `DisplayMode::PortCr` holds the trade screen.

use crate::events::UiCallbacks;
use crate::fields::{parse_int_commas, parse_percent};
use crate::session::Parser;
use crate::types::Commodity;

/// Whether `text` is a commerce line the dispatcher should enter `Port`
/// mode for: the `%` anchored commodity row itself, or one of the
/// free-text prompts that only make sense inside a trade screen.
pub fn is_trigger(text: &str) -> bool {
    detect_commodity(text).is_some()
        || text.starts_with("How many holds of ")
        || (text.starts_with("Agreed, ") && text.contains(" units."))
}

fn detect_commodity(line: &str) -> Option<Commodity> {
    if !line.contains('%') {
        return None;
    }
    if line.contains("Fuel Ore") {
        Some(Commodity::Ore)
    } else if line.contains("Organics") {
        Some(Commodity::Organics)
    } else if line.contains("Equipment") {
        Some(Commodity::Equipment)
    } else {
        None
    }
}

pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let Some(sector) = session
        .display
        .context
        .port_sector_index
        .or(session.display.context.current_sector_index)
    else {
        return;
    };

    if let Some(commodity) = detect_commodity(text) {
        parse_commodity_line(session, sector, commodity, text);
        return;
    }
    if let Some(rest) = text.strip_prefix("How many holds of ") {
        if let Some(idx) = rest.find(" do you want to buy") {
            let name = &rest[..idx];
            if let Ok(commodity) = name.trim().parse::<Commodity>() {
                session.display.context.current_trading_commodity = Some(commodity);
            }
        }
        return;
    }
    if text.starts_with("Agreed, ") && text.contains(" units.") {
        handle_agreed_units(session, text);
        return;
    }
    if text.starts_with("You have ") && text.contains("credits") {
        handle_credits_line(session, text);
        return;
    }
    if text.contains("experience point") {
        handle_experience_line(session, text);
        return;
    }
    if text.contains("turns left") {
        handle_turns_line(session, text);
    }
}

fn parse_commodity_line<U: UiCallbacks>(
    session: &mut Parser<U>,
    sector: crate::types::SectorIndex,
    commodity: Commodity,
    text: &str,
) {
    let stripped = text.replace('%', "");
    let tokens: Vec<&str> = stripped.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "Buying" || *t == "Selling") else {
        return;
    };
    let buying = tokens[pos] == "Buying";
    let Some(qty_tok) = tokens.get(pos + 1) else { return };
    let Some(pct_tok) = tokens.get(pos + 2) else { return };
    let qty = parse_int_commas("port_amount", qty_tok).unwrap_or(0).max(0) as u32;
    let pct = parse_percent("port_percent", pct_tok);

    let tracker = session.ensure_port_tracker(sector);
    tracker.set_buying(commodity, buying);
    tracker.set_amount(commodity, qty);
    tracker.set_percent(commodity, pct);
}

fn handle_agreed_units<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let Some(commodity) = session.display.context.current_trading_commodity else {
        return;
    };
    let Some(units_tok) = text
        .strip_prefix("Agreed, ")
        .and_then(|rest| rest.split_whitespace().next())
    else {
        return;
    };
    let Some(units) = parse_int_commas("agreed_units", units_tok) else {
        return;
    };

    let existing = session.store().load_player_stats().ok().flatten().unwrap_or_default();
    let current = match commodity {
        Commodity::Ore => existing.ore_holds,
        Commodity::Organics => existing.org_holds,
        Commodity::Equipment => existing.equip_holds,
    }
    .unwrap_or(0);

    match commodity {
        Commodity::Ore => session.player_stats_tracker.set_ore_holds(current + units),
        Commodity::Organics => session.player_stats_tracker.set_org_holds(current + units),
        Commodity::Equipment => session.player_stats_tracker.set_equip_holds(current + units),
    };
    session.flush_player_stats();
}

fn handle_credits_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some(credits_idx) = tokens.iter().position(|t| *t == "have").map(|i| i + 1) else {
        return;
    };
    let Some(credits) = tokens.get(credits_idx).and_then(|t| parse_int_commas("credits", t)) else {
        return;
    };
    let Some(empty_idx) = tokens.iter().position(|t| *t == "and").map(|i| i + 1) else {
        return;
    };
    let Some(empty) = tokens.get(empty_idx).and_then(|t| parse_int_commas("holds_empty", t)) else {
        return;
    };

    let existing = session.store().load_player_stats().ok().flatten().unwrap_or_default();
    let cargo = existing.ore_holds.unwrap_or(0)
        + existing.org_holds.unwrap_or(0)
        + existing.equip_holds.unwrap_or(0)
        + existing.colonist_holds.unwrap_or(0);

    session.player_stats_tracker.set_credits(credits);
    session.player_stats_tracker.set_holds_empty(empty);
    session.player_stats_tracker.set_holds_total(empty + cargo);
    session.flush_player_stats();
}

fn handle_experience_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let Some(idx) = text.find("receive ") else { return };
    let rest = &text[idx + "receive ".len()..];
    let Some(amount_tok) = rest.split_whitespace().next() else {
        return;
    };
    let Some(amount) = parse_int_commas("experience", amount_tok) else {
        return;
    };

    let existing_experience = session
        .store()
        .load_player_stats()
        .ok()
        .flatten()
        .and_then(|row| row.experience)
        .unwrap_or(0);

    session.player_stats_tracker.set_experience(existing_experience + amount);
    session.flush_player_stats();
}

fn handle_turns_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let Some(turns_tok) = text.split_whitespace().next() else {
        return;
    };
    let Some(turns) = parse_int_commas("turns", turns_tok) else {
        return;
    };
    session.player_stats_tracker.set_turns(turns);
    session.flush_player_stats();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::events::UiCallbacks as _;
    use crate::store::Store;
    use crate::types::SectorIndex;

    #[derive(Default)]
    struct NoopUi;
    impl UiCallbacks for NoopUi {}

    fn new_parser() -> Parser<NoopUi> {
        let mut parser = Parser::new(ParserConfig::default(), Store::open_in_memory().unwrap(), NoopUi);
        parser.display.context.current_sector_index = Some(SectorIndex(42));
        parser
    }

    #[test]
    fn three_commodity_lines_populate_all_slots() {
        let mut parser = new_parser();
        handle_line(&mut parser, "Fuel Ore       Buying       1,000      50%");
        handle_line(&mut parser, "Organics       Selling        500      40%");
        handle_line(&mut parser, "Equipment      Buying        250      30%");
        parser.complete_sector();

        let port = parser.store().load_port(SectorIndex(42)).unwrap().unwrap();
        assert_eq!(port.ore_amount, Some(1000));
        assert_eq!(port.ore_percent, Some(50));
        assert_eq!(port.buy_ore, Some(true));
        assert_eq!(port.org_amount, Some(500));
        assert_eq!(port.buy_org, Some(false));
        assert_eq!(port.equip_amount, Some(250));
        assert_eq!(port.buy_equip, Some(true));
    }

    #[test]
    fn turns_left_updates_player_stats() {
        let mut parser = new_parser();
        handle_line(&mut parser, "150 turns left");
        let row = parser.store().load_player_stats().unwrap().unwrap();
        assert_eq!(row.turns, Some(150));
    }
}
