//! `<Info>` screen parser (§4.4.8): labelled fields, `Credits` terminal.

use crate::events::UiCallbacks;
use crate::fields::parse_int_commas;
use crate::session::Parser;

pub fn is_entry(text: &str) -> bool {
    text.trim() == "<Info>"
}

pub fn handle_entry<U: UiCallbacks>(session: &mut Parser<U>, _text: &str) {
    session.info_active = true;
}

fn label_value(text: &str) -> Option<(&str, &str)> {
    let idx = text.find(':')?;
    Some((text[..idx].trim(), text[idx + 1..].trim()))
}

pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let Some((label, value)) = label_value(text) else {
        return;
    };

    if label.starts_with("Trader Name") {
        session.player_stats_tracker.set_player_name(value.to_string());
    } else if label.starts_with("Rank and Exp") {
        let (rank, exp) = split_rank_and_exp(value);
        if let Some(rank) = rank {
            session.player_stats_tracker.set_rank(rank.to_string());
        }
        if let Some(exp) = exp {
            session.player_stats_tracker.set_experience(exp);
        }
    } else if label.starts_with("Ship Info") {
        let mut tokens = value.split_whitespace();
        if let Some(number) = tokens.next().and_then(|t| parse_int_commas("ship_number", t)) {
            session.player_stats_tracker.set_ship_number(number);
        }
        let rest: Vec<&str> = tokens.collect();
        if !rest.is_empty() {
            session.player_stats_tracker.set_ship_class(rest.join(" "));
        }
    } else if label.starts_with("Turns left") {
        if let Some(v) = parse_int_commas("turns", value) {
            session.player_stats_tracker.set_turns(v);
        }
    } else if label.starts_with("Total Holds") {
        if let Some(v) = parse_int_commas("holds_total", value) {
            session.player_stats_tracker.set_holds_total(v);
        }
    } else if label.starts_with("Fighters") {
        if let Some(v) = parse_int_commas("fighters", value) {
            session.player_stats_tracker.set_fighters(v);
        }
    } else if label.starts_with("Ether Probes") {
        if let Some(v) = parse_int_commas("ether_probes", value) {
            session.player_stats_tracker.set_ether_probes(v);
        }
    } else if label.starts_with("Current Sector") {
        if let Some(v) = parse_int_commas("current_sector", value) {
            session.player_stats_tracker.set_current_sector(v);
        }
    } else if label.starts_with("Credits") {
        if let Some(v) = parse_int_commas("credits", value) {
            session.player_stats_tracker.set_credits(v);
        }
        session.info_active = false;
        session.flush_player_stats();
    }
}

fn split_rank_and_exp(value: &str) -> (Option<&str>, Option<i64>) {
    let Some(open) = value.find('(') else {
        return (Some(value.trim()), None);
    };
    let rank = value[..open].trim();
    let exp = value[open + 1..]
        .trim_end_matches(')')
        .trim()
        .parse::<i64>()
        .ok();
    (Some(rank), exp)
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
    fn credits_is_terminal_and_flushes() {
        let mut parser = new_parser();
        handle_entry(&mut parser, "<Info>");
        handle_line(&mut parser, "Trader Name    : John Doe");
        handle_line(&mut parser, "Current Sector : 1234");
        handle_line(&mut parser, "Credits        : 50,000");

        assert!(!parser.info_active);
        let row = parser.store().load_player_stats().unwrap().unwrap();
        assert_eq!(row.player_name.as_deref(), Some("John Doe"));
        assert_eq!(row.current_sector, Some(1234));
        assert_eq!(row.credits, Some(50_000));
    }
}
