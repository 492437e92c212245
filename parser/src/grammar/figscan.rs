//! Fighter scan parser (§4.4.6).

use tracing::debug;

use crate::events::UiCallbacks;
use crate::fields::{clamp_sector, parse_int_with_suffix, positional_params};
use crate::session::Parser;
use crate::types::SectorIndex;

pub(crate) const RESET_PROMPT: &str = "No fighters deployed";
const PERSONAL_OWNER: &str = "yours";
const CORP_OWNER: &str = "belong to your Corp";

/// Whether `text` is a figscan deployment row the dispatcher should route
/// here: the reset prompt, or `"<sector> <quantity> <Personal|Corp>
/// <Defensive|Offensive|Toll> …"` (§4.4.6).
pub fn is_row(text: &str) -> bool {
    if text.contains(RESET_PROMPT) {
        return true;
    }
    let params = positional_params(text);
    let (Some(sector_tok), Some(qty_tok), Some(owner_tok), Some(mode_tok)) =
        (params.first(), params.get(1), params.get(2), params.get(3))
    else {
        return false;
    };
    matches!(*owner_tok, "Personal" | "Corp")
        && matches!(*mode_tok, "Defensive" | "Offensive" | "Toll")
        && crate::fields::parse_int_commas("figscan_probe", sector_tok).is_some()
        && parse_int_with_suffix("figscan_probe", qty_tok).is_some()
}

pub fn handle_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    if text.contains(RESET_PROMPT) {
        reset_owned_fighters(session);
        return;
    }

    let params = positional_params(text);
    let (Some(sector_tok), Some(qty_tok), Some(owner_tok), Some(mode_tok)) =
        (params.first(), params.get(1), params.get(2), params.get(3))
    else {
        return;
    };
    let bound = session.config().sector_validation_bound;
    let Some(raw_sector) = crate::fields::parse_int_commas("figscan_sector", sector_tok) else {
        return;
    };
    let sector = clamp_sector("figscan_sector", raw_sector, bound);
    if sector == 0 {
        return;
    }
    let Some(quantity) = parse_int_with_suffix("figscan_quantity", qty_tok) else {
        return;
    };

    // The schema (§6) has no dedicated fighter-deployment entity; this
    // observation has no row to land in beyond the reset path above, so it
    // is only logged for operators following the scan live.
    debug!(
        sector,
        quantity,
        owner = *owner_tok,
        mode = *mode_tok,
        "fighter deployment observed"
    );
}

/// `"No fighters deployed"` (§4.4.6): zeroes every personal/corp fighter
/// count across the galaxy, skipping the Stardock sector.
fn reset_owned_fighters<U: UiCallbacks>(session: &mut Parser<U>) {
    let upper = session.config().sector_storage_bound as i64;
    let stardock = session.stardock_sector.map(SectorIndex::raw).map(i64::from).unwrap_or(-1);

    for table in ["ships", "traders", "planets"] {
        let sql = format!(
            "UPDATE {table} SET fighters = 0 \
             WHERE sector_index >= 11 AND sector_index <= ?1 AND sector_index != ?2 \
             AND owner IN (?3, ?4)"
        );
        let _ = session
            .store()
            .conn
            .execute(&sql, (upper, stardock, PERSONAL_OWNER, CORP_OWNER));
    }
}
