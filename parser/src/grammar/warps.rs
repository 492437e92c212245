//! Warp-list parsing (§4.4.2), shared by the sector parser's "Warps to
//! Sector(s)" line and the CIM warp-bulk rows.

use crate::fields::parse_int_commas;
use crate::types::{SectorIndex, WarpList};

/// Parses a free-form warp destination list. Accepts `" - "`, `", "`, or
/// plain whitespace as separators, and strips parentheses around numbers.
/// ANSI must already be stripped by the caller (the assembler guarantees
/// this for every complete line). Produces up to 6 unique positive
/// sectors `<= bound`, ascending.
pub fn parse_warp_list(text: &str, bound: u32) -> WarpList {
    let cleaned = text.replace(['(', ')'], "").replace(" - ", " ").replace(", ", " ");

    let mut warps = WarpList::new();
    for token in cleaned.split_whitespace() {
        let token = token.trim_end_matches(',');
        if let Some(value) = parse_int_commas("warp", token) {
            if value > 0 && value <= bound as i64 {
                warps.insert(SectorIndex(value as u32));
            }
        }
    }
    warps
}
