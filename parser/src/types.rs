//! Domain newtypes shared across the grammar sub-parsers and trackers (§3).
//!
//! Thin wrappers around a primitive, `Copy` where cheap, with only the
//! conversions call sites actually need instead of a raw `u32`/`i64`
//! passed around.

use std::fmt;

/// A sector number, 1..=20000 by validation (storage allows up to 50000).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct SectorIndex(pub u32);

impl SectorIndex {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SectorIndex {
    fn from(v: u32) -> Self {
        SectorIndex(v)
    }
}

/// Exploration status is ordered and monotonically non-decreasing (§3, §8):
/// `None < Calc < Density < Holo`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[repr(u8)]
pub enum ExplorationStatus {
    #[default]
    None = 0,
    Calc = 1,
    Density = 2,
    Holo = 3,
}

impl ExplorationStatus {
    pub fn as_db_value(self) -> i64 {
        self as u8 as i64
    }
}

/// A fixed-capacity ascending, deduplicated set of warp destinations (§3,
/// §4.4.2, §8). Holds at most 6 entries; zero entries trail when fewer than
/// 6 warps are known, matching the `warp1..warp6` storage columns (§6).
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WarpList {
    entries: Vec<SectorIndex>,
}

pub const MAX_WARPS: usize = 6;

impl WarpList {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn from_slots(slots: [u32; MAX_WARPS]) -> Self {
        let mut list = Self::new();
        for s in slots {
            if s > 0 {
                list.insert(SectorIndex(s));
            }
        }
        list
    }

    pub fn as_slice(&self) -> &[SectorIndex] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted-insert with shift-right (§9 design note: never append-then-sort,
    /// to keep the result deterministic under re-parse). No-op if already
    /// present or the list is at capacity.
    pub fn insert(&mut self, sector: SectorIndex) -> bool {
        if sector.raw() == 0 || self.entries.contains(&sector) {
            return false;
        }
        if self.entries.len() >= MAX_WARPS {
            return false;
        }
        let pos = self.entries.partition_point(|s| *s < sector);
        self.entries.insert(pos, sector);
        true
    }

    /// Returns the six storage slots (zero-padded) for `warp1..warp6`.
    pub fn to_slots(&self) -> [u32; MAX_WARPS] {
        let mut slots = [0u32; MAX_WARPS];
        for (i, s) in self.entries.iter().enumerate().take(MAX_WARPS) {
            slots[i] = s.raw();
        }
        slots
    }
}

/// One of the three tradeable commodities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, strum_macros::EnumString, strum_macros::Display)]
pub enum Commodity {
    #[strum(serialize = "Fuel Ore", serialize = "ore")]
    Ore,
    #[strum(serialize = "Organics", serialize = "organics", serialize = "org")]
    Organics,
    #[strum(serialize = "Equipment", serialize = "equipment", serialize = "equip")]
    Equipment,
}

/// Per-product port state (§3 Port entity).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ProductSlot {
    pub amount: u32,
    pub percent: u8,
    pub buying: bool,
}

/// Port class, 1..=8 derived from the buy/sell triple, 9 reserved for
/// Stardock (§3, §4.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PortClass(pub u8);

pub const STARDOCK_CLASS: PortClass = PortClass(9);

/// Class derivation table (§4.4.1): B=buying, S=selling, in order
/// ore-organics-equipment.
pub fn derive_port_class(ore_buying: bool, org_buying: bool, equip_buying: bool) -> PortClass {
    let class = match (ore_buying, org_buying, equip_buying) {
        (true, true, false) => 1,   // BBS
        (true, false, true) => 2,   // BSB
        (false, true, true) => 3,   // SBB
        (false, false, true) => 4,  // SSB
        (false, true, false) => 5,  // SBS
        (true, false, false) => 6,  // BSS
        (false, false, false) => 7, // SSS
        (true, true, true) => 8,    // BBB
    };
    PortClass(class)
}

/// Message category (§3 Message entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, strum_macros::Display)]
pub enum MessageKind {
    General,
    Fighter,
    Computer,
    Radio,
    Fedlink,
    Planet,
    Personal,
    Incoming,
    Continuing,
    Shipboard,
    Deployed,
}

/// A radio/transmission/report message (§3, §4.4.9).
#[derive(Debug, Clone, serde::Serialize)]
pub struct Message {
    pub kind: MessageKind,
    pub timestamp_ms: i64,
    pub content: String,
    pub sender: Option<String>,
    pub channel: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warp_list_sorted_insert_shift_right() {
        let mut warps = WarpList::new();
        warps.insert(SectorIndex(9));
        warps.insert(SectorIndex(3));
        warps.insert(SectorIndex(6));
        assert_eq!(
            warps.as_slice(),
            &[SectorIndex(3), SectorIndex(6), SectorIndex(9)]
        );
    }

    #[test]
    fn warp_list_rejects_duplicates_and_zero() {
        let mut warps = WarpList::new();
        assert!(warps.insert(SectorIndex(5)));
        assert!(!warps.insert(SectorIndex(5)));
        assert!(!warps.insert(SectorIndex(0)));
        assert_eq!(warps.len(), 1);
    }

    #[test]
    fn warp_list_caps_at_six() {
        let mut warps = WarpList::new();
        for i in 1..=8u32 {
            warps.insert(SectorIndex(i));
        }
        assert_eq!(warps.len(), MAX_WARPS);
    }

    #[test]
    fn class_derivation_table() {
        assert_eq!(derive_port_class(true, true, false).0, 1); // BBS
        assert_eq!(derive_port_class(true, false, true).0, 2); // BSB
        assert_eq!(derive_port_class(false, true, true).0, 3); // SBB
        assert_eq!(derive_port_class(false, false, true).0, 4); // SSB
        assert_eq!(derive_port_class(false, true, false).0, 5); // SBS
        assert_eq!(derive_port_class(true, false, false).0, 6); // BSS
        assert_eq!(derive_port_class(false, false, false).0, 7); // SSS
        assert_eq!(derive_port_class(true, true, true).0, 8); // BBB
    }
}
