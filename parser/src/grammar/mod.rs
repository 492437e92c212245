//! Grammar Sub-Parsers (C5, §4.4). One module per screen type named in the
//! component table: sector/continuation, port commerce, CIM, density,
//! figscan, quick-stats, info screen, transmission, stardock, citadel,
//! plus the probe trace and shared warp-list parsing helpers.

pub mod cim;
pub mod citadel;
pub mod density;
pub mod figscan;
pub mod info;
pub mod port;
pub mod probe;
pub mod quickstats;
pub mod sector;
pub mod stardock;
pub mod transmission;
pub mod warps;
