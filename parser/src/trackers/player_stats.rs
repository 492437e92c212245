//! `PlayerStatsTracker` (§4.5): single-row (`id = 1`) sparse update.

use rusqlite::Connection;

use crate::error::StoreError;

use super::ColumnSet;

#[derive(Default)]
pub struct PlayerStatsTracker {
    columns: ColumnSet,
}

macro_rules! setter {
    ($name:ident, $column:literal, $ty:ty) => {
        pub fn $name(&mut self, value: $ty) -> &mut Self {
            self.columns.set($column, value);
            self
        }
    };
}

impl PlayerStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(set_turns, "turns", i64);
    setter!(set_credits, "credits", i64);
    setter!(set_fighters, "fighters", i64);
    setter!(set_shields, "shields", i64);
    setter!(set_holds_total, "holds_total", i64);
    setter!(set_holds_empty, "holds_empty", i64);
    setter!(set_ore_holds, "ore_holds", i64);
    setter!(set_org_holds, "org_holds", i64);
    setter!(set_equip_holds, "equip_holds", i64);
    setter!(set_colonist_holds, "colonist_holds", i64);
    setter!(set_photon_torps, "photon_torps", i64);
    setter!(set_armor_mines, "armor_mines", i64);
    setter!(set_limpet_mines, "limpet_mines", i64);
    setter!(set_genesis_torps, "genesis_torps", i64);
    setter!(set_cloaks, "cloaks", i64);
    setter!(set_beacons, "beacons", i64);
    setter!(set_atmos_detonators, "atmos_detonators", i64);
    setter!(set_ether_probes, "ether_probes", i64);
    setter!(set_mine_deflectors, "mine_deflectors", i64);
    setter!(set_alignment, "alignment", i64);
    setter!(set_experience, "experience", i64);
    setter!(set_corp, "corp", String);
    setter!(set_turbo_warp, "turbo_warp", i64);
    setter!(set_psychic_probe, "psychic_probe", bool);
    setter!(set_planet_scanner, "planet_scanner", bool);
    setter!(set_long_range_scan, "long_range_scan", i64);
    setter!(set_ship_number, "ship_number", i64);
    setter!(set_ship_class, "ship_class", String);
    setter!(set_current_sector, "current_sector", i64);
    setter!(set_player_name, "player_name", String);
    setter!(set_rank, "rank", String);

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `INSERT OR IGNORE id=1` then a partial `UPDATE ... WHERE id=1`.
    /// No-op (returns `Ok(false)`) if no setter was ever called.
    pub fn execute(&self, conn: &Connection) -> Result<bool, StoreError> {
        if self.columns.is_empty() {
            return Ok(false);
        }
        conn.execute(
            "INSERT OR IGNORE INTO player_stats (id, updated_at) VALUES (1, datetime('now'))",
            [],
        )?;
        let sql = self.columns.update_sql("player_stats", "id = 1");
        conn.execute(&sql, rusqlite::params_from_iter(self.columns.params()))?;
        conn.execute(
            "UPDATE player_stats SET updated_at = datetime('now') WHERE id = 1",
            [],
        )?;
        Ok(true)
    }
}
