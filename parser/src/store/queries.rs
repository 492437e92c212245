//! Fresh-read queries (§4.6, §5 "Suspension points": `LoadSector`,
//! `GetPlayerStatsInfo`, `GetPortInfo`). These are the only reads the UI
//! callback surface is allowed to act on — never the in-flight tracker
//! state — so that callbacks observe committed data (§4.6).

use rusqlite::{OptionalExtension, Row};

use crate::error::StoreError;
use crate::types::{ExplorationStatus, SectorIndex, WarpList};

use super::db::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct SectorRow {
    pub sector_index: SectorIndex,
    pub constellation: Option<String>,
    pub beacon: Option<String>,
    pub nav_haz: Option<i64>,
    pub warps: WarpList,
    pub density: Option<i64>,
    pub anomaly: Option<bool>,
    pub explored: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortRow {
    pub sector_index: SectorIndex,
    pub name: Option<String>,
    pub class_index: Option<i64>,
    pub dead: bool,
    pub build_time: Option<i64>,
    pub buy_ore: Option<bool>,
    pub buy_org: Option<bool>,
    pub buy_equip: Option<bool>,
    pub ore_amount: Option<i64>,
    pub org_amount: Option<i64>,
    pub equip_amount: Option<i64>,
    pub ore_percent: Option<i64>,
    pub org_percent: Option<i64>,
    pub equip_percent: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatsRow {
    pub turns: Option<i64>,
    pub credits: Option<i64>,
    pub fighters: Option<i64>,
    pub shields: Option<i64>,
    pub holds_total: Option<i64>,
    pub holds_empty: Option<i64>,
    pub ore_holds: Option<i64>,
    pub org_holds: Option<i64>,
    pub equip_holds: Option<i64>,
    pub colonist_holds: Option<i64>,
    pub experience: Option<i64>,
    pub ship_number: Option<i64>,
    pub ship_class: Option<String>,
    pub current_sector: Option<i64>,
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraderRow {
    pub name: Option<String>,
    pub ship_type: Option<String>,
    pub ship_name: Option<String>,
    pub fighters: Option<i64>,
}

fn sector_from_row(row: &Row<'_>) -> rusqlite::Result<SectorRow> {
    let slots: [u32; 6] = [
        row.get::<_, Option<i64>>("warp1")?.unwrap_or(0) as u32,
        row.get::<_, Option<i64>>("warp2")?.unwrap_or(0) as u32,
        row.get::<_, Option<i64>>("warp3")?.unwrap_or(0) as u32,
        row.get::<_, Option<i64>>("warp4")?.unwrap_or(0) as u32,
        row.get::<_, Option<i64>>("warp5")?.unwrap_or(0) as u32,
        row.get::<_, Option<i64>>("warp6")?.unwrap_or(0) as u32,
    ];
    Ok(SectorRow {
        sector_index: SectorIndex(row.get::<_, i64>("sector_index")? as u32),
        constellation: row.get("constellation")?,
        beacon: row.get("beacon")?,
        nav_haz: row.get("nav_haz")?,
        warps: WarpList::from_slots(slots),
        density: row.get("density")?,
        anomaly: row.get::<_, Option<i64>>("anomaly")?.map(|v| v != 0),
        explored: row.get::<_, Option<i64>>("explored")?.unwrap_or(0),
    })
}

impl Store {
    pub fn load_sector(&self, sector: SectorIndex) -> Result<Option<SectorRow>, StoreError> {
        self.conn
            .query_row(
                "SELECT * FROM sectors WHERE sector_index = ?1",
                [sector.raw()],
                sector_from_row,
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn load_port(&self, sector: SectorIndex) -> Result<Option<PortRow>, StoreError> {
        self.conn
            .query_row(
                "SELECT * FROM ports WHERE sector_index = ?1",
                [sector.raw()],
                |row| {
                    Ok(PortRow {
                        sector_index: SectorIndex(row.get::<_, i64>("sector_index")? as u32),
                        name: row.get("name")?,
                        class_index: row.get("class_index")?,
                        dead: row.get::<_, i64>("dead")? != 0,
                        build_time: row.get("build_time")?,
                        buy_ore: row.get::<_, Option<i64>>("buy_ore")?.map(|v| v != 0),
                        buy_org: row.get::<_, Option<i64>>("buy_org")?.map(|v| v != 0),
                        buy_equip: row.get::<_, Option<i64>>("buy_equip")?.map(|v| v != 0),
                        ore_amount: row.get("ore_amount")?,
                        org_amount: row.get("org_amount")?,
                        equip_amount: row.get("equip_amount")?,
                        ore_percent: row.get("ore_percent")?,
                        org_percent: row.get("org_percent")?,
                        equip_percent: row.get("equip_percent")?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn load_player_stats(&self) -> Result<Option<PlayerStatsRow>, StoreError> {
        self.conn
            .query_row("SELECT * FROM player_stats WHERE id = 1", [], |row| {
                Ok(PlayerStatsRow {
                    turns: row.get("turns")?,
                    credits: row.get("credits")?,
                    fighters: row.get("fighters")?,
                    shields: row.get("shields")?,
                    holds_total: row.get("holds_total")?,
                    holds_empty: row.get("holds_empty")?,
                    ore_holds: row.get("ore_holds")?,
                    org_holds: row.get("org_holds")?,
                    equip_holds: row.get("equip_holds")?,
                    colonist_holds: row.get("colonist_holds")?,
                    experience: row.get("experience")?,
                    ship_number: row.get("ship_number")?,
                    ship_class: row.get("ship_class")?,
                    current_sector: row.get("current_sector")?,
                    player_name: row.get("player_name")?,
                })
            })
            .optional()
            .map_err(StoreError::from)
    }

    pub fn load_traders(&self, sector: SectorIndex) -> Result<Vec<TraderRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, ship_type, ship_name, fighters FROM traders WHERE sector_index = ?1")?;
        let rows = stmt
            .query_map([sector.raw()], |row| {
                Ok(TraderRow {
                    name: row.get(0)?,
                    ship_type: row.get(1)?,
                    ship_name: row.get(2)?,
                    fighters: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn script_variable(&self, name: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT value FROM script_variables WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn set_script_variable(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO script_variables (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            (name, value),
        )?;
        Ok(())
    }
}

impl ExplorationStatus {
    pub fn from_db_value(value: i64) -> Self {
        match value {
            1 => ExplorationStatus::Calc,
            2 => ExplorationStatus::Density,
            3 => ExplorationStatus::Holo,
            _ => ExplorationStatus::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sector_reads_as_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.load_sector(SectorIndex(1234)).unwrap().is_none());
    }

    #[test]
    fn script_variable_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        store.set_script_variable("$STARDOCK", "42").unwrap();
        assert_eq!(
            store.script_variable("$STARDOCK").unwrap(),
            Some("42".to_string())
        );
        store.set_script_variable("$STARDOCK", "43").unwrap();
        assert_eq!(
            store.script_variable("$STARDOCK").unwrap(),
            Some("43".to_string())
        );
    }
}
