//! `SectorTracker` (§4.5): one sector row, keyed by `sector_index`.

use rusqlite::Connection;

use crate::error::StoreError;
use crate::types::{ExplorationStatus, SectorIndex, WarpList};

use super::ColumnSet;

pub struct SectorTracker {
    sector_index: SectorIndex,
    columns: ColumnSet,
}

impl SectorTracker {
    pub fn new(sector_index: SectorIndex) -> Self {
        Self {
            sector_index,
            columns: ColumnSet::new(),
        }
    }

    pub fn sector_index(&self) -> SectorIndex {
        self.sector_index
    }

    pub fn set_constellation(&mut self, value: impl Into<String>) -> &mut Self {
        self.columns.set("constellation", value.into());
        self
    }

    pub fn set_beacon(&mut self, value: impl Into<String>) -> &mut Self {
        self.columns.set("beacon", value.into());
        self
    }

    pub fn set_nav_haz(&mut self, value: u8) -> &mut Self {
        self.columns.set("nav_haz", value as i64);
        self
    }

    pub fn set_density(&mut self, value: i64) -> &mut Self {
        self.columns.set("density", value);
        self
    }

    pub fn set_anomaly(&mut self, value: bool) -> &mut Self {
        self.columns.set("anomaly", value);
        self
    }

    /// Sets `explored`. Callers must already have resolved monotonicity
    /// against a fresh read (§3, §8: downgrades are forbidden) before
    /// calling this — the tracker itself has no visibility into the
    /// persisted value.
    pub fn set_explored(&mut self, value: ExplorationStatus) -> &mut Self {
        self.columns.set("explored", value.as_db_value());
        self
    }

    /// Sets the warp destination columns *and* the derived `warps` count
    /// in one call (§4.5: "Warp setter also computes and sets the scalar
    /// `warps` count").
    pub fn set_warps(&mut self, warps: &WarpList) -> &mut Self {
        let slots = warps.to_slots();
        for (i, slot) in slots.iter().enumerate() {
            let column: &'static str = match i {
                0 => "warp1",
                1 => "warp2",
                2 => "warp3",
                3 => "warp4",
                4 => "warp5",
                _ => "warp6",
            };
            self.columns.set(column, *slot as i64);
        }
        self.columns.set("warps", warps.len() as i64);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn execute(&self, conn: &Connection) -> Result<bool, StoreError> {
        if self.columns.is_empty() {
            return Ok(false);
        }
        conn.execute(
            "INSERT OR IGNORE INTO sectors (sector_index, explored) VALUES (?1, 0)",
            [self.sector_index.raw()],
        )?;
        let where_clause = format!("sector_index = {}", self.sector_index.raw());
        let sql = self.columns.update_sql("sectors", &where_clause);
        conn.execute(&sql, rusqlite::params_from_iter(self.columns.params()))?;
        conn.execute(
            &format!(
                "UPDATE sectors SET update_time = datetime('now') WHERE sector_index = {}",
                self.sector_index.raw()
            ),
            [],
        )?;
        Ok(true)
    }
}
