//! Collection trackers (§4.5): ships/traders/planets require full
//! replacement because incremental updates can't identify which rows
//! disappeared from the screen. `execute()` opens a transaction, deletes
//! all rows for the sector, bulk-inserts the accumulated list, and commits
//! atomically across the delete+insert.

use rusqlite::Connection;

use crate::error::StoreError;
use crate::types::SectorIndex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipRecord {
    pub name: String,
    pub owner: String,
    pub ship_type: String,
    pub fighters: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraderRecord {
    pub name: String,
    pub ship_type: String,
    pub ship_name: String,
    pub fighters: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanetRecord {
    pub name: String,
    pub owner: String,
    pub fighters: i64,
    pub citadel: bool,
    pub stardock: bool,
}

macro_rules! collection_tracker {
    ($tracker:ident, $record:ty, $table:literal, $push_fn:ident) => {
        #[derive(Default)]
        pub struct $tracker {
            sector_index: Option<SectorIndex>,
            records: Vec<$record>,
            touched: bool,
        }

        impl $tracker {
            pub fn new(sector_index: SectorIndex) -> Self {
                Self {
                    sector_index: Some(sector_index),
                    records: Vec::new(),
                    touched: false,
                }
            }

            pub fn $push_fn(&mut self, record: $record) -> &mut Self {
                self.touched = true;
                self.records.push(record);
                self
            }

            pub fn is_empty(&self) -> bool {
                !self.touched
            }

            pub fn len(&self) -> usize {
                self.records.len()
            }
        }
    };
}

collection_tracker!(ShipsTracker, ShipRecord, "ships", push_ship);
collection_tracker!(TradersTracker, TraderRecord, "traders", push_trader);
collection_tracker!(PlanetsTracker, PlanetRecord, "planets", push_planet);

impl ShipsTracker {
    pub fn execute(&self, conn: &mut Connection) -> Result<bool, StoreError> {
        if !self.touched {
            return Ok(false);
        }
        let sector = self.sector_index.expect("tracker constructed with a sector");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM ships WHERE sector_index = ?1", [sector.raw()])?;
        for record in &self.records {
            tx.execute(
                "INSERT INTO ships (sector_index, name, owner, ship_type, fighters) VALUES (?1, ?2, ?3, ?4, ?5)",
                (sector.raw(), &record.name, &record.owner, &record.ship_type, record.fighters),
            )?;
        }
        tx.commit()?;
        Ok(true)
    }
}

impl TradersTracker {
    pub fn execute(&self, conn: &mut Connection) -> Result<bool, StoreError> {
        if !self.touched {
            return Ok(false);
        }
        let sector = self.sector_index.expect("tracker constructed with a sector");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM traders WHERE sector_index = ?1", [sector.raw()])?;
        for record in &self.records {
            tx.execute(
                "INSERT INTO traders (sector_index, name, ship_type, ship_name, fighters) VALUES (?1, ?2, ?3, ?4, ?5)",
                (sector.raw(), &record.name, &record.ship_type, &record.ship_name, record.fighters),
            )?;
        }
        tx.commit()?;
        Ok(true)
    }
}

impl PlanetsTracker {
    /// Marks every already-pushed record owned by `owner` as having a
    /// citadel (§B: triggered by the "Citadel treasury contains" prompt,
    /// which arrives after the planet list for the sector has already been
    /// seen this screen).
    pub(crate) fn mark_citadel(&mut self, owner: &str) {
        for record in self.records.iter_mut() {
            if record.owner == owner {
                record.citadel = true;
            }
        }
    }

    pub fn execute(&self, conn: &mut Connection) -> Result<bool, StoreError> {
        if !self.touched {
            return Ok(false);
        }
        let sector = self.sector_index.expect("tracker constructed with a sector");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM planets WHERE sector_index = ?1", [sector.raw()])?;
        for record in &self.records {
            tx.execute(
                "INSERT INTO planets (sector_index, name, owner, fighters, citadel, stardock) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (sector.raw(), &record.name, &record.owner, record.fighters, record.citadel, record.stardock),
            )?;
        }
        tx.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn replaces_ship_list_atomically() {
        let mut store = Store::open_in_memory().unwrap();
        let sector = SectorIndex(7);

        let mut tracker = ShipsTracker::new(sector);
        tracker.push_ship(ShipRecord {
            name: "Enterprise".into(),
            owner: "yours".into(),
            ship_type: "MerCru".into(),
            fighters: 100,
        });
        tracker.execute(&mut store.conn).unwrap();

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM ships WHERE sector_index = 7", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        // Next screen only shows a different ship; the old one must vanish.
        let mut tracker2 = ShipsTracker::new(sector);
        tracker2.push_ship(ShipRecord {
            name: "Defiant".into(),
            owner: "belong to your Corp".into(),
            ship_type: "ScoutShip".into(),
            fighters: 0,
        });
        tracker2.execute(&mut store.conn).unwrap();

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM ships WHERE sector_index = 7", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let name: String = store
            .conn
            .query_row("SELECT name FROM ships WHERE sector_index = 7", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Defiant");
    }

    #[test]
    fn untouched_tracker_is_noop() {
        let mut store = Store::open_in_memory().unwrap();
        let tracker = TradersTracker::new(SectorIndex(1));
        assert!(!tracker.execute(&mut store.conn).unwrap());
    }
}
