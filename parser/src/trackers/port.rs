//! `PortTracker` (§4.5): one port row, keyed by `sector_index`. Per-product
//! fluent setters for the three commodity slots (§3 Port entity).

use rusqlite::Connection;

use crate::error::StoreError;
use crate::types::{Commodity, PortClass, SectorIndex};

use super::ColumnSet;

pub struct PortTracker {
    sector_index: SectorIndex,
    columns: ColumnSet,
}

impl PortTracker {
    pub fn new(sector_index: SectorIndex) -> Self {
        Self {
            sector_index,
            columns: ColumnSet::new(),
        }
    }

    pub fn sector_index(&self) -> SectorIndex {
        self.sector_index
    }

    pub fn set_name(&mut self, value: impl Into<String>) -> &mut Self {
        self.columns.set("name", value.into());
        self
    }

    pub fn set_class(&mut self, class: PortClass) -> &mut Self {
        self.columns.set("class_index", class.0 as i64);
        self
    }

    pub fn set_dead(&mut self, dead: bool) -> &mut Self {
        self.columns.set("dead", dead);
        self
    }

    pub fn set_build_time(&mut self, value: i64) -> &mut Self {
        self.columns.set("build_time", value);
        self
    }

    fn amount_column(commodity: Commodity) -> &'static str {
        match commodity {
            Commodity::Ore => "ore_amount",
            Commodity::Organics => "org_amount",
            Commodity::Equipment => "equip_amount",
        }
    }

    fn percent_column(commodity: Commodity) -> &'static str {
        match commodity {
            Commodity::Ore => "ore_percent",
            Commodity::Organics => "org_percent",
            Commodity::Equipment => "equip_percent",
        }
    }

    fn buying_column(commodity: Commodity) -> &'static str {
        match commodity {
            Commodity::Ore => "buy_ore",
            Commodity::Organics => "buy_org",
            Commodity::Equipment => "buy_equip",
        }
    }

    pub fn set_amount(&mut self, commodity: Commodity, amount: u32) -> &mut Self {
        self.columns.set(Self::amount_column(commodity), amount as i64);
        self
    }

    pub fn set_percent(&mut self, commodity: Commodity, percent: u8) -> &mut Self {
        self.columns.set(Self::percent_column(commodity), percent as i64);
        self
    }

    pub fn set_buying(&mut self, commodity: Commodity, buying: bool) -> &mut Self {
        self.columns.set(Self::buying_column(commodity), buying);
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
            "INSERT OR IGNORE INTO ports (sector_index) VALUES (?1)",
            [self.sector_index.raw()],
        )?;
        let where_clause = format!("sector_index = {}", self.sector_index.raw());
        let sql = self.columns.update_sql("ports", &where_clause);
        conn.execute(&sql, rusqlite::params_from_iter(self.columns.params()))?;
        conn.execute(
            &format!(
                "UPDATE ports SET update_time = datetime('now') WHERE sector_index = {}",
                self.sector_index.raw()
            ),
            [],
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::types::derive_port_class;

    #[test]
    fn three_product_slots_and_derived_class() {
        let store = Store::open_in_memory().unwrap();
        let mut tracker = PortTracker::new(SectorIndex(42));
        tracker
            .set_name("Crius Mining Outpost")
            .set_buying(Commodity::Ore, true)
            .set_buying(Commodity::Organics, true)
            .set_buying(Commodity::Equipment, false)
            .set_amount(Commodity::Ore, 1000)
            .set_percent(Commodity::Ore, 50)
            .set_class(derive_port_class(true, true, false));
        tracker.execute(&store.conn).unwrap();

        let row = store.load_port(SectorIndex(42)).unwrap().unwrap();
        assert_eq!(row.name.as_deref(), Some("Crius Mining Outpost"));
        assert_eq!(row.class_index, Some(1));
        assert_eq!(row.ore_amount, Some(1000));
        assert_eq!(row.ore_percent, Some(50));
        assert_eq!(row.buy_equip, Some(false));
    }
}
