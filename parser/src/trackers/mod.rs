//! Discovered-Field Trackers (C6, §4.5).
//!
//! Each tracker accumulates a *sparse* set of (column, value) pairs as the
//! grammar sub-parsers discover fields on the current screen, then is
//! consumed once — `execute()` issues the SQL and the tracker is dropped.
//! A tracker nothing was ever written to performs no SQL and fires no
//! event (§8: "A tracker with no setters called produces no SQL and no UI
//! event").

mod collections;
mod player_stats;
mod port;
mod sector;

pub use collections::{PlanetRecord, PlanetsTracker, ShipRecord, ShipsTracker, TraderRecord, TradersTracker};
pub use player_stats::PlayerStatsTracker;
pub use port::PortTracker;
pub use sector::SectorTracker;

use rusqlite::ToSql;

/// A dynamically-built, sparse set of `column = value` assignments shared
/// by the scalar-row trackers (player stats, sector, port). Keeps the
/// "only discovered columns participate in the UPDATE" rule (§4.5) in one
/// place instead of re-implementing it per tracker.
#[derive(Default)]
pub(crate) struct ColumnSet {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl ColumnSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: T) {
        if let Some(pos) = self.columns.iter().position(|c| *c == column) {
            self.values[pos] = Box::new(value);
        } else {
            self.columns.push(column);
            self.values.push(Box::new(value));
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Builds `UPDATE <table> SET col1 = ?1, col2 = ?2 WHERE <where_clause>`
    /// and returns the SQL alongside the bound parameters, in column order
    /// followed by the caller-supplied trailing parameters for the WHERE
    /// clause.
    pub(crate) fn update_sql(&self, table: &str, where_clause: &str) -> String {
        let assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ?{}", i + 1))
            .collect();
        format!("UPDATE {table} SET {} WHERE {where_clause}", assignments.join(", "))
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|v| v.as_ref()).collect()
    }
}
