mod db;
mod queries;
mod schema;

pub use db::Store;
pub use queries::{PlayerStatsRow, PortRow, SectorRow, TraderRow};
