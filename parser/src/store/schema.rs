//! Embeds the logical schema (§6) into the binary, the same way the
//! teacher's `rust-embed` dependency ships static resources alongside the
//! compiled crate instead of requiring a file to be shipped separately.

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "sql/"]
struct Sql;

/// The DDL applied by `Store::open`/`Store::open_in_memory`.
pub fn schema_sql() -> String {
    let file = Sql::get("schema.sql").expect("schema.sql must be embedded");
    String::from_utf8(file.data.into_owned()).expect("schema.sql must be utf-8")
}
