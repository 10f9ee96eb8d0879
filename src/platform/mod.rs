// HttpSleuth - platform/mod.rs
//
// Platform abstraction layer: files on disk and config locations.
// Dependencies: standard library, directories, toml, serde.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
