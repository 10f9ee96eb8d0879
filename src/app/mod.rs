// HttpSleuth - app/mod.rs
//
// Application layer: orchestration of one run.
// Dependencies: core and platform layers.

pub mod scan;
