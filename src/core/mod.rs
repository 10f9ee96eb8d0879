// HttpSleuth - core/mod.rs
//
// Core business logic layer: segmentation, extraction, correlation,
// filtering and rendering of HTTP transactions.
// Must NOT depend on: platform or app. Writes only to caller-supplied
// Write implementations.

pub mod correlate;
pub mod extract;
pub mod filter;
pub mod grammar;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod segment;
