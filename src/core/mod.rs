//! Core - pure helpers shared by both managers (compiles everywhere)
//!
//! - `networks`: chain id → label / explorer tables
//! - `format`: address and hash abbreviation for status lines
//! - `observed`: single-threaded state cell with snapshot-on-change watchers

pub mod format;
pub mod networks;
pub mod observed;
