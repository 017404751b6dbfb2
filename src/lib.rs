//! Load, filter and aggregate a data-science salary table.
//!
//! The UI-free core of the dashboard: everything here is plain data in,
//! plain data out, so any front end can drive it.

pub mod analysis;
pub mod config;
pub mod data;
pub mod export;
pub mod report;
